//! # Search Aggregator
//!
//! Gathers posts matching a free-text query through three routes and
//! de-duplicates them:
//!
//! 1. Direct: title or content contains any whitespace-separated term.
//! 2. Comment origin: a comment's content contains the whole, unsplit query;
//!    the post at the root of its parent chain matches.
//! 3. Flair origin: a flair's content contains the whole query; every post
//!    tagged with it matches.
//!
//! The per-term versus whole-query asymmetry is observable behavior and is kept.
//! Each route degrades on its own: a failing route is logged and contributes
//! nothing, the others still return their matches.

use std::collections::HashSet;
use std::sync::Arc;

use domains::{
    CommentId, CommentRepository, DomainError, LinkFlairRepository, Post, PostId, PostRepository,
    Result,
};
use tracing::{debug, instrument, warn};

pub struct SearchService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    flairs: Arc<dyn LinkFlairRepository>,
}

/// Whitespace-separated terms of a query, empty terms dropped.
pub fn search_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_owned).collect()
}

impl SearchService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        flairs: Arc<dyn LinkFlairRepository>,
    ) -> Self {
        Self {
            posts,
            comments,
            flairs,
        }
    }

    /// Direct matches first, then comment-origin, then flair-origin posts,
    /// keeping the first instance of each post.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Post>> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Err(DomainError::BadRequest("search query is required".into()));
        }

        let mut gathered = Vec::new();

        match self.posts.search_text(&terms).await {
            Ok(posts) => gathered.extend(posts),
            Err(err) => warn!(route = "direct", error = %err, "search route failed"),
        }

        match self.posts_from_comments(query).await {
            Ok(posts) => gathered.extend(posts),
            Err(err) => warn!(route = "comments", error = %err, "search route failed"),
        }

        match self.posts_from_flairs(query).await {
            Ok(posts) => gathered.extend(posts),
            Err(err) => warn!(route = "flairs", error = %err, "search route failed"),
        }

        Ok(unique_posts(gathered))
    }

    async fn posts_from_comments(&self, query: &str) -> Result<Vec<Post>> {
        let matches = self.comments.search_content(query).await?;
        let mut posts = Vec::with_capacity(matches.len());
        for comment in matches {
            match self.origin_post(comment.id).await? {
                Some(post) => posts.push(post),
                None => debug!(comment = %comment.id, "matching comment has no origin post"),
            }
        }
        Ok(posts)
    }

    async fn posts_from_flairs(&self, query: &str) -> Result<Vec<Post>> {
        let flairs = self.flairs.search_content(query).await?;
        if flairs.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<_> = flairs.into_iter().map(|f| f.id).collect();
        self.posts.find_by_flairs(&ids).await
    }

    /// Walks up the parent chain of a comment to the post holding the
    /// top-most comment. Orphaned chains and cycles yield `None`.
    pub async fn origin_post(&self, comment_id: CommentId) -> Result<Option<Post>> {
        let mut top = comment_id;
        let mut seen = HashSet::from([comment_id]);

        while let Some(parent) = self.comments.find_parent(top).await? {
            if !seen.insert(parent.id) {
                warn!(comment = %comment_id, "cycle in comment parent chain");
                return Ok(None);
            }
            top = parent.id;
        }

        self.posts.find_by_root_comment(top).await
    }
}

fn unique_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut seen: HashSet<PostId> = HashSet::with_capacity(posts.len());
    posts.into_iter().filter(|p| seen.insert(p.id)).collect()
}

#[cfg(test)]
mod tests {
    use domains::{
        Comment, LinkFlair, MockCommentRepository, MockLinkFlairRepository, MockPostRepository,
        UserId,
    };
    use mockall::predicate::eq;

    use super::*;

    fn post(title: &str) -> Post {
        Post::new(title, "body", UserId::new())
    }

    fn service(
        posts: MockPostRepository,
        comments: MockCommentRepository,
        flairs: MockLinkFlairRepository,
    ) -> SearchService {
        SearchService::new(Arc::new(posts), Arc::new(comments), Arc::new(flairs))
    }

    #[test]
    fn terms_split_on_any_whitespace() {
        assert_eq!(search_terms("  foo\tbar  "), vec!["foo", "bar"]);
        assert!(search_terms("   ").is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_lookup() {
        let mut posts = MockPostRepository::new();
        posts.expect_search_text().never();
        let mut comments = MockCommentRepository::new();
        comments.expect_search_content().never();
        let mut flairs = MockLinkFlairRepository::new();
        flairs.expect_search_content().never();

        let svc = service(posts, comments, flairs);
        for query in ["", "   "] {
            let err = svc.search(query).await.unwrap_err();
            assert!(matches!(err, DomainError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn posts_use_terms_while_comments_and_flairs_use_whole_query() {
        let direct = post("foo");
        let mut posts = MockPostRepository::new();
        posts
            .expect_search_text()
            .withf(|terms| terms.len() == 2 && terms[0] == "foo" && terms[1] == "bar")
            .times(1)
            .returning(move |_| Ok(vec![direct.clone()]));
        let mut comments = MockCommentRepository::new();
        comments
            .expect_search_content()
            .withf(|needle| needle == "foo bar")
            .times(1)
            .returning(|_| Ok(vec![]));
        let mut flairs = MockLinkFlairRepository::new();
        flairs
            .expect_search_content()
            .withf(|needle| needle == "foo bar")
            .times(1)
            .returning(|_| Ok(vec![]));

        let found = service(posts, comments, flairs).search("foo bar").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn comment_match_resolves_to_origin_and_dedups() {
        let author = UserId::new();
        let mut root = Comment::new("root", author);
        let nested = Comment::new("a needle here", author);
        root.comment_ids.push(nested.id);
        let mut origin = post("origin");
        origin.comment_ids.push(root.id);
        let other = post("other");

        let mut posts = MockPostRepository::new();
        let direct = vec![origin.clone(), other.clone()];
        posts
            .expect_search_text()
            .returning(move |_| Ok(direct.clone()));
        let found_origin = origin.clone();
        posts
            .expect_find_by_root_comment()
            .with(eq(root.id))
            .returning(move |_| Ok(Some(found_origin.clone())));

        let mut comments = MockCommentRepository::new();
        let matching = nested.clone();
        comments
            .expect_search_content()
            .returning(move |_| Ok(vec![matching.clone()]));
        let parent = root.clone();
        comments
            .expect_find_parent()
            .with(eq(nested.id))
            .returning(move |_| Ok(Some(parent.clone())));
        comments
            .expect_find_parent()
            .with(eq(root.id))
            .returning(|_| Ok(None));

        let mut flairs = MockLinkFlairRepository::new();
        flairs.expect_search_content().returning(|_| Ok(vec![]));

        let found = service(posts, comments, flairs).search("needle").await.unwrap();
        let ids: Vec<PostId> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![origin.id, other.id]);
    }

    #[tokio::test]
    async fn orphaned_comment_contributes_nothing() {
        let orphan = Comment::new("needle", UserId::new());
        let mut posts = MockPostRepository::new();
        posts.expect_search_text().returning(|_| Ok(vec![]));
        posts.expect_find_by_root_comment().returning(|_| Ok(None));
        let mut comments = MockCommentRepository::new();
        comments
            .expect_search_content()
            .returning(move |_| Ok(vec![orphan.clone()]));
        comments.expect_find_parent().returning(|_| Ok(None));
        let mut flairs = MockLinkFlairRepository::new();
        flairs.expect_search_content().returning(|_| Ok(vec![]));

        let found = service(posts, comments, flairs).search("needle").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn failing_route_does_not_suppress_others() {
        let flair = LinkFlair::new("Rust");
        let tagged = post("tagged").with_flair(flair.id);

        let mut posts = MockPostRepository::new();
        posts
            .expect_search_text()
            .returning(|_| Err(DomainError::Internal("timeout".into())));
        let found_tagged = tagged.clone();
        posts
            .expect_find_by_flairs()
            .returning(move |_| Ok(vec![found_tagged.clone()]));
        let mut comments = MockCommentRepository::new();
        comments
            .expect_search_content()
            .returning(|_| Err(DomainError::Internal("timeout".into())));
        let mut flairs = MockLinkFlairRepository::new();
        flairs
            .expect_search_content()
            .returning(move |_| Ok(vec![flair.clone()]));

        let found = service(posts, comments, flairs).search("rust").await.unwrap();
        assert_eq!(found, vec![tagged]);
    }

    #[tokio::test]
    async fn parent_cycle_has_no_origin() {
        let a = Comment::new("a", UserId::new());
        let b = Comment::new("b", UserId::new());
        let (a_id, b_id) = (a.id, b.id);

        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_parent()
            .with(eq(a_id))
            .returning(move |_| Ok(Some(b.clone())));
        comments
            .expect_find_parent()
            .with(eq(b_id))
            .returning(move |_| Ok(Some(a.clone())));
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_root_comment().never();

        let svc = service(posts, comments, MockLinkFlairRepository::new());
        assert!(svc.origin_post(a_id).await.unwrap().is_none());
    }
}
