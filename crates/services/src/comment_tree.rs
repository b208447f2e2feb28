//! # Comment Tree Engine
//!
//! Materializes the reply forest hanging off a post (or a comment) and counts it.
//!
//! The stored forest is acyclic by construction, but deletes are not atomic
//! across a subtree, so the walk tolerates dangling references and guards
//! against revisits with a visited set instead of trusting the data.

use std::collections::HashSet;
use std::sync::Arc;

use domains::{Comment, CommentId, CommentRepository, DomainError, PostId, PostRepository, Result};
use serde::Serialize;
use tracing::{debug, instrument};

/// Flat view of every comment reachable from a post, plus the thread size.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTree {
    pub post_id: PostId,
    pub comments: Vec<Comment>,
    pub total: usize,
}

pub struct CommentTreeService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentTreeService {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { posts, comments }
    }

    /// Every comment transitively reachable from `roots`, each at most once.
    ///
    /// Siblings come back in stored order and each batch of replies directly
    /// follows the batch containing its parent. Unknown identifiers are skipped.
    pub async fn collect_subtree(&self, roots: &[CommentId]) -> Result<Vec<Comment>> {
        let mut visited: HashSet<CommentId> = HashSet::new();
        let mut collected: Vec<Comment> = Vec::new();
        let mut pending: Vec<Vec<CommentId>> = vec![roots.to_vec()];

        while let Some(batch) = pending.pop() {
            let fresh: Vec<CommentId> = batch.into_iter().filter(|id| visited.insert(*id)).collect();
            if fresh.is_empty() {
                continue;
            }

            let found = self.comments.find_by_ids(&fresh).await?;
            if found.len() < fresh.len() {
                debug!(
                    missing = fresh.len() - found.len(),
                    "skipping dangling comment references"
                );
            }

            let start = collected.len();
            collected.extend(found);

            // Reversed so the first sibling's replies are expanded first.
            for comment in collected[start..].iter().rev() {
                if !comment.comment_ids.is_empty() {
                    pending.push(comment.comment_ids.clone());
                }
            }
        }

        Ok(collected)
    }

    /// Size of the subtree, computed by walking it.
    pub async fn count_subtree(&self, roots: &[CommentId]) -> Result<usize> {
        Ok(self.collect_subtree(roots).await?.len())
    }

    /// All comments of a post with the thread size.
    #[instrument(skip(self))]
    pub async fn comment_tree(&self, post_id: PostId) -> Result<CommentTree> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found(PostId::ENTITY, post_id))?;

        let comments = self.collect_subtree(&post.comment_ids).await?;
        Ok(CommentTree {
            post_id,
            total: comments.len(),
            comments,
        })
    }

    /// Number of transitive replies below a comment.
    pub async fn reply_count(&self, comment_id: CommentId) -> Result<usize> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found(CommentId::ENTITY, comment_id))?;
        self.count_subtree(&comment.comment_ids).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use domains::{MockCommentRepository, MockPostRepository, Post, UserId};

    use super::*;

    fn comments_backed_by(fixture: Vec<Comment>) -> MockCommentRepository {
        let by_id: HashMap<CommentId, Comment> =
            fixture.into_iter().map(|c| (c.id, c)).collect();
        let lookup = by_id.clone();
        let mut repo = MockCommentRepository::new();
        repo.expect_find_by_ids()
            .returning(move |ids| Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect()));
        repo.expect_find_by_id()
            .returning(move |id| Ok(lookup.get(&id).cloned()));
        repo
    }

    fn service(comments: MockCommentRepository, posts: MockPostRepository) -> CommentTreeService {
        CommentTreeService::new(Arc::new(posts), Arc::new(comments))
    }

    fn reply(parent: &mut Comment, content: &str) -> Comment {
        let child = Comment::new(content, UserId::new());
        parent.comment_ids.push(child.id);
        child
    }

    #[tokio::test]
    async fn empty_roots_yield_nothing() {
        let svc = service(comments_backed_by(vec![]), MockPostRepository::new());
        assert!(svc.collect_subtree(&[]).await.unwrap().is_empty());
        assert_eq!(svc.count_subtree(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counts_nested_chain() {
        let mut c1 = Comment::new("c1", UserId::new());
        let mut c2 = reply(&mut c1, "c2");
        let c3 = reply(&mut c2, "c3");
        let root = c1.id;

        let svc = service(comments_backed_by(vec![c1, c2, c3]), MockPostRepository::new());
        assert_eq!(svc.count_subtree(&[root]).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn dangling_reference_is_skipped() {
        let mut c1 = Comment::new("c1", UserId::new());
        let mut c2 = reply(&mut c1, "c2");
        let _c3 = reply(&mut c2, "c3");
        let root = c1.id;

        // c2 deleted without detaching it from c1; c3 becomes unreachable.
        let svc = service(comments_backed_by(vec![c1]), MockPostRepository::new());
        let found = svc.collect_subtree(&[root]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, root);
    }

    #[tokio::test]
    async fn cycle_terminates_and_visits_once() {
        let mut a = Comment::new("a", UserId::new());
        let mut b = reply(&mut a, "b");
        b.comment_ids.push(a.id);
        a.comment_ids.push(a.id);
        let root = a.id;

        let svc = service(comments_backed_by(vec![a, b]), MockPostRepository::new());
        let found = svc.collect_subtree(&[root, root]).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn replies_follow_their_parents_batch() {
        let mut a = Comment::new("a", UserId::new());
        let mut b = Comment::new("b", UserId::new());
        let a1 = reply(&mut a, "a1");
        let b1 = reply(&mut b, "b1");
        let roots = vec![a.id, b.id];

        let svc = service(comments_backed_by(vec![b1, a, a1, b]), MockPostRepository::new());
        let order: Vec<String> = svc
            .collect_subtree(&roots)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(order, vec!["a", "b", "a1", "b1"]);
    }

    #[tokio::test]
    async fn tree_of_missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|_| Ok(None));
        let svc = service(comments_backed_by(vec![]), posts);

        let err = svc.comment_tree(PostId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Post", .. }));
    }

    #[tokio::test]
    async fn tree_reports_total() {
        let author = UserId::new();
        let mut c1 = Comment::new("c1", author);
        let c2 = reply(&mut c1, "c2");
        let mut post = Post::new("title", "body", author);
        post.comment_ids.push(c1.id);
        let post_id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));

        let svc = service(comments_backed_by(vec![c1.clone(), c2]), posts);
        let tree = svc.comment_tree(post_id).await.unwrap();
        assert_eq!(tree.total, 2);
        assert_eq!(svc.reply_count(c1.id).await.unwrap(), 1);
    }
}
