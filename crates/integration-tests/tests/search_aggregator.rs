use std::collections::HashSet;

use domains::{Comment, CommentParent, DomainError, LinkFlair, PostId};
use integration_tests::Forum;
use services::{NewComment, NewPost};

fn ids(posts: &[domains::Post]) -> HashSet<PostId> {
    posts.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn terms_match_posts_but_comments_need_the_whole_query() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;

    let by_term = forum.post("foo things", "plain body", &author).await;
    let by_phrase = forum.post("nothing here", "plain body", &author).await;
    let partial = forum.post("other", "plain body", &author).await;

    forum
        .comments
        .create_comment(NewComment {
            parent: CommentParent::Post(by_phrase.id),
            content: "it contains FOO BAR somewhere".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();
    forum
        .comments
        .create_comment(NewComment {
            parent: CommentParent::Post(partial.id),
            content: "just foo alone".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();

    let results = forum.search.search("foo bar").await.unwrap();
    let found = ids(&results);
    assert_eq!(results.len(), found.len());
    assert!(found.contains(&by_term.id));
    assert!(found.contains(&by_phrase.id));
    assert!(!found.contains(&partial.id));
}

#[tokio::test]
async fn nested_comment_resolves_to_its_root_post() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let post = forum.post("deep", "thread", &author).await;

    let mut parent = CommentParent::Post(post.id);
    for depth in 0..4 {
        let comment = forum
            .comments
            .create_comment(NewComment {
                parent,
                content: format!("level {depth}"),
                commented_by: author.id,
            })
            .await
            .unwrap();
        parent = CommentParent::Comment(comment.id);
    }
    let CommentParent::Comment(deepest) = parent else {
        unreachable!()
    };

    forum
        .comments
        .create_comment(NewComment {
            parent: CommentParent::Comment(deepest),
            content: "needle in a haystack".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();

    let results = forum.search.search("needle").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, post.id);
}

#[tokio::test]
async fn flair_match_alone_finds_tagged_posts() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let community = forum.community("announcements", &author).await;
    let flair = LinkFlair::new("Literal Saint");
    forum.repos.flairs.insert(&flair).await.unwrap();

    let tagged = forum
        .posts
        .create_post(NewPost {
            community_id: community.id,
            title: "zzz".into(),
            content: "yyy".into(),
            link_flair_id: Some(flair.id),
            posted_by: author.id,
        })
        .await
        .unwrap();
    forum.post("untagged", "yyy", &author).await;

    let results = forum.search.search("literal saint").await.unwrap();
    let found: Vec<_> = results.iter().map(|p| p.id).collect();
    assert_eq!(found, vec![tagged.id]);
}

#[tokio::test]
async fn routes_are_merged_direct_then_comment_then_flair() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let community = forum.community("announcements", &author).await;
    let flair = LinkFlair::new("Literal Saint");
    forum.repos.flairs.insert(&flair).await.unwrap();

    // Created first so that id order alone would put it ahead of the others.
    let flair_only = forum
        .posts
        .create_post(NewPost {
            community_id: community.id,
            title: "zzz".into(),
            content: "yyy".into(),
            link_flair_id: Some(flair.id),
            posted_by: author.id,
        })
        .await
        .unwrap();
    let comment_only = forum.post("xxx", "www", &author).await;
    forum
        .comments
        .create_comment(NewComment {
            parent: CommentParent::Post(comment_only.id),
            content: "a literal saint, honestly".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();
    let direct = forum.post("a saint walks in", "vvv", &author).await;

    let results = forum.search.search("literal saint").await.unwrap();
    let order: Vec<_> = results.iter().map(|p| p.id).collect();
    assert_eq!(order, vec![direct.id, comment_only.id, flair_only.id]);
}

#[tokio::test]
async fn post_matched_by_every_route_appears_once() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let community = forum.community("announcements", &author).await;
    let flair = LinkFlair::new("Literal Saint");
    forum.repos.flairs.insert(&flair).await.unwrap();

    let post = forum
        .posts
        .create_post(NewPost {
            community_id: community.id,
            title: "literal saint".into(),
            content: "yyy".into(),
            link_flair_id: Some(flair.id),
            posted_by: author.id,
        })
        .await
        .unwrap();
    forum
        .comments
        .create_comment(NewComment {
            parent: CommentParent::Post(post.id),
            content: "literal saint indeed".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();

    let results = forum.search.search("literal saint").await.unwrap();
    assert_eq!(ids(&results), HashSet::from([post.id]));
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn orphaned_comment_is_ignored() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let orphan = Comment::new("unattached zebra", author.id);
    forum.repos.comments.insert(&orphan).await.unwrap();

    assert!(forum.search.search("zebra").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let forum = Forum::new();
    for query in ["", "   ", "\t\n"] {
        assert!(matches!(
            forum.search.search(query).await,
            Err(DomainError::BadRequest(_))
        ));
    }
}
