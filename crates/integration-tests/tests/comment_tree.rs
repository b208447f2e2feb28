use domains::{Comment, CommentParent, DomainError, PostId};
use integration_tests::Forum;
use services::NewComment;

fn reply(parent: CommentParent, author: &domains::User, content: &str) -> NewComment {
    NewComment {
        parent,
        content: content.into(),
        commented_by: author.id,
    }
}

#[tokio::test]
async fn post_without_comments_has_empty_tree() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let post = forum.post("quiet", "nobody replied", &author).await;

    let tree = forum.tree.comment_tree(post.id).await.unwrap();
    assert!(tree.comments.is_empty());
    assert_eq!(tree.total, 0);
}

#[tokio::test]
async fn nested_chain_counts_and_cascade_delete() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let post = forum.post("chain", "three deep", &author).await;

    let c1 = forum
        .comments
        .create_comment(reply(CommentParent::Post(post.id), &author, "C1"))
        .await
        .unwrap();
    let c2 = forum
        .comments
        .create_comment(reply(CommentParent::Comment(c1.id), &author, "C2"))
        .await
        .unwrap();
    let c3 = forum
        .comments
        .create_comment(reply(CommentParent::Comment(c2.id), &author, "C3"))
        .await
        .unwrap();

    let tree = forum.tree.comment_tree(post.id).await.unwrap();
    let ids: Vec<_> = tree.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![c1.id, c2.id, c3.id]);
    assert_eq!(tree.total, 3);

    assert_eq!(forum.comments.delete_comment(c2.id).await.unwrap(), 2);

    let tree = forum.tree.comment_tree(post.id).await.unwrap();
    assert_eq!(tree.total, 1);
    let c1 = forum.comments.get_comment(c1.id).await.unwrap();
    assert!(c1.comment_ids.is_empty());
    assert!(matches!(
        forum.comments.get_comment(c3.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn reply_count_excludes_the_comment_itself() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;
    let post = forum.post("fan out", "many replies", &author).await;

    let root = forum
        .comments
        .create_comment(reply(CommentParent::Post(post.id), &author, "root"))
        .await
        .unwrap();
    for n in 0..3 {
        let child = forum
            .comments
            .create_comment(reply(CommentParent::Comment(root.id), &author, &format!("child {n}")))
            .await
            .unwrap();
        forum
            .comments
            .create_comment(reply(CommentParent::Comment(child.id), &author, "grandchild"))
            .await
            .unwrap();
    }

    assert_eq!(forum.tree.reply_count(root.id).await.unwrap(), 6);
    assert_eq!(forum.tree.comment_tree(post.id).await.unwrap().total, 7);
}

#[tokio::test]
async fn cyclic_references_terminate() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;

    let mut a = Comment::new("a", author.id);
    let mut b = Comment::new("b", author.id);
    a.comment_ids.push(b.id);
    b.comment_ids.push(a.id);
    forum.repos.comments.insert(&a).await.unwrap();
    forum.repos.comments.insert(&b).await.unwrap();

    let subtree = forum.tree.collect_subtree(&[a.id]).await.unwrap();
    let ids: Vec<_> = subtree.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn dangling_reply_is_skipped() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;

    let mut root = Comment::new("root", author.id);
    root.comment_ids.push(domains::CommentId::new());
    forum.repos.comments.insert(&root).await.unwrap();

    assert_eq!(forum.tree.count_subtree(&[root.id]).await.unwrap(), 1);
}

#[tokio::test]
async fn comment_on_missing_post_is_rejected() {
    let forum = Forum::new();
    let author = forum.user("ada", 100).await;

    let err = forum
        .comments
        .create_comment(reply(CommentParent::Post(PostId::new()), &author, "hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    assert!(forum.comments.list_comments().await.unwrap().is_empty());
}
