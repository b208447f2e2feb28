use std::sync::Arc;

use domains::{DomainError, VoteDirection, VoteTarget};
use integration_tests::Forum;
use services::{NewComment, VotedEntity};

#[tokio::test]
async fn concurrent_votes_are_all_counted() {
    const UP: usize = 40;
    const DOWN: usize = 15;

    let forum = Arc::new(Forum::new());
    let author = forum.user("author", 100).await;
    let voter = forum.user("voter", 100).await;
    let post = forum.post("contested", "vote on me", &author).await;

    let (post_id, voter_id) = (post.id, voter.id);
    let mut handles = Vec::new();
    for i in 0..UP + DOWN {
        let forum = Arc::clone(&forum);
        let direction = if i < UP { VoteDirection::Up } else { VoteDirection::Down };
        handles.push(tokio::spawn(async move {
            forum
                .votes
                .apply_vote(VoteTarget::Post(post_id), direction, voter_id)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let post = forum.posts.get_post(post_id).await.unwrap();
    assert_eq!(post.votes.upvotes, UP as i64);
    assert_eq!(post.votes.downvotes, DOWN as i64);
    assert_eq!(post.votes.vote_count, UP as i64 - DOWN as i64);
    assert_eq!(
        forum.reputation_of(&author).await,
        100 + 5 * UP as i64 - 10 * DOWN as i64
    );
}

#[tokio::test]
async fn low_reputation_voter_changes_nothing() {
    let forum = Forum::new();
    let author = forum.user("author", 100).await;
    let voter = forum.user("newcomer", 40).await;
    let post = forum.post("untouched", "still zero", &author).await;

    let before = forum.posts.get_post(post.id).await.unwrap();
    let err = forum
        .votes
        .apply_vote(VoteTarget::Post(post.id), VoteDirection::Up, voter.id)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(forum.posts.get_post(post.id).await.unwrap(), before);
    assert_eq!(forum.reputation_of(&author).await, 100);
    assert_eq!(forum.reputation_of(&voter).await, 40);
}

#[tokio::test]
async fn comment_votes_move_author_reputation() {
    let forum = Forum::new();
    let author = forum.user("author", 100).await;
    let voter = forum.user("voter", 60).await;
    let post = forum.post("thread", "talk", &author).await;
    let comment = forum
        .comments
        .create_comment(NewComment {
            parent: domains::CommentParent::Post(post.id),
            content: "upvote me".into(),
            commented_by: author.id,
        })
        .await
        .unwrap();
    let target = VoteTarget::Comment(comment.id);

    let voted = forum
        .votes
        .apply_vote(target, VoteDirection::Up, voter.id)
        .await
        .unwrap();
    let VotedEntity::Comment(voted) = voted else {
        panic!("expected a comment");
    };
    assert_eq!(voted.votes.upvotes, 1);
    assert_eq!(forum.reputation_of(&author).await, 105);

    forum
        .votes
        .apply_vote(target, VoteDirection::Down, voter.id)
        .await
        .unwrap();
    assert_eq!(forum.reputation_of(&author).await, 95);
    assert_eq!(forum.reputation_of(&voter).await, 60);
}

#[tokio::test]
async fn voting_at_threshold_is_allowed() {
    let forum = Forum::new();
    let author = forum.user("author", 100).await;
    let voter = forum.user("borderline", 50).await;
    let post = forum.post("edge", "exactly fifty", &author).await;

    forum
        .votes
        .apply_vote(VoteTarget::Post(post.id), VoteDirection::Up, voter.id)
        .await
        .unwrap();
    assert_eq!(forum.posts.get_post(post.id).await.unwrap().votes.vote_count, 1);
}

#[tokio::test]
async fn self_vote_is_counted_like_any_other() {
    let forum = Forum::new();
    let author = forum.user("author", 100).await;
    let post = forum.post("mine", "my own post", &author).await;

    forum
        .votes
        .apply_vote(VoteTarget::Post(post.id), VoteDirection::Up, author.id)
        .await
        .unwrap();
    assert_eq!(forum.reputation_of(&author).await, 105);
}
