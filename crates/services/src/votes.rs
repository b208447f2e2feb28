//! # Vote & Reputation Engine
//!
//! Applies a vote to a post or comment on behalf of a voter, gated by the
//! voter's reputation, then moves the target author's reputation.
//!
//! The counter increment and the reputation delta are two independent atomic
//! store operations. If the second one fails the vote stays recorded.

use std::sync::Arc;

use domains::{
    Comment, CommentId, CommentRepository, DomainError, Post, PostId, PostRepository, Result,
    UserId, UserRepository, VoteDirection, VoteTarget,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Thresholds and deltas of the reputation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationPolicy {
    /// Minimum reputation a voter must hold.
    pub vote_threshold: i64,
    /// Added to the author's reputation per upvote received.
    pub upvote_reward: i64,
    /// Subtracted from the author's reputation per downvote received.
    pub downvote_penalty: i64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            vote_threshold: 50,
            upvote_reward: 5,
            downvote_penalty: 10,
        }
    }
}

impl ReputationPolicy {
    pub fn author_delta(&self, direction: VoteDirection) -> i64 {
        match direction {
            VoteDirection::Up => self.upvote_reward,
            VoteDirection::Down => -self.downvote_penalty,
        }
    }
}

/// Entity a vote was applied to, in its post-increment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VotedEntity {
    Post(Post),
    Comment(Comment),
}

impl VotedEntity {
    pub fn author(&self) -> UserId {
        match self {
            Self::Post(post) => post.posted_by,
            Self::Comment(comment) => comment.commented_by,
        }
    }
}

pub struct VoteService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    policy: ReputationPolicy,
}

impl VoteService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        policy: ReputationPolicy,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            policy,
        }
    }

    /// Casts one vote. Repeat votes by the same voter are each counted.
    ///
    /// Fails with `Forbidden` (unknown voter or reputation below the
    /// threshold) before touching the target, or `NotFound` if the target is
    /// absent.
    #[instrument(skip(self))]
    pub async fn apply_vote(
        &self,
        target: VoteTarget,
        direction: VoteDirection,
        voter_id: UserId,
    ) -> Result<VotedEntity> {
        // 1. Reputation gate on the voter
        let voter = self
            .users
            .find_by_id(voter_id)
            .await?
            .ok_or_else(|| DomainError::Forbidden(format!("unknown voter {voter_id}")))?;

        if voter.reputation < self.policy.vote_threshold {
            info!(reputation = voter.reputation, "vote rejected by reputation gate");
            return Err(DomainError::Forbidden(format!(
                "reputation {} is below the voting threshold of {}",
                voter.reputation, self.policy.vote_threshold
            )));
        }

        // 2. Atomic counter increment; absence surfaces as NotFound
        let updated = match target {
            VoteTarget::Post(id) => {
                self.posts
                    .apply_vote(id, direction)
                    .await?
                    .map(VotedEntity::Post)
                    .ok_or_else(|| DomainError::not_found(PostId::ENTITY, id))?
            }
            VoteTarget::Comment(id) => {
                self.comments
                    .apply_vote(id, direction)
                    .await?
                    .map(VotedEntity::Comment)
                    .ok_or_else(|| DomainError::not_found(CommentId::ENTITY, id))?
            }
        };

        // 3. Best-effort reputation side effect on the author
        let author = updated.author();
        let delta = self.policy.author_delta(direction);
        match self.users.adjust_reputation(author, delta).await {
            Ok(Some(user)) => info!(%author, reputation = user.reputation, "author reputation adjusted"),
            Ok(None) => warn!(%author, "vote recorded but author no longer exists"),
            Err(err) => warn!(%author, error = %err, "vote recorded but reputation update failed"),
        }

        Ok(updated)
    }
}
