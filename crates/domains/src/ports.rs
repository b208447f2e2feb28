//! # Core Traits (Ports)
//!
//! Any entity store must implement these traits to be used by the services.
//!
//! Counters and reference lists are never written through a
//! read-modify-write pair owned by a caller: every mutation that concurrent
//! requests can race on is a single atomic store operation (`apply_vote`,
//! `adjust_reputation`, `increment_views`, `push_*`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{
    Comment, CommentId, Community, CommunityId, LinkFlair, LinkFlairId, Post, PostId, User,
    UserId, VoteDirection,
};

/// Persistence contract for user accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_display_name(&self, display_name: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn insert(&self, user: &User) -> Result<()>;

    /// Atomically adds `delta` to the user's reputation.
    /// Returns the post-update user, or `None` if the user does not exist.
    async fn adjust_reputation(&self, id: UserId, delta: i64) -> Result<Option<User>>;
}

/// Persistence contract for communities.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    async fn find_by_id(&self, id: CommunityId) -> Result<Option<Community>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Community>>;
    async fn list(&self) -> Result<Vec<Community>>;
    async fn insert(&self, community: &Community) -> Result<()>;

    /// Atomically appends a post reference. Returns `false` if the community is absent.
    async fn push_post(&self, id: CommunityId, post_id: PostId) -> Result<bool>;
}

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>>;

    /// Posts in the order of `ids`; unknown identifiers are skipped.
    async fn find_by_ids(&self, ids: &[PostId]) -> Result<Vec<Post>>;
    async fn list(&self) -> Result<Vec<Post>>;
    async fn insert(&self, post: &Post) -> Result<()>;

    /// Posts whose title or content case-insensitively contains any of `terms`.
    async fn search_text(&self, terms: &[String]) -> Result<Vec<Post>>;

    /// The post whose top-level `commentIDs` contains `comment_id`.
    async fn find_by_root_comment(&self, comment_id: CommentId) -> Result<Option<Post>>;

    /// Posts tagged with any of the given flairs.
    async fn find_by_flairs(&self, flair_ids: &[LinkFlairId]) -> Result<Vec<Post>>;

    /// Atomically increments `upvotes` or `downvotes` and shifts `voteCount`.
    /// Returns the post-update entity, or `None` if the post does not exist.
    async fn apply_vote(&self, id: PostId, direction: VoteDirection) -> Result<Option<Post>>;

    async fn increment_views(&self, id: PostId) -> Result<Option<Post>>;

    /// Atomically appends a root-level comment reference.
    async fn push_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool>;

    /// Atomically removes every occurrence of a root-level comment reference.
    async fn remove_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool>;
}

/// Persistence contract for comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Comments in the order of `ids`; unknown identifiers are skipped.
    async fn find_by_ids(&self, ids: &[CommentId]) -> Result<Vec<Comment>>;
    async fn list(&self) -> Result<Vec<Comment>>;
    async fn insert(&self, comment: &Comment) -> Result<()>;

    /// Comments whose content case-insensitively contains `needle`.
    async fn search_content(&self, needle: &str) -> Result<Vec<Comment>>;

    /// The comment whose `commentIDs` contains `child`.
    async fn find_parent(&self, child: CommentId) -> Result<Option<Comment>>;

    /// Atomically increments `upvotes` or `downvotes` and shifts `voteCount`.
    async fn apply_vote(&self, id: CommentId, direction: VoteDirection) -> Result<Option<Comment>>;

    /// Atomically appends a reply reference.
    async fn push_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool>;

    /// Atomically removes every occurrence of a reply reference.
    async fn remove_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool>;

    /// Returns `false` if the comment did not exist.
    async fn delete(&self, id: CommentId) -> Result<bool>;
}

/// Persistence contract for link flairs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LinkFlairRepository: Send + Sync {
    async fn find_by_id(&self, id: LinkFlairId) -> Result<Option<LinkFlair>>;
    async fn list(&self) -> Result<Vec<LinkFlair>>;
    async fn insert(&self, flair: &LinkFlair) -> Result<()>;

    /// Flairs whose content case-insensitively contains `needle`.
    async fn search_content(&self, needle: &str) -> Result<Vec<LinkFlair>>;
}

/// One handle per port, as wired by a concrete store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub communities: Arc<dyn CommunityRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub flairs: Arc<dyn LinkFlairRepository>,
}
