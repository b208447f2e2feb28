//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! Comments form a forest rooted at posts: a `Post` holds its top-level
//! comment references and every `Comment` holds the references of its direct
//! replies. Field names serialize the way the web client expects them
//! (`commentIDs`, `postedBy`, `voteCount`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Minimum content length shared by comments and flairs.
pub const MIN_CONTENT_LEN: usize = 1;
pub const MAX_COMMENT_LEN: usize = 500;
pub const MAX_FLAIR_LEN: usize = 30;
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_COMMUNITY_NAME_LEN: usize = 100;
pub const MIN_COMMUNITY_DESCRIPTION_LEN: usize = 10;
pub const MAX_COMMUNITY_DESCRIPTION_LEN: usize = 500;

pub const DEFAULT_REPUTATION: i64 = 100;
pub const ADMIN_REPUTATION: i64 = 1000;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Human readable entity name used in error messages.
            pub const ENTITY: &'static str = $label;

            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| DomainError::BadRequest(format!("malformed {} ID: {s}", $label)))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(UserId, "User");
entity_id!(CommunityId, "Community");
entity_id!(PostId, "Post");
entity_id!(
    /// Identifier of a comment; appears in exactly one parent's `commentIDs`.
    CommentId,
    "Comment"
);
entity_id!(LinkFlairId, "LinkFlair");

/// A registered account. Reputation gates voting and moves with votes
/// received on the user's own posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub reputation: i64,
    pub is_admin: bool,
    pub created_date: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            display_name: display_name.into(),
            reputation: DEFAULT_REPUTATION,
            is_admin: false,
            created_date: Utc::now(),
        }
    }

    pub fn new_admin(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            reputation: ADMIN_REPUTATION,
            is_admin: true,
            ..Self::new(email, display_name)
        }
    }
}

/// A community groups posts. Referenced by search only incidentally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub description: String,
    #[serde(rename = "postIDs")]
    pub post_ids: Vec<PostId>,
    pub members: Vec<UserId>,
    pub member_count: i64,
    pub start_date: DateTime<Utc>,
}

impl Community {
    pub fn new(name: impl Into<String>, description: impl Into<String>, members: Vec<UserId>) -> Self {
        Self {
            id: CommunityId::new(),
            name: name.into(),
            description: description.into(),
            post_ids: Vec::new(),
            member_count: members.len() as i64,
            members,
            start_date: Utc::now(),
        }
    }
}

/// Direction of a single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Change applied to `voteCount`.
    pub fn score_delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl FromStr for VoteDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "upvote" => Ok(Self::Up),
            "down" | "downvote" => Ok(Self::Down),
            other => Err(DomainError::BadRequest(format!("unknown vote direction: {other}"))),
        }
    }
}

/// Kind of entity a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

/// A post or comment a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum VoteTarget {
    Post(PostId),
    Comment(CommentId),
}

impl VoteTarget {
    pub fn kind(self) -> TargetKind {
        match self {
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
        }
    }
}

/// Denormalized vote counters shared by posts and comments.
///
/// `vote_count` is always `upvotes - downvotes`; both counters only grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
    pub vote_count: i64,
}

impl VoteTally {
    pub fn record(&mut self, direction: VoteDirection) {
        match direction {
            VoteDirection::Up => self.upvotes += 1,
            VoteDirection::Down => self.downvotes += 1,
        }
        self.vote_count += direction.score_delta();
    }
}

/// The unit of discussion. `comment_ids` holds only root-level replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    #[serde(rename = "linkFlairID")]
    pub link_flair_id: Option<LinkFlairId>,
    pub posted_by: UserId,
    pub posted_date: DateTime<Utc>,
    #[serde(rename = "commentIDs")]
    pub comment_ids: Vec<CommentId>,
    pub views: i64,
    #[serde(flatten)]
    pub votes: VoteTally,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>, posted_by: UserId) -> Self {
        Self {
            id: PostId::new(),
            title: title.into(),
            content: content.into(),
            link_flair_id: None,
            posted_by,
            posted_date: Utc::now(),
            comment_ids: Vec::new(),
            views: 0,
            votes: VoteTally::default(),
        }
    }

    pub fn with_flair(mut self, flair: LinkFlairId) -> Self {
        self.link_flair_id = Some(flair);
        self
    }

    pub fn record_vote(&mut self, direction: VoteDirection) {
        self.votes.record(direction);
    }
}

/// A reply to a post or to another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub commented_by: UserId,
    pub commented_date: DateTime<Utc>,
    #[serde(rename = "commentIDs")]
    pub comment_ids: Vec<CommentId>,
    #[serde(flatten)]
    pub votes: VoteTally,
}

impl Comment {
    pub fn new(content: impl Into<String>, commented_by: UserId) -> Self {
        Self {
            id: CommentId::new(),
            content: content.into(),
            commented_by,
            commented_date: Utc::now(),
            comment_ids: Vec::new(),
            votes: VoteTally::default(),
        }
    }

    pub fn record_vote(&mut self, direction: VoteDirection) {
        self.votes.record(direction);
    }
}

/// A short label attached to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFlair {
    pub id: LinkFlairId,
    pub content: String,
}

impl LinkFlair {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: LinkFlairId::new(),
            content: content.into(),
        }
    }
}

/// Where a new comment is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum CommentParent {
    Post(PostId),
    Comment(CommentId),
}

/// Case-insensitive substring test used by the in-process stores.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
