//! # services
//!
//! Use-cases of the forum core, written against the port traits in `domains`.
//!
//! The three engines with cross-entity rules live in [`comment_tree`],
//! [`votes`] and [`search`]; the remaining modules are the thin create/read
//! paths that feed them.

pub mod comment_tree;
pub mod comments;
pub mod communities;
pub mod flairs;
pub mod posts;
pub mod search;
pub mod users;
pub mod votes;

mod validation;

pub use comment_tree::{CommentTree, CommentTreeService};
pub use comments::{CommentService, NewComment};
pub use communities::{CommunityService, NewCommunity};
pub use flairs::LinkFlairService;
pub use posts::{NewPost, PostService};
pub use search::SearchService;
pub use users::UserService;
pub use votes::{ReputationPolicy, VoteService, VotedEntity};
