//! # api-adapters
//!
//! The web routing and orchestration layer of the forum.
//!
//! [`AppState`] wires every service onto one set of repositories and is
//! transport-agnostic; the axum router lives behind the `web-axum` feature.

pub mod dto;
pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod http;

use domains::Repositories;
use services::{
    CommentService, CommentTreeService, CommunityService, LinkFlairService, PostService,
    ReputationPolicy, SearchService, UserService, VoteService,
};

use crate::metrics::Metrics;

/// State shared across all request handlers.
pub struct AppState {
    pub users: UserService,
    pub communities: CommunityService,
    pub posts: PostService,
    pub comments: CommentService,
    pub tree: CommentTreeService,
    pub votes: VoteService,
    pub search: SearchService,
    pub flairs: LinkFlairService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(repos: Repositories, policy: ReputationPolicy) -> Self {
        Self {
            users: UserService::new(repos.users.clone()),
            communities: CommunityService::new(repos.communities.clone(), repos.posts.clone()),
            posts: PostService::new(
                repos.posts.clone(),
                repos.communities.clone(),
                repos.flairs.clone(),
            ),
            comments: CommentService::new(repos.posts.clone(), repos.comments.clone()),
            tree: CommentTreeService::new(repos.posts.clone(), repos.comments.clone()),
            votes: VoteService::new(
                repos.users.clone(),
                repos.posts.clone(),
                repos.comments.clone(),
                policy,
            ),
            search: SearchService::new(repos.posts, repos.comments, repos.flairs.clone()),
            flairs: LinkFlairService::new(repos.flairs),
            metrics: Metrics::new(),
        }
    }
}
