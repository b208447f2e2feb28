//! Shared fixture: every service wired onto one in-memory store.

use std::sync::Arc;

use domains::{Community, Post, Repositories, User};
use services::{
    CommentService, CommentTreeService, PostService, ReputationPolicy, SearchService, VoteService,
};
use storage_adapters::MemoryStore;

pub struct Forum {
    pub repos: Repositories,
    pub posts: PostService,
    pub comments: CommentService,
    pub tree: CommentTreeService,
    pub votes: VoteService,
    pub search: SearchService,
}

impl Forum {
    pub fn new() -> Self {
        let repos = Arc::new(MemoryStore::new()).into_repositories();
        Self {
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
                ReputationPolicy::default(),
            ),
            search: SearchService::new(
                repos.posts.clone(),
                repos.comments.clone(),
                repos.flairs.clone(),
            ),
            repos,
        }
    }

    /// Inserts a user with the given reputation.
    pub async fn user(&self, name: &str, reputation: i64) -> User {
        let mut user = User::new(format!("{name}@forum.test"), name);
        user.reputation = reputation;
        self.repos
            .users
            .insert(&user)
            .await
            .unwrap_or_else(|e| panic!("seeding user {name}: {e}"));
        user
    }

    pub async fn reputation_of(&self, user: &User) -> i64 {
        self.repos
            .users
            .find_by_id(user.id)
            .await
            .ok()
            .flatten()
            .map(|u| u.reputation)
            .unwrap_or_else(|| panic!("user {} vanished", user.id))
    }

    /// Inserts a post directly, bypassing community bookkeeping.
    pub async fn post(&self, title: &str, content: &str, author: &User) -> Post {
        let post = Post::new(title, content, author.id);
        self.repos
            .posts
            .insert(&post)
            .await
            .unwrap_or_else(|e| panic!("seeding post {title}: {e}"));
        post
    }

    pub async fn community(&self, name: &str, owner: &User) -> Community {
        let community = Community::new(name, "a community for tests", vec![owner.id]);
        self.repos
            .communities
            .insert(&community)
            .await
            .unwrap_or_else(|e| panic!("seeding community {name}: {e}"));
        community
    }
}

impl Default for Forum {
    fn default() -> Self {
        Self::new()
    }
}
