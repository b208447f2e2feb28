use std::sync::Arc;

use domains::{
    CommunityId, CommunityRepository, DomainError, LinkFlairId, LinkFlairRepository, Post, PostId,
    PostRepository, Result, UserId, MAX_TITLE_LEN, MIN_CONTENT_LEN,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::validation::require_length;

/// Input for a new post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(rename = "communityID")]
    pub community_id: CommunityId,
    pub title: String,
    pub content: String,
    #[serde(rename = "linkFlairID", default)]
    pub link_flair_id: Option<LinkFlairId>,
    pub posted_by: UserId,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    communities: Arc<dyn CommunityRepository>,
    flairs: Arc<dyn LinkFlairRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        communities: Arc<dyn CommunityRepository>,
        flairs: Arc<dyn LinkFlairRepository>,
    ) -> Self {
        Self {
            posts,
            communities,
            flairs,
        }
    }

    /// Stores the post and appends it to its community.
    #[instrument(skip(self, input), fields(community = %input.community_id))]
    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        require_length("title", &input.title, MIN_CONTENT_LEN, MAX_TITLE_LEN)?;
        if input.content.trim().is_empty() {
            return Err(DomainError::BadRequest("post content is required".into()));
        }

        if self.communities.find_by_id(input.community_id).await?.is_none() {
            return Err(DomainError::not_found(CommunityId::ENTITY, input.community_id));
        }
        if let Some(flair) = input.link_flair_id {
            if self.flairs.find_by_id(flair).await?.is_none() {
                return Err(DomainError::not_found(LinkFlairId::ENTITY, flair));
            }
        }

        let mut post = Post::new(input.title, input.content, input.posted_by);
        post.link_flair_id = input.link_flair_id;
        self.posts.insert(&post).await?;

        if !self.communities.push_post(input.community_id, post.id).await? {
            warn!(post = %post.id, "community vanished before the post was attached");
        }

        info!(post = %post.id, "post created");
        Ok(post)
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(PostId::ENTITY, id))
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        self.posts.list().await
    }

    /// Atomically bumps the view counter.
    pub async fn record_view(&self, id: PostId) -> Result<Post> {
        self.posts
            .increment_views(id)
            .await?
            .ok_or_else(|| DomainError::not_found(PostId::ENTITY, id))
    }
}
