use std::sync::Arc;

use domains::{
    Community, CommunityId, CommunityRepository, DomainError, Post, PostRepository, Result, UserId,
    MAX_COMMUNITY_DESCRIPTION_LEN, MAX_COMMUNITY_NAME_LEN, MIN_COMMUNITY_DESCRIPTION_LEN,
    MIN_CONTENT_LEN,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::validation::require_length;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub members: Vec<UserId>,
}

pub struct CommunityService {
    communities: Arc<dyn CommunityRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommunityService {
    pub fn new(communities: Arc<dyn CommunityRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { communities, posts }
    }

    /// Names are unique; the member list must not be empty.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_community(&self, input: NewCommunity) -> Result<Community> {
        require_length("name", &input.name, MIN_CONTENT_LEN, MAX_COMMUNITY_NAME_LEN)?;
        require_length(
            "description",
            &input.description,
            MIN_COMMUNITY_DESCRIPTION_LEN,
            MAX_COMMUNITY_DESCRIPTION_LEN,
        )?;
        if input.members.is_empty() {
            return Err(DomainError::BadRequest("members must be a non-empty list".into()));
        }
        if self.communities.find_by_name(&input.name).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "community {} already exists",
                input.name
            )));
        }

        let community = Community::new(input.name, input.description, input.members);
        self.communities.insert(&community).await?;
        info!(community = %community.id, "community created");
        Ok(community)
    }

    pub async fn get_community(&self, id: CommunityId) -> Result<Community> {
        self.communities
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(CommunityId::ENTITY, id))
    }

    pub async fn list_communities(&self) -> Result<Vec<Community>> {
        self.communities.list().await
    }

    /// Posts referenced by the community; dangling references are skipped.
    pub async fn posts_of(&self, id: CommunityId) -> Result<Vec<Post>> {
        let community = self.get_community(id).await?;
        self.posts.find_by_ids(&community.post_ids).await
    }
}
