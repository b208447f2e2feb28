use std::sync::Arc;

use domains::{LinkFlair, LinkFlairRepository, Result, MAX_FLAIR_LEN, MIN_CONTENT_LEN};

use crate::validation::require_length;

pub struct LinkFlairService {
    flairs: Arc<dyn LinkFlairRepository>,
}

impl LinkFlairService {
    pub fn new(flairs: Arc<dyn LinkFlairRepository>) -> Self {
        Self { flairs }
    }

    pub async fn create_flair(&self, content: &str) -> Result<LinkFlair> {
        require_length("flair", content, MIN_CONTENT_LEN, MAX_FLAIR_LEN)?;
        let flair = LinkFlair::new(content);
        self.flairs.insert(&flair).await?;
        Ok(flair)
    }

    pub async fn list_flairs(&self) -> Result<Vec<LinkFlair>> {
        self.flairs.list().await
    }
}
