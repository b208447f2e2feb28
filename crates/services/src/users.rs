use std::sync::Arc;

use domains::{DomainError, Result, User, UserId, UserRepository};
use tracing::info;

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Stores a new account; emails and display names are both unique.
    pub async fn register(&self, user: User) -> Result<User> {
        if !user.email.contains('@') {
            return Err(DomainError::BadRequest(format!("invalid email: {}", user.email)));
        }
        if self.users.find_by_email(&user.email).await?.is_some() {
            return Err(DomainError::Conflict(format!("email {} already in use", user.email)));
        }
        if self
            .users
            .find_by_display_name(&user.display_name)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "display name {} already in use",
                user.display_name
            )));
        }
        self.users.insert(&user).await?;
        info!(user = %user.id, admin = user.is_admin, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(UserId::ENTITY, id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list().await
    }
}
