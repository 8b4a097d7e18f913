/// Follow service - one relation per (user, author) pair, never to oneself
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::CurrentUser;
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::User;

pub struct FollowService {
    repo: Arc<dyn BlogRepository>,
}

impl FollowService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    async fn author(&self, username: &str) -> Result<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {}", username)))
    }

    /// Follow `username`. Following oneself or an already followed author is a no-op.
    pub async fn follow(&self, viewer: &CurrentUser, username: &str) -> Result<User> {
        let author = self.author(username).await?;

        if author.id == viewer.id {
            debug!(user = %viewer.username, "Ignoring self-follow");
            return Ok(author);
        }

        if self.repo.create_follow(viewer.id, author.id).await? {
            info!(user = %viewer.username, author = %author.username, "Followed author");
        }
        Ok(author)
    }

    /// Remove the relation if there is one
    pub async fn unfollow(&self, viewer: &CurrentUser, username: &str) -> Result<User> {
        let author = self.author(username).await?;

        if self.repo.delete_follow(viewer.id, author.id).await? {
            info!(user = %viewer.username, author = %author.username, "Unfollowed author");
        }
        Ok(author)
    }
}
