/// Comment service - comments are attached to existing posts only
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{CommentView, NewComment};

pub struct CommentService {
    repo: Arc<dyn BlogRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Fails with `NotFound` when the post does not exist
    pub async fn ensure_post(&self, post_id: Uuid) -> Result<()> {
        match self.repo.find_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("post {}", post_id))),
        }
    }

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author: &CurrentUser,
        text: String,
    ) -> Result<CommentView> {
        self.ensure_post(post_id).await?;

        let comment = self
            .repo
            .create_comment(NewComment {
                post_id,
                author_id: author.id,
                text,
            })
            .await?;

        info!(
            comment_id = %comment.id,
            post_id = %post_id,
            author = %author.username,
            "Comment added"
        );
        Ok(comment)
    }
}
