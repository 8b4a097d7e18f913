//! Storage layer
//!
//! [`BlogRepository`] is the only seam between the services and storage.
//! `PgRepository` is the production backend; `MemoryRepository` keeps the same
//! behaviour in process for local runs and the HTTP test-suite.

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    CommentView, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, PostView, User,
};

/// Which posts a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows
    FollowedBy(Uuid),
}

/// Listings are ordered newest first; ties go to the most recent insert.
#[async_trait::async_trait]
pub trait BlogRepository: Send + Sync {
    /// Cheap round-trip used by `/health`
    async fn ping(&self) -> Result<()>;

    /// Fails with `AppError::Conflict` when the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Returns `None` when the post does not exist
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    async fn find_post(&self, id: Uuid) -> Result<Option<PostView>>;

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64)
        -> Result<Vec<PostView>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    async fn create_comment(&self, comment: NewComment) -> Result<CommentView>;

    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>>;

    async fn count_comments(&self, post_id: Uuid) -> Result<i64>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns `false` when the relation already existed
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns `false` when there was nothing to delete
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Number of users following `author_id`
    async fn count_followers(&self, author_id: Uuid) -> Result<i64>;

    /// Number of authors `user_id` follows
    async fn count_following(&self, user_id: Uuid) -> Result<i64>;

    async fn count_follows(&self) -> Result<i64>;
}
