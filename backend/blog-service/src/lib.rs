/// Blog Service Library
///
/// Server-rendered blogging platform: authors write posts, optionally filed
/// under a group, readers comment on them and follow authors to get a
/// personal feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `services`: Business logic between handlers and storage
/// - `db`: Repository trait plus PostgreSQL and in-memory backends
/// - `models`: Records and joined views
/// - `forms`: Form binding and validation
/// - `auth`: Session tokens, password hashing, login gating
/// - `pagination`: Fixed-size page slicing
/// - `templates`: askama page templates
/// - `media`: Uploaded image storage
/// - `metrics`: Prometheus collectors and request metrics middleware
/// - `error`: Error types and their HTTP rendering
/// - `config`: Configuration management
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod services;
pub mod templates;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use auth::SessionKeys;
use db::BlogRepository;
use media::MediaStore;
use services::{AccountService, CommentService, FollowService, PostService};

/// Shared state handed to every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn BlogRepository>,
    pub sessions: SessionKeys,
    pub media: Arc<MediaStore>,
    pub posts_per_page: i64,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        sessions: SessionKeys,
        media: MediaStore,
        posts_per_page: i64,
    ) -> Self {
        Self {
            repo,
            sessions,
            media: Arc::new(media),
            posts_per_page: posts_per_page.max(1),
        }
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.repo.clone(), self.posts_per_page)
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.repo.clone())
    }

    pub fn follows(&self) -> FollowService {
        FollowService::new(self.repo.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.repo.clone())
    }
}
