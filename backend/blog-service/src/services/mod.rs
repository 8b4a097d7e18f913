/// Business logic layer for blog-service
///
/// - Post service: listings, detail, create and author-only edit
/// - Comment service: comments on existing posts
/// - Follow service: follow/unfollow rules
/// - Account service: signup and credential checks
pub mod accounts;
pub mod comments;
pub mod follows;
pub mod posts;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use follows::FollowService;
pub use posts::{EditAccess, PostDetail, PostService, ProfileData, UpdateOutcome};
