/// Post service - listings, detail pages, creation and author-only edits
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::{BlogRepository, PostFilter};
use crate::error::{AppError, Result};
use crate::forms::ValidPost;
use crate::media::MediaStore;
use crate::models::{CommentView, Group, NewPost, Post, PostChanges, PostView, User};
use crate::pagination::{Page, Paginator};

pub struct PostService {
    repo: Arc<dyn BlogRepository>,
    per_page: i64,
}

/// Everything the profile page shows
#[derive(Debug)]
pub struct ProfileData {
    pub author: User,
    pub page: Page<PostView>,
    pub follower_count: i64,
    pub following_count: i64,
    /// The viewer follows this author
    pub following: bool,
    /// Follow controls are shown: viewer is logged in and is not the author
    pub can_follow: bool,
}

impl ProfileData {
    pub fn post_count(&self) -> i64 {
        self.page.total
    }
}

#[derive(Debug)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub author_post_count: i64,
}

/// Result of an edit permission check
#[derive(Debug)]
pub enum EditAccess {
    Allowed(PostView),
    NotAuthor,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Post),
    NotAuthor,
}

impl PostService {
    pub fn new(repo: Arc<dyn BlogRepository>, per_page: i64) -> Self {
        Self {
            repo,
            per_page: per_page.max(1),
        }
    }

    async fn page(&self, filter: PostFilter, requested: Option<&str>) -> Result<Page<PostView>> {
        let total = self.repo.count_posts(filter).await?;
        let paginator = Paginator::new(self.per_page, total);
        let number = paginator.page_number(requested);
        let (limit, offset) = paginator.bounds(number);
        let items = self.repo.list_posts(filter, limit, offset).await?;
        Ok(paginator.page(number, items))
    }

    /// All posts, newest first
    pub async fn latest(&self, requested: Option<&str>) -> Result<Page<PostView>> {
        self.page(PostFilter::All, requested).await
    }

    pub async fn group_posts(
        &self,
        slug: &str,
        requested: Option<&str>,
    ) -> Result<(Group, Page<PostView>)> {
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group {}", slug)))?;
        let page = self.page(PostFilter::Group(group.id), requested).await?;
        Ok((group, page))
    }

    pub async fn profile(
        &self,
        username: &str,
        requested: Option<&str>,
        viewer: Option<&CurrentUser>,
    ) -> Result<ProfileData> {
        let author = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {}", username)))?;

        let page = self.page(PostFilter::Author(author.id), requested).await?;
        let follower_count = self.repo.count_followers(author.id).await?;
        let following_count = self.repo.count_following(author.id).await?;

        let (following, can_follow) = match viewer {
            Some(viewer) if viewer.id != author.id => {
                (self.repo.is_following(viewer.id, author.id).await?, true)
            }
            _ => (false, false),
        };

        Ok(ProfileData {
            author,
            page,
            follower_count,
            following_count,
            following,
            can_follow,
        })
    }

    /// Posts by every author the viewer follows
    pub async fn follow_feed(
        &self,
        viewer: &CurrentUser,
        requested: Option<&str>,
    ) -> Result<Page<PostView>> {
        self.page(PostFilter::FollowedBy(viewer.id), requested).await
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self.find(post_id).await?;
        let comments = self.repo.list_comments(post_id).await?;
        let author_post_count = self
            .repo
            .count_posts(PostFilter::Author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    pub async fn find(&self, post_id: Uuid) -> Result<PostView> {
        self.repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    /// Persist a validated post authored by `author`, storing its image first
    pub async fn create(
        &self,
        author: &CurrentUser,
        valid: ValidPost,
        media: &MediaStore,
    ) -> Result<Post> {
        let image = match &valid.image {
            Some(checked) => Some(media.save_post_image(checked).await?),
            None => None,
        };

        let post = self
            .repo
            .create_post(NewPost {
                author_id: author.id,
                text: valid.text,
                group_id: valid.group_id,
                image,
            })
            .await?;

        info!(post_id = %post.id, author = %author.username, "Post created");
        Ok(post)
    }

    /// Only the author may edit a post
    pub async fn edit_access(&self, post_id: Uuid, viewer: &CurrentUser) -> Result<EditAccess> {
        let post = self.find(post_id).await?;
        if post.author_id == viewer.id {
            Ok(EditAccess::Allowed(post))
        } else {
            warn!(
                post_id = %post_id,
                viewer = %viewer.username,
                "Edit attempt by non-author"
            );
            Ok(EditAccess::NotAuthor)
        }
    }

    pub async fn update(
        &self,
        post_id: Uuid,
        viewer: &CurrentUser,
        valid: ValidPost,
        media: &MediaStore,
    ) -> Result<UpdateOutcome> {
        let previous_image = match self.edit_access(post_id, viewer).await? {
            EditAccess::Allowed(post) => post.image,
            EditAccess::NotAuthor => return Ok(UpdateOutcome::NotAuthor),
        };

        let image = match &valid.image {
            Some(checked) => Some(media.save_post_image(checked).await?),
            None => None,
        };

        let post = self
            .repo
            .update_post(
                post_id,
                PostChanges {
                    text: valid.text,
                    group_id: valid.group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        if let (Some(old), Some(current)) = (previous_image, post.image.as_deref()) {
            if old != current {
                if let Err(e) = media.remove_post_image(&old).await {
                    warn!(post_id = %post.id, path = %old, error = %e, "Failed to remove replaced image");
                }
            }
        }

        info!(post_id = %post.id, "Post updated");
        Ok(UpdateOutcome::Updated(post))
    }

    /// Choices for the group field of the post form
    pub async fn groups(&self) -> Result<Vec<Group>> {
        self.repo.list_groups().await
    }
}
