use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BlogRepository, PostFilter};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges,
    PostView, User,
};

/// In-process repository selected with `STORAGE_BACKEND=memory`
///
/// Rows are kept in insertion order, which doubles as the tie-breaker for
/// equal timestamps. Constraints mirror the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn group(&self, id: Uuid) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn follows(&self, user_id: Uuid, author_id: Uuid) -> bool {
        self.follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(id),
            PostFilter::Author(id) => post.author_id == id,
            PostFilter::FollowedBy(id) => self.follows(id, post.author_id),
        }
    }

    fn post_view(&self, post: &Post) -> PostView {
        let group = post.group_id.and_then(|id| self.group(id));
        PostView {
            id: post.id,
            author_id: post.author_id,
            author_username: self
                .user(post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            text: post.text.clone(),
            group_id: group.map(|g| g.id),
            group_title: group.map(|g| g.title.clone()),
            group_slug: group.map(|g| g.slug.clone()),
            image: post.image.clone(),
            created_at: post.created_at,
        }
    }

    fn comment_view(&self, comment: &Comment) -> CommentView {
        CommentView {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_username: self
                .user(comment.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }

    /// Posts matching `filter`, newest first, latest insert first on ties
    fn ordered_posts(&self, filter: PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .rev()
            .filter(|p| self.matches(p, filter))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

fn clamp_to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

#[async_trait::async_trait]
impl BlogRepository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username '{}' is taken",
                user.username
            )));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is taken",
                group.slug
            )));
        }

        let created = Group {
            id: Uuid::new_v4(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.group(id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups = state.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(groups)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        if state.user(post.author_id).is_none() {
            return Err(AppError::InvalidInput("unknown author or group".to_string()));
        }
        if let Some(group_id) = post.group_id {
            if state.group(group_id).is_none() {
                return Err(AppError::InvalidInput("unknown author or group".to_string()));
            }
        }

        let created = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            text: post.text,
            group_id: post.group_id,
            image: post.image,
            created_at: Utc::now(),
        };
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        if let Some(group_id) = changes.group_id {
            if state.group(group_id).is_none() {
                return Err(AppError::InvalidInput("unknown group".to_string()));
            }
        }

        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        if changes.image.is_some() {
            post.image = changes.image;
        }
        Ok(Some(post.clone()))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostView>> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.post_view(p)))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>> {
        let state = self.state.read().await;
        Ok(state
            .ordered_posts(filter)
            .into_iter()
            .skip(clamp_to_usize(offset))
            .take(clamp_to_usize(limit))
            .map(|p| state.post_view(p))
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let state = self.state.read().await;
        let count = state.posts.iter().filter(|p| state.matches(p, filter)).count();
        Ok(count as i64)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentView> {
        let mut state = self.state.write().await;
        if !state.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::not_found(format!("post {}", comment.post_id)));
        }
        if state.user(comment.author_id).is_none() {
            return Err(AppError::InvalidInput("unknown author".to_string()));
        }

        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        let view = state.comment_view(&created);
        state.comments.push(created);
        Ok(view)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let state = self.state.read().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments.into_iter().map(|c| state.comment_view(c)).collect())
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.comments.iter().filter(|c| c.post_id == post_id).count() as i64)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.follows(user_id, author_id))
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        if user_id == author_id {
            return Err(AppError::InvalidInput(
                "users cannot follow themselves".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        if state.follows(user_id, author_id) {
            return Ok(false);
        }

        state.follows.push(Follow {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(state.follows.len() < before)
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.author_id == author_id).count() as i64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.user_id == user_id).count() as i64)
    }

    async fn count_follows(&self) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.len() as i64)
    }
}
