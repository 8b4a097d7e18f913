use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{BlogRepository, PostFilter};
use crate::error::{AppError, Result};
use crate::models::{
    CommentView, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, PostView, User,
};

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, p.text,
           p.group_id, g.title AS group_title, g.slug AS group_slug,
           p.image, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `WHERE` clause for a listing filter plus the id it binds as `$1`
fn filter_clause(filter: PostFilter) -> (&'static str, Option<Uuid>) {
    match filter {
        PostFilter::All => ("", None),
        PostFilter::Group(id) => ("WHERE p.group_id = $1", Some(id)),
        PostFilter::Author(id) => ("WHERE p.author_id = $1", Some(id)),
        PostFilter::FollowedBy(id) => (
            "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = $1)",
            Some(id),
        ),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn is_check_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_check_violation())
}

#[async_trait::async_trait]
impl BlogRepository for PgRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("username '{}' is taken", user.username))
            } else {
                AppError::from(e)
            }
        })?;

        debug!(user_id = %created.id, "Created user");
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let created = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("group slug '{}' is taken", group.slug))
            } else {
                AppError::from(e)
            }
        })?;
        Ok(created)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title, slug",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, text, group_id, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, author_id, text, group_id, image, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.author_id)
        .bind(&post.text)
        .bind(post.group_id)
        .bind(&post.image)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InvalidInput("unknown author or group".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        debug!(post_id = %created.id, author_id = %created.author_id, "Created post");
        Ok(created)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let updated = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = COALESCE($4, image)
            WHERE id = $1
            RETURNING id, author_id, text, group_id, image, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InvalidInput("unknown group".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        if updated.is_some() {
            debug!(post_id = %id, "Updated post");
        }
        Ok(updated)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostView>> {
        let query = format!("{} WHERE p.id = $1", POST_VIEW_SELECT);
        let post = sqlx::query_as::<_, PostView>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>> {
        let (clause, bound) = filter_clause(filter);
        let (limit_idx, offset_idx) = if bound.is_some() { (2, 3) } else { (1, 2) };
        let query = format!(
            "{} {} ORDER BY p.created_at DESC, p.seq DESC LIMIT ${} OFFSET ${}",
            POST_VIEW_SELECT, clause, limit_idx, offset_idx
        );

        let mut q = sqlx::query_as::<_, PostView>(&query);
        if let Some(id) = bound {
            q = q.bind(id);
        }
        let posts = q.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let (clause, bound) = filter_clause(filter);
        let query = format!("SELECT COUNT(*) FROM posts p {}", clause);

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        if let Some(id) = bound {
            q = q.bind(id);
        }
        Ok(q.fetch_one(&self.pool).await?)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentView> {
        let created = sqlx::query_as::<_, CommentView>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, post_id, author_id, text, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT i.id, i.post_id, i.author_id, u.username AS author_username,
                   i.text, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found(format!("post {}", comment.post_id))
            } else {
                AppError::from(e)
            }
        })?;

        debug!(comment_id = %created.id, post_id = %created.post_id, "Created comment");
        Ok(created)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at, c.seq
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO follows (id, user_id, author_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_check_violation(&e) {
                AppError::InvalidInput("users cannot follow themselves".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        debug!(
            user_id = %user_id,
            author_id = %author_id,
            created = inserted.is_some(),
            "Follow requested"
        );
        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_follows(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
