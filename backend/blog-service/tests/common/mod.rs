#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::web;
use blog_service::auth::{password, CurrentUser, SessionKeys};
use blog_service::db::{BlogRepository, MemoryRepository, PostFilter};
use blog_service::media::MediaStore;
use blog_service::models::{Group, NewGroup, NewPost, NewUser, Post};
use blog_service::AppState;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "correct horse battery";
pub const PER_PAGE: i64 = 10;

/// Build the service the way `main` does, minus tracing
#[allow(unused_macros)]
macro_rules! init_app {
    ($fixture:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($fixture.state.clone())
                .wrap(
                    actix_web::middleware::ErrorHandlers::new().handler(
                        actix_web::http::StatusCode::NOT_FOUND,
                        blog_service::handlers::core::render_not_found,
                    ),
                )
                .wrap(blog_service::auth::SessionMiddleware::new(
                    $fixture.state.sessions.clone(),
                ))
                .wrap(blog_service::metrics::RequestMetrics)
                .configure(blog_service::handlers::configure)
                .default_service(
                    actix_web::web::route().to(blog_service::handlers::core::not_found),
                ),
        )
        .await
    };
}

/// GET a page that must answer 200 and return its HTML
#[allow(unused_macros)]
macro_rules! get_html {
    ($app:expr, $uri:expr) => {{
        let uri: &str = $uri;
        let req = actix_web::test::TestRequest::get().uri(uri).to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "GET {}", uri);
        $crate::common::body_text(resp).await
    }};
}

pub struct Fixture {
    pub state: web::Data<AppState>,
    pub repo: Arc<MemoryRepository>,
    pub media_root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let media_root = std::env::temp_dir().join(format!("quill-test-media-{}", Uuid::new_v4()));
        let state = AppState::new(
            repo.clone(),
            SessionKeys::new(SECRET, chrono::Duration::hours(1), false),
            MediaStore::new(media_root.clone(), 1024 * 1024),
            PER_PAGE,
        );

        Self {
            state: web::Data::new(state),
            repo,
            media_root,
        }
    }

    /// User whose password is never checked
    pub async fn user(&self, username: &str) -> CurrentUser {
        self.user_with_hash(username, "not-a-password-hash".to_string())
            .await
    }

    /// User that can log in with [`PASSWORD`]
    pub async fn user_with_password(&self, username: &str) -> CurrentUser {
        let hash = password::hash_password(PASSWORD).unwrap();
        self.user_with_hash(username, hash).await
    }

    async fn user_with_hash(&self, username: &str, password_hash: String) -> CurrentUser {
        let user = self
            .repo
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await
            .unwrap();
        CurrentUser {
            id: user.id,
            username: user.username,
        }
    }

    pub fn cookie(&self, user: &CurrentUser) -> Cookie<'static> {
        self.state.sessions.cookie(user).unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: "Test description".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &CurrentUser, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    /// `total` posts by `author`: the first `in_first` in one group, the rest in another
    pub async fn posts_in_two_groups(
        &self,
        author: &CurrentUser,
        total: usize,
        in_first: usize,
    ) -> (Group, Group) {
        let first = self.group("Test group", "test-slug").await;
        let second = self.group("Second group", "second-slug").await;
        for i in 0..total {
            let group = if i < in_first { &first } else { &second };
            self.post(author, &format!("Test post number {}", i), Some(group))
                .await;
        }
        (first, second)
    }

    pub async fn post_count(&self) -> i64 {
        self.repo.count_posts(PostFilter::All).await.unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

pub async fn body_text<B: actix_web::body::MessageBody>(
    resp: actix_web::dev::ServiceResponse<B>,
) -> String {
    let bytes = actix_web::test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Number of post cards rendered on a page
pub fn count_cards(html: &str) -> usize {
    html.matches("<article id=\"post-").count()
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub const BOUNDARY: &str = "----quill-test-boundary";

/// `multipart/form-data` body with text fields and an optional file part
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, file_name, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 1))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}
