//! HTTP handlers and the route table
//!
//! Paths keep their trailing slash (`/posts/{post_id}/`). Unknown paths fall
//! through to [`core::not_found`], registered as the app's default service.

pub mod about;
pub mod comments;
pub mod core;
pub mod follows;
pub mod posts;
pub mod users;

use actix_web::{http::header, web, HttpResponse};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::forms::FORM_BODY_LIMIT;
use crate::metrics;

/// Register every route of the site
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(FORM_BODY_LIMIT))
        .route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .service(
            web::resource("/profile/{username}/follow/")
                .route(web::get().to(follows::profile_follow))
                .route(web::post().to(follows::profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(follows::profile_unfollow))
                .route(web::post().to(follows::profile_unfollow)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .route(
            "/posts/{post_id}/comment/",
            web::post().to(comments::add_comment),
        )
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .route("/follow/", web::get().to(posts::follow_index))
        .service(
            web::resource("/auth/signup/")
                .route(web::get().to(users::signup_form))
                .route(web::post().to(users::signup)),
        )
        .service(
            web::resource("/auth/login/")
                .route(web::get().to(users::login_form))
                .route(web::post().to(users::login)),
        )
        .service(
            web::resource("/auth/logout/")
                .route(web::get().to(users::logout))
                .route(web::post().to(users::logout)),
        )
        .route("/about/author/", web::get().to(about::author))
        .route("/about/tech/", web::get().to(about::tech))
        .route("/media/posts/{file}", web::get().to(core::serve_media))
        .route("/health", web::get().to(core::health))
        .route("/metrics", web::get().to(metrics::serve_metrics));
}

/// Post ids that are not UUIDs cannot exist
pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("post {}", raw)))
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}
