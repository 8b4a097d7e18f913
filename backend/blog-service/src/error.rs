/// Error types for Blog Service
///
/// Every fallible path returns [`AppError`]. The `ResponseError` impl decides
/// what the browser sees: a redirect to the login page, the custom 404 page,
/// or the generic 500 page.
use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use askama::Template;
use thiserror::Error;

use crate::auth::login_url;
use crate::templates::{Nav, NotFoundTemplate, ServerErrorTemplate};

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Media storage error: {0}")]
    Media(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Media(_)
            | AppError::Session(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_url(next)))
                .finish(),
            AppError::NotFound(what) => {
                tracing::debug!(what = %what, "resource not found");
                let page = NotFoundTemplate {
                    nav: Nav::anonymous(),
                    path: String::new(),
                };
                html_or_plain(status, page.render())
            }
            AppError::InvalidInput(msg) | AppError::Conflict(msg) => HttpResponse::build(status)
                .content_type(mime::TEXT_PLAIN_UTF_8)
                .body(msg.clone()),
            _ => {
                tracing::error!(error = %self, "request failed");
                let page = ServerErrorTemplate {
                    nav: Nav::anonymous(),
                };
                html_or_plain(status, page.render())
            }
        }
    }
}

fn html_or_plain(status: StatusCode, rendered: askama::Result<String>) -> HttpResponse {
    match rendered {
        Ok(body) => HttpResponse::build(status)
            .content_type(mime::TEXT_HTML_UTF_8)
            .body(body),
        Err(err) => {
            tracing::error!(error = %err, "error page rendering failed");
            HttpResponse::build(status)
                .content_type(mime::TEXT_PLAIN_UTF_8)
                .body(status.canonical_reason().unwrap_or("Error"))
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Media(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Session(err.to_string())
    }
}
