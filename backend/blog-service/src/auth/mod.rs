//! Authentication and login gating
//!
//! [`SessionMiddleware`] resolves the session cookie into a [`CurrentUser`]
//! stored in request extensions. Handlers that take `CurrentUser` are login
//! gated: anonymous requests are redirected to the login page with `next` set
//! to the original path. Handlers that take `Option<CurrentUser>` are public.

mod middleware;
pub mod password;
mod session;

pub use middleware::SessionMiddleware;
pub use session::{SessionClaims, SessionKeys, SESSION_COOKIE};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

pub const LOGIN_PATH: &str = "/auth/login/";

/// The authenticated user making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                ready(Err(AppError::LoginRequired { next }))
            }
        }
    }
}

/// Login page URL that returns to `next` afterwards. Slashes stay readable.
pub fn login_url(next: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN_PATH,
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// Post-login destination: `next` when it is a local path, `/` otherwise
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
