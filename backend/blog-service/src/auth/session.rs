/// Session tokens
///
/// A session is an HS256 JWT stored in the `sessionid` cookie. Nothing is kept
/// server side; logging out drops the cookie.
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CurrentUser;
use crate::config::SessionConfig;
use crate::error::{AppError, Result};

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            secure_cookie,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            Duration::hours(config.ttl_hours),
            config.secure_cookie,
        )
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &CurrentUser) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Decode a token, rejecting bad signatures and expired sessions
    pub fn verify(&self, token: &str) -> Result<CurrentUser> {
        let data = decode::<SessionClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|e| AppError::Session(format!("malformed subject: {}", e)))?;

        Ok(CurrentUser {
            id,
            username: data.claims.username,
        })
    }

    /// Session cookie carrying a freshly issued token
    pub fn cookie(&self, user: &CurrentUser) -> Result<Cookie<'static>> {
        let token = self.issue(user)?;
        Ok(Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(CookieDuration::seconds(self.ttl.num_seconds()))
            .finish())
    }

    /// Expired cookie that makes the browser drop the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .finish();
        cookie.make_removal();
        cookie
    }
}
