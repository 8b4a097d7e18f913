use actix_web::{web, HttpResponse};

use super::redirect;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::templates::profile_url;
use crate::AppState;

/// GET|POST /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = state.follows().follow(&user, &path).await?;
    Ok(redirect(profile_url(&author.username)))
}

/// GET|POST /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = state.follows().unfollow(&user, &path).await?;
    Ok(redirect(profile_url(&author.username)))
}
