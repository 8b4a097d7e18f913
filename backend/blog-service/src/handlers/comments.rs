use actix_web::{web, HttpResponse};
use tracing::debug;

use super::{parse_post_id, redirect};
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::forms::CommentForm;
use crate::templates::post_url;
use crate::AppState;

/// POST /posts/{post_id}/comment/
///
/// Always lands back on the post; a blank comment is dropped.
pub async fn add_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let comments = state.comments();
    comments.ensure_post(post_id).await?;

    match form.cleaned() {
        Ok(text) => {
            comments.add_comment(post_id, &user, text).await?;
        }
        Err(errors) => {
            debug!(post_id = %post_id, ?errors, "Rejected comment");
        }
    }

    Ok(redirect(post_url(post_id)))
}
