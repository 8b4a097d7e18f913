use actix_web::{
    dev::ServiceResponse,
    http::{header, Method, StatusCode},
    middleware::ErrorHandlerResponse,
    web, HttpMessage, HttpRequest, HttpResponse,
};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::media;
use crate::templates::{render_html_status, Nav, NotFoundTemplate};
use crate::AppState;

/// Default service: slash-appending redirect, otherwise the custom 404 page
pub async fn not_found(req: HttpRequest, viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    if let Some(location) = append_slash(&req) {
        tracing::debug!(path = %req.path(), location = %location, "Appending slash");
        return Ok(HttpResponse::MovedPermanently()
            .insert_header((header::LOCATION, location))
            .finish());
    }

    tracing::debug!(path = %req.path(), "No route matched");
    not_found_page(&req, viewer.as_ref())
}

/// `ErrorHandlers` hook for 404s raised inside handlers
///
/// `AppError::NotFound` renders without a request at hand; this swaps in the
/// page with the viewer's navigation and the requested path.
pub fn render_not_found<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let raised_by_handler = res
        .response()
        .error()
        .and_then(|e| e.as_error::<AppError>())
        .is_some();
    if !raised_by_handler {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let (req, _) = res.into_parts();
    let viewer = req.extensions().get::<CurrentUser>().cloned();
    let page = not_found_page(&req, viewer.as_ref())?;
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, page).map_into_right_body(),
    ))
}

fn not_found_page(req: &HttpRequest, viewer: Option<&CurrentUser>) -> Result<HttpResponse> {
    render_html_status(
        &NotFoundTemplate {
            nav: Nav::for_viewer(viewer),
            path: req.path().to_string(),
        },
        StatusCode::NOT_FOUND,
    )
}

/// `/group/cats` -> `/group/cats/` when only the slashed path is routed
fn append_slash(req: &HttpRequest) -> Option<String> {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        return None;
    }

    let path = req.path();
    if path.ends_with('/') {
        return None;
    }

    let slashed = format!("{}/", path);
    if !req.resource_map().has_resource(&slashed) {
        return None;
    }

    Some(match req.query_string() {
        "" => slashed,
        query => format!("{}?{}", slashed, query),
    })
}

/// GET /health
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.repo.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
            "service": "blog-service"
        })),
    }
}

/// GET /media/posts/{file}
pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let bytes = state.media.read_post_image(&path).await?;
    Ok(HttpResponse::Ok()
        .content_type(media::content_type(&path))
        .body(bytes))
}
