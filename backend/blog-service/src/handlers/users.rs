use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::auth::{safe_next, CurrentUser};
use crate::error::Result;
use crate::forms::{FieldErrors, LoginForm, SignupForm};
use crate::templates::{render_html, LoggedOutTemplate, LoginTemplate, Nav, SignupTemplate};
use crate::AppState;

const INVALID_LOGIN: &str = "Please enter a correct username and password. \
                             Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn signup_page(viewer: Option<&CurrentUser>, username: &str, errors: &FieldErrors) -> SignupTemplate {
    SignupTemplate {
        nav: Nav::for_viewer(viewer),
        username: username.to_string(),
        username_errors: errors.get("username"),
        password1_errors: errors.get("password1"),
        password2_errors: errors.get("password2"),
    }
}

/// GET /auth/signup/
pub async fn signup_form(viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    render_html(&signup_page(viewer.as_ref(), "", &FieldErrors::new()))
}

/// POST /auth/signup/ - a new account is logged in straight away
pub async fn signup(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    match state.accounts().signup(&form).await? {
        Ok(user) => {
            let cookie = state.sessions.cookie(&user)?;
            Ok(HttpResponse::Found()
                .insert_header((actix_web::http::header::LOCATION, "/"))
                .cookie(cookie)
                .finish())
        }
        Err(errors) => render_html(&signup_page(viewer.as_ref(), &form.username, &errors)),
    }
}

/// GET /auth/login/
pub async fn login_form(
    viewer: Option<CurrentUser>,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse> {
    render_html(&LoginTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        next: query.next.clone().unwrap_or_default(),
        username: String::new(),
        errors: Vec::new(),
    })
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let user = if form.is_complete() {
        state
            .accounts()
            .authenticate(form.username.trim(), &form.password)
            .await?
    } else {
        None
    };

    match user {
        Some(user) => {
            let cookie = state.sessions.cookie(&user)?;
            let destination = safe_next(form.next.as_deref());
            info!(username = %user.username, next = %destination, "User logged in");
            Ok(HttpResponse::Found()
                .insert_header((actix_web::http::header::LOCATION, destination))
                .cookie(cookie)
                .finish())
        }
        None => render_html(&LoginTemplate {
            nav: Nav::for_viewer(viewer.as_ref()),
            next: form.next.clone().unwrap_or_default(),
            username: form.username.clone(),
            errors: vec![INVALID_LOGIN.to_string()],
        }),
    }
}

/// GET|POST /auth/logout/
pub async fn logout(state: web::Data<AppState>, viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    if let Some(user) = viewer {
        info!(username = %user.username, "User logged out");
    }

    let page = LoggedOutTemplate {
        nav: Nav::anonymous(),
    };
    let body = askama::Template::render(&page)?;
    Ok(HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .cookie(state.sessions.removal_cookie())
        .body(body))
}
