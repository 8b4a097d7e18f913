//! Signup, login and logout through the session cookie

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use blog_service::auth::SESSION_COOKIE;
use blog_service::db::BlogRepository;
use common::{body_text, location, Fixture, PASSWORD};

fn session_value<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

#[actix_web::test]
async fn signup_creates_account_and_signs_in() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "NewReader"),
            ("password1", "long enough secret"),
            ("password2", "long enough secret"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let token = session_value(&resp).expect("session cookie");
    assert!(!token.is_empty());

    let user = fixture
        .repo
        .find_user_by_username("NewReader")
        .await
        .unwrap()
        .expect("user stored");
    assert_ne!(user.password_hash, "long enough secret");
}

#[actix_web::test]
async fn signup_rejects_mismatched_passwords() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "NewReader"),
            ("password1", "long enough secret"),
            ("password2", "different secret"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_value(&resp).is_none());
    let html = body_text(resp).await;
    assert!(html.contains("match"));
    assert!(fixture
        .repo
        .find_user_by_username("NewReader")
        .await
        .unwrap()
        .is_none());
}

#[actix_web::test]
async fn signup_rejects_taken_username() {
    let fixture = Fixture::new();
    fixture.user("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "VasyaPetrov"),
            ("password1", "long enough secret"),
            ("password2", "long enough secret"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_value(&resp).is_none());
    assert!(body_text(resp).await.contains("already exists"));
}

#[actix_web::test]
async fn login_follows_next_and_session_works() {
    let fixture = Fixture::new();
    fixture.user_with_password("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "VasyaPetrov"),
            ("password", PASSWORD),
            ("next", "/create/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let token = session_value(&resp).expect("session cookie");

    let req = test::TestRequest::get()
        .uri("/create/")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_ignores_offsite_next() {
    let fixture = Fixture::new();
    fixture.user_with_password("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "VasyaPetrov"),
            ("password", PASSWORD),
            ("next", "//evil.example.com/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn wrong_password_rerenders_login() {
    let fixture = Fixture::new();
    fixture.user_with_password("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "VasyaPetrov"), ("password", "wrong password")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_value(&resp).is_none());
    assert!(body_text(resp).await.contains("Please enter a correct username and password"));
}

#[actix_web::test]
async fn logout_clears_session_cookie() {
    let fixture = Fixture::new();
    let user = fixture.user("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/auth/logout/")
        .cookie(fixture.cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(session_value(&resp).as_deref(), Some(""));
}

#[actix_web::test]
async fn tampered_cookie_is_anonymous() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/create/")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, "not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}
