#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use blog_service::db::BlogRepository;
use common::{body_text, location, Fixture};

#[actix_web::test]
async fn authorized_comment_is_shown_on_post() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let reader = fixture.user("MashaStartseva").await;
    let post = fixture.post(&author, "Post to discuss", None).await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .cookie(fixture.cookie(&reader))
        .set_form([("text", "Nice post")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(fixture.repo.count_comments(post.id).await.unwrap(), 1);
    let comments = fixture.repo.list_comments(post.id).await.unwrap();
    let newest = comments.last().unwrap();
    assert_eq!(newest.text, "Nice post");
    assert_eq!(newest.post_id, post.id);
    assert_eq!(newest.author_id, reader.id);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("Nice post"));
    assert!(html.contains("MashaStartseva"));
}

#[actix_web::test]
async fn anonymous_comment_is_rejected() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let post = fixture.post(&author, "Post to discuss", None).await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .set_form([("text", "Drive-by comment")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert_eq!(fixture.repo.count_comments(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn blank_comment_is_dropped() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let post = fixture.post(&author, "Post to discuss", None).await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .cookie(fixture.cookie(&author))
        .set_form([("text", "  ")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(fixture.repo.count_comments(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn comment_on_missing_post_is_not_found() {
    let fixture = Fixture::new();
    let reader = fixture.user("MashaStartseva").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", uuid::Uuid::new_v4()))
        .cookie(fixture.cookie(&reader))
        .set_form([("text", "Hello?")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comment_form_only_for_signed_in_readers() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let post = fixture.post(&author, "Post to discuss", None).await;
    let app = init_app!(fixture);
    let uri = format!("/posts/{}/", post.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(!html.contains("Add a comment"));

    let req = test::TestRequest::get()
        .uri(&uri)
        .cookie(fixture.cookie(&author))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("Add a comment"));
    assert!(html.contains("Edit post"));
}

#[actix_web::test]
async fn long_comment_is_saved() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let post = fixture.post(&author, "Post to discuss", None).await;
    let app = init_app!(fixture);

    let text = "a thoughtful reply ".repeat(2 * 1024);
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .cookie(fixture.cookie(&author))
        .set_form([("text", text.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let comments = fixture.repo.list_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, text.trim());
}
