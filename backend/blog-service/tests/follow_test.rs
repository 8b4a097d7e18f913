#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use blog_service::db::BlogRepository;
use common::{body_text, count_cards, location, Fixture};

#[actix_web::test]
async fn follow_and_unfollow() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let follower = fixture.user("PetyaVasechkin").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/profile/VasyaPetrov/follow/")
        .cookie(fixture.cookie(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/VasyaPetrov/");
    assert!(fixture
        .repo
        .is_following(follower.id, author.id)
        .await
        .unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/VasyaPetrov/unfollow/")
        .cookie(fixture.cookie(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!fixture
        .repo
        .is_following(follower.id, author.id)
        .await
        .unwrap());
}

#[actix_web::test]
async fn duplicate_and_self_follows_create_nothing() {
    let fixture = Fixture::new();
    fixture.user("VasyaPetrov").await;
    let follower = fixture.user("PetyaVasechkin").await;
    let app = init_app!(fixture);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/profile/VasyaPetrov/follow/")
            .cookie(fixture.cookie(&follower))
            .to_request();
        test::call_service(&app, req).await;
    }
    assert_eq!(fixture.repo.count_follows().await.unwrap(), 1);

    let req = test::TestRequest::get()
        .uri("/profile/PetyaVasechkin/follow/")
        .cookie(fixture.cookie(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(fixture.repo.count_follows().await.unwrap(), 1);
}

#[actix_web::test]
async fn follow_unknown_author_is_not_found() {
    let fixture = Fixture::new();
    let follower = fixture.user("PetyaVasechkin").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/profile/nobody/follow/")
        .cookie(fixture.cookie(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_follow_redirects_to_login() {
    let fixture = Fixture::new();
    fixture.user("VasyaPetrov").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/profile/VasyaPetrov/follow/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        "/auth/login/?next=/profile/VasyaPetrov/follow/"
    );
    assert_eq!(fixture.repo.count_follows().await.unwrap(), 0);
}

#[actix_web::test]
async fn new_post_reaches_followers_only() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let follower = fixture.user("PetyaVasechkin").await;
    let outsider = fixture.user("MashaStartseva").await;
    fixture
        .repo
        .create_follow(follower.id, author.id)
        .await
        .unwrap();
    let app = init_app!(fixture);

    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(fixture.cookie(&author))
        .set_form([("text", "Fresh news for followers"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(fixture.cookie(&follower))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert_eq!(count_cards(&html), 1);
    assert!(html.contains("Fresh news for followers"));

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(fixture.cookie(&outsider))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert_eq!(count_cards(&html), 0);
    assert!(!html.contains("Fresh news for followers"));
}

#[actix_web::test]
async fn profile_shows_follow_button_to_others() {
    let fixture = Fixture::new();
    let author = fixture.user("VasyaPetrov").await;
    let reader = fixture.user("PetyaVasechkin").await;
    let app = init_app!(fixture);

    let req = test::TestRequest::get()
        .uri("/profile/VasyaPetrov/")
        .cookie(fixture.cookie(&reader))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("class=\"follow\""));

    let req = test::TestRequest::get()
        .uri("/profile/VasyaPetrov/")
        .cookie(fixture.cookie(&author))
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(!html.contains("class=\"follow\""));
    assert!(!html.contains("class=\"unfollow\""));
}
