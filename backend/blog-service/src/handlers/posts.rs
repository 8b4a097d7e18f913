use actix_web::{web, HttpResponse};
use tracing::debug;

use super::{parse_post_id, redirect};
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::forms::PostSubmission;
use crate::media;
use crate::pagination::PageQuery;
use crate::services::{EditAccess, UpdateOutcome};
use crate::templates::{
    post_page, post_url, profile_url, render_html, CommentCard, FollowTemplate, GroupListTemplate,
    GroupOption, IndexTemplate, Nav, PostCard, PostDetailTemplate, PostFormTemplate,
    ProfileTemplate,
};
use crate::AppState;

/// GET / - every post, newest first
pub async fn index(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = state.posts().latest(query.page.as_deref()).await?;
    let (posts, paginator) = post_page(page);

    render_html(&IndexTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        posts,
        paginator,
    })
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (group, page) = state
        .posts()
        .group_posts(&path, query.page.as_deref())
        .await?;
    let (posts, paginator) = post_page(page);

    render_html(&GroupListTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        group_title: group.title,
        group_description: group.description,
        posts,
        paginator,
    })
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let data = state
        .posts()
        .profile(&path, query.page.as_deref(), viewer.as_ref())
        .await?;
    let post_count = data.post_count();
    let base = profile_url(&data.author.username);
    let (posts, paginator) = post_page(data.page);

    render_html(&ProfileTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        author_username: data.author.username,
        post_count,
        follower_count: data.follower_count,
        following_count: data.following_count,
        following: data.following,
        show_follow: data.can_follow,
        follow_url: format!("{}follow/", base),
        unfollow_url: format!("{}unfollow/", base),
        posts,
        paginator,
    })
}

/// GET /follow/ - posts by followed authors
pub async fn follow_index(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = state
        .posts()
        .follow_feed(&user, query.page.as_deref())
        .await?;
    let (posts, paginator) = post_page(page);

    render_html(&FollowTemplate {
        nav: Nav::for_viewer(Some(&user)),
        posts,
        paginator,
    })
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: Option<CurrentUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let detail = state.posts().detail(post_id).await?;
    let can_edit = viewer
        .as_ref()
        .map(|v| v.id == detail.post.author_id)
        .unwrap_or(false);

    render_html(&PostDetailTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        post: PostCard::from(detail.post),
        author_post_count: detail.author_post_count,
        can_edit,
        comments: detail.comments.into_iter().map(CommentCard::from).collect(),
        comment_url: format!("/posts/{}/comment/", post_id),
    })
}

struct FormPage<'a> {
    user: &'a CurrentUser,
    is_edit: bool,
    action: String,
    text: String,
    group: String,
    image: Option<String>,
}

async fn post_form(state: &AppState, page: FormPage<'_>) -> Result<PostFormTemplate> {
    let groups = state.posts().groups().await?;
    let selected = page.group.trim().to_string();

    Ok(PostFormTemplate {
        nav: Nav::for_viewer(Some(page.user)),
        is_edit: page.is_edit,
        action: page.action,
        text: page.text,
        no_group_selected: selected.is_empty(),
        groups: GroupOption::list(&groups, &selected),
        has_image: page.image.is_some(),
        image_url: page.image.as_deref().map(media::url_for).unwrap_or_default(),
        text_errors: Vec::new(),
        group_errors: Vec::new(),
        image_errors: Vec::new(),
    })
}

/// GET /create/
pub async fn post_create_form(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let form = post_form(
        &state,
        FormPage {
            user: &user,
            is_edit: false,
            action: "/create/".to_string(),
            text: String::new(),
            group: String::new(),
            image: None,
        },
    )
    .await?;
    render_html(&form)
}

/// POST /create/ - valid posts redirect to the author's profile
pub async fn post_create(
    state: web::Data<AppState>,
    user: CurrentUser,
    mut submission: PostSubmission,
) -> Result<HttpResponse> {
    match submission.clean(state.repo.as_ref(), &state.media).await? {
        Ok(valid) => {
            state.posts().create(&user, valid, &state.media).await?;
            Ok(redirect(profile_url(&user.username)))
        }
        Err(errors) => {
            debug!(user = %user.username, ?errors, "Rejected post form");
            let form = post_form(
                &state,
                FormPage {
                    user: &user,
                    is_edit: false,
                    action: "/create/".to_string(),
                    text: submission.text,
                    group: submission.group,
                    image: None,
                },
            )
            .await?;
            render_html(&form.with_errors(&errors))
        }
    }
}

/// GET /posts/{post_id}/edit/ - non-authors are sent back to the post
pub async fn post_edit_form(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = match state.posts().edit_access(post_id, &user).await? {
        EditAccess::Allowed(post) => post,
        EditAccess::NotAuthor => return Ok(redirect(post_url(post_id))),
    };

    let form = post_form(
        &state,
        FormPage {
            user: &user,
            is_edit: true,
            action: format!("/posts/{}/edit/", post_id),
            text: post.text,
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: post.image,
        },
    )
    .await?;
    render_html(&form)
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    mut submission: PostSubmission,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let current = match state.posts().edit_access(post_id, &user).await? {
        EditAccess::Allowed(post) => post,
        EditAccess::NotAuthor => return Ok(redirect(post_url(post_id))),
    };

    match submission.clean(state.repo.as_ref(), &state.media).await? {
        Ok(valid) => match state
            .posts()
            .update(post_id, &user, valid, &state.media)
            .await?
        {
            UpdateOutcome::Updated(_) | UpdateOutcome::NotAuthor => {
                Ok(redirect(post_url(post_id)))
            }
        },
        Err(errors) => {
            debug!(post_id = %post_id, ?errors, "Rejected post edit");
            let form = post_form(
                &state,
                FormPage {
                    user: &user,
                    is_edit: true,
                    action: format!("/posts/{}/edit/", post_id),
                    text: submission.text,
                    group: submission.group,
                    image: current.image,
                },
            )
            .await?;
            render_html(&form.with_errors(&errors))
        }
    }
}
