//! Askama page templates
//!
//! Templates only see plain strings, bools and vectors; everything that needs
//! a decision (URLs, optional parts, selected options) is worked out here.

use actix_web::{http::StatusCode, HttpResponse};
use askama::Template;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::forms::FieldErrors;
use crate::media;
use crate::models::{CommentView, Group, PostView};
use crate::pagination::Page;

const DATE_FORMAT: &str = "%d %B %Y %H:%M";

/// Header navigation state
#[derive(Debug, Clone)]
pub struct Nav {
    pub is_authenticated: bool,
    pub username: String,
    pub profile_url: String,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            username: String::new(),
            profile_url: String::new(),
        }
    }

    pub fn for_viewer(viewer: Option<&CurrentUser>) -> Self {
        match viewer {
            Some(user) => Self {
                is_authenticated: true,
                username: user.username.clone(),
                profile_url: profile_url(&user.username),
            },
            None => Self::anonymous(),
        }
    }
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn group_url(slug: &str) -> String {
    format!("/group/{}/", urlencoding::encode(slug))
}

pub fn post_url(id: impl std::fmt::Display) -> String {
    format!("/posts/{}/", id)
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: String,
    pub detail_url: String,
    pub edit_url: String,
    pub author_username: String,
    pub author_url: String,
    pub text: String,
    pub created: String,
    pub has_group: bool,
    pub group_title: String,
    pub group_url: String,
    pub has_image: bool,
    pub image_url: String,
}

impl From<PostView> for PostCard {
    fn from(post: PostView) -> Self {
        let group_url = post.group_slug.as_deref().map(group_url).unwrap_or_default();
        let image_url = post.image.as_deref().map(media::url_for).unwrap_or_default();

        Self {
            id: post.id.to_string(),
            detail_url: post_url(post.id),
            edit_url: format!("/posts/{}/edit/", post.id),
            author_url: profile_url(&post.author_username),
            author_username: post.author_username,
            text: post.text,
            created: post.created_at.format(DATE_FORMAT).to_string(),
            has_group: post.group_slug.is_some(),
            group_title: post.group_title.unwrap_or_default(),
            group_url,
            has_image: post.image.is_some(),
            image_url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentCard {
    pub author_username: String,
    pub author_url: String,
    pub text: String,
    pub created: String,
}

impl From<CommentView> for CommentCard {
    fn from(comment: CommentView) -> Self {
        Self {
            author_url: profile_url(&comment.author_username),
            author_username: comment.author_username,
            text: comment.text,
            created: comment.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: i64,
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct PaginatorView {
    pub has_other_pages: bool,
    pub has_previous: bool,
    pub previous: i64,
    pub has_next: bool,
    pub next: i64,
    pub number: i64,
    pub num_pages: i64,
    pub links: Vec<PageLink>,
}

impl PaginatorView {
    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            has_other_pages: page.has_other_pages(),
            has_previous: page.has_previous(),
            previous: page.previous_page_number(),
            has_next: page.has_next(),
            next: page.next_page_number(),
            number: page.number,
            num_pages: page.num_pages,
            links: (1..=page.num_pages)
                .map(|number| PageLink {
                    number,
                    current: number == page.number,
                })
                .collect(),
        }
    }
}

/// Split a page of posts into cards and the paginator block
pub fn post_page(page: Page<PostView>) -> (Vec<PostCard>, PaginatorView) {
    let paginator = PaginatorView::of(&page);
    (page.items.into_iter().map(PostCard::from).collect(), paginator)
}

#[derive(Debug, Clone)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

impl GroupOption {
    pub fn list(groups: &[Group], selected: &str) -> Vec<Self> {
        groups
            .iter()
            .map(|g| {
                let id = g.id.to_string();
                GroupOption {
                    selected: id == selected,
                    id,
                    title: g.title.clone(),
                }
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub nav: Nav,
    pub group_title: String,
    pub group_description: String,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub author_username: String,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub following: bool,
    pub show_follow: bool,
    pub follow_url: String,
    pub unfollow_url: String,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub nav: Nav,
    pub post: PostCard,
    pub author_post_count: i64,
    pub can_edit: bool,
    pub comments: Vec<CommentCard>,
    pub comment_url: String,
}

/// Create and edit share one form page
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub no_group_selected: bool,
    pub has_image: bool,
    pub image_url: String,
    pub text_errors: Vec<String>,
    pub group_errors: Vec<String>,
    pub image_errors: Vec<String>,
}

impl PostFormTemplate {
    pub fn with_errors(mut self, errors: &FieldErrors) -> Self {
        self.text_errors = errors.get("text");
        self.group_errors = errors.get("group");
        self.image_errors = errors.get("image");
        self
    }
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub next: String,
    pub username: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub username: String,
    pub username_errors: Vec<String>,
    pub password1_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
    pub path: String,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorTemplate {
    pub nav: Nav,
}

/// Render a template into a `200 OK` HTML response
pub fn render_html<T: Template>(template: &T) -> Result<HttpResponse> {
    render_html_status(template, StatusCode::OK)
}

pub fn render_html_status<T: Template>(template: &T, status: StatusCode) -> Result<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::build(status)
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(body))
}
