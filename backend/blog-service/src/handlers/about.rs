use actix_web::HttpResponse;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::templates::{render_html, AboutAuthorTemplate, AboutTechTemplate, Nav};

/// GET /about/author/
pub async fn author(viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    render_html(&AboutAuthorTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
    })
}

/// GET /about/tech/
pub async fn tech(viewer: Option<CurrentUser>) -> Result<HttpResponse> {
    render_html(&AboutTechTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
    })
}
