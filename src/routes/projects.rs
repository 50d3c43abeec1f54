use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::project::{self, Project};

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/projects.html")]
struct ProjectsTemplate {
    ctx: PageCtx,
    projects: Vec<Project>,
}

/// GET /projects - Association project showcase, newest year first
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let projects = project::list_projects(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = ProjectsTemplate { ctx, projects }.render()?;

    Ok((jar, Html(html)))
}
