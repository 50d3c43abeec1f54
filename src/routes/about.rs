use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate {
    ctx: PageCtx,
}

pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = AboutTemplate { ctx }.render()?;

    Ok((jar, Html(html)))
}
