use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::{
    event::{self, Event},
    partner::{self, Partner},
};

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::{AppState, today};
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate {
    ctx: PageCtx,
    upcoming: Vec<Event>,
    partners: Vec<Partner>,
}

pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let mut upcoming = event::upcoming_events(&state.read_pool, today()).await?;
    upcoming.truncate(3);
    let partners = partner::list_partners(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = HomeTemplate {
        ctx,
        upcoming,
        partners,
    }
    .render()?;

    Ok((jar, Html(html)))
}
