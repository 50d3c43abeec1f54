use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::registration::{self, MemberRegistration};

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::{AppState, today};
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/member/dashboard.html")]
struct DashboardTemplate {
    ctx: PageCtx,
    upcoming: Vec<MemberRegistration>,
}

/// GET /dashboard - Member home: membership status, the feedback gate
/// banner and upcoming registrations
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let upcoming =
        registration::upcoming_registrations_for_member(&state.read_pool, &member.id, today())
            .await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = DashboardTemplate { ctx, upcoming }.render()?;

    Ok((jar, Html(html)))
}
