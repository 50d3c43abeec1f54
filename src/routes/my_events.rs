use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::registration::{self, MemberRegistration};

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/member/my_events.html")]
struct MyEventsTemplate {
    ctx: PageCtx,
    registrations: Vec<MemberRegistration>,
}

/// GET /my-events - Full registration history with attendance and
/// feedback state per event
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let registrations =
        registration::registrations_for_member(&state.read_pool, &member.id).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = MyEventsTemplate { ctx, registrations }.render()?;

    Ok((jar, Html(html)))
}
