use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::{event, member, partner, registration};

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::{AppState, today};
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/admin/dashboard.html")]
struct AdminDashboardTemplate {
    ctx: PageCtx,
    pending_members: i64,
    upcoming_events: i64,
    new_partner_requests: i64,
    outstanding_feedback: i64,
}

/// GET /admin - What needs the committee's attention right now
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let pending_members = member::pending_member_count(&state.read_pool).await?;
    let upcoming_events = event::upcoming_event_count(&state.read_pool, today()).await?;
    let new_partner_requests = partner::new_partner_request_count(&state.read_pool).await?;
    let outstanding_feedback = registration::outstanding_feedback_count(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = AdminDashboardTemplate {
        ctx,
        pending_members,
        upcoming_events,
        new_partner_requests,
        outstanding_feedback,
    }
    .render()?;

    Ok((jar, Html(html)))
}
