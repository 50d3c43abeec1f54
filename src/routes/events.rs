use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
};
use axum_extra::extract::CookieJar;
use campushub_core::{
    event::{self, Event},
    iso_date, registration,
};

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::{AppState, today};
use crate::session::PageCtx;

#[derive(Template)]
#[template(path = "pages/events.html")]
struct EventsTemplate {
    ctx: PageCtx,
    upcoming: Vec<Event>,
    recent_past: Vec<Event>,
}

/// GET /events - Upcoming events plus a short archive of recent ones
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let upcoming = event::upcoming_events(&state.read_pool, today()).await?;
    let recent_past = event::recent_past_events(&state.read_pool, today(), 5).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = EventsTemplate {
        ctx,
        upcoming,
        recent_past,
    }
    .render()?;

    Ok((jar, Html(html)))
}

#[derive(Template)]
#[template(path = "pages/event_detail.html")]
struct EventDetailTemplate {
    ctx: PageCtx,
    event: Event,
    seats_left: Option<i64>,
    registration_open: bool,
}

/// GET /events/{id} - Event detail with remaining seats and, while the
/// event is open, the register link
pub async fn detail(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let Some(event) = event::find_event(&state.read_pool, &event_id).await? else {
        return Err(AppError::NotFound);
    };

    let taken = registration::active_registration_count(&state.read_pool, &event.id).await?;
    let seats_left = event.capacity.map(|capacity| (capacity - taken).max(0));

    let today_iso = iso_date(today())?;
    let registration_open = event.is_scheduled()
        && event.event_date.as_str() >= today_iso.as_str()
        && seats_left.is_none_or(|left| left > 0);

    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = EventDetailTemplate {
        ctx,
        event,
        seats_left,
        registration_open,
    }
    .render()?;

    Ok((jar, Html(html)))
}
