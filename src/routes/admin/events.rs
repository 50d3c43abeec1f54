use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::{
    event::{self, Event, EventInput},
    registration::{self, AttendanceStatus, RosterEntry},
};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/admin/events.html")]
struct AdminEventsTemplate {
    ctx: PageCtx,
    events: Vec<Event>,
}

/// GET /admin/events - Full catalogue, newest first
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let events = event::list_events(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = AdminEventsTemplate { ctx, events }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Template)]
#[template(path = "pages/admin/event_form.html")]
struct EventFormTemplate {
    ctx: PageCtx,
    event: Option<Event>,
    action: String,
}

/// GET /admin/events/new - Blank event form
pub async fn new_page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = EventFormTemplate {
        ctx,
        event: None,
        action: "/admin/events/new".to_owned(),
    }
    .render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct EventActionInput {
    csrf_token: String,
    name: String,
    event_type: String,
    description: String,
    event_date: String,
    start_time: String,
    location: String,
    capacity: String,
}

impl EventActionInput {
    /// An empty capacity field means unlimited seats; anything else must
    /// be a whole number.
    fn parsed_capacity(&self) -> Result<Option<i64>, ()> {
        let raw = self.capacity.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        raw.parse::<i64>().map(Some).map_err(|_| ())
    }

    fn into_event_input(self, capacity: Option<i64>) -> EventInput {
        EventInput {
            name: self.name,
            event_type: self.event_type,
            description: self.description,
            event_date: self.event_date,
            start_time: self.start_time,
            location: self.location,
            capacity,
        }
    }
}

/// POST /admin/events/new - Create a scheduled event
pub async fn new_action(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<EventActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/events/new")).into_response());
    }

    let Ok(capacity) = input.parsed_capacity() else {
        let jar = session::set_flash(jar, Flash::error("Capacity must be a whole number."));
        return Ok((jar, Redirect::to("/admin/events/new")).into_response());
    };

    match event::create_event(&state.write_pool, input.into_event_input(capacity)).await {
        Ok(event_id) => {
            tracing::info!(admin_id = %actor.id, event_id = %event_id, "Event created");
            let jar = session::set_flash(jar, Flash::success("Event created."));
            Ok((jar, Redirect::to("/admin/events")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/admin/events/new")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

/// GET /admin/events/{id}/edit - Event form prefilled for editing
pub async fn edit_page(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let Some(event) = event::find_event(&state.read_pool, &event_id).await? else {
        return Err(AppError::NotFound);
    };

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = EventFormTemplate {
        ctx,
        action: format!("/admin/events/{}/edit", event.id),
        event: Some(event),
    }
    .render()?;

    Ok((jar, Html(html)))
}

/// POST /admin/events/{id}/edit - Apply changes to an existing event
pub async fn edit_action(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<EventActionInput>,
) -> Result<Response, AppError> {
    let form_url = format!("/admin/events/{event_id}/edit");

    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to(&form_url)).into_response());
    }

    let Ok(capacity) = input.parsed_capacity() else {
        let jar = session::set_flash(jar, Flash::error("Capacity must be a whole number."));
        return Ok((jar, Redirect::to(&form_url)).into_response());
    };

    match event::update_event(&state.write_pool, &event_id, input.into_event_input(capacity)).await
    {
        Ok(true) => {
            tracing::info!(admin_id = %actor.id, event_id = %event_id, "Event updated");
            let jar = session::set_flash(jar, Flash::success("Event updated."));
            Ok((jar, Redirect::to("/admin/events")).into_response())
        }
        Ok(false) => {
            let jar = session::set_flash(jar, Flash::error("No such event."));
            Ok((jar, Redirect::to("/admin/events")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to(&form_url)).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

#[derive(Deserialize)]
pub struct StatusActionInput {
    csrf_token: String,
}

/// POST /admin/events/{id}/cancel - Cancel a scheduled event
pub async fn cancel(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<StatusActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/events")).into_response());
    }

    let jar = if event::cancel_event(&state.write_pool, &event_id).await? {
        tracing::info!(admin_id = %actor.id, event_id = %event_id, "Event cancelled");
        session::set_flash(jar, Flash::success("Event cancelled."))
    } else {
        session::set_flash(jar, Flash::warning("Only scheduled events can be cancelled."))
    };

    Ok((jar, Redirect::to("/admin/events")).into_response())
}

/// POST /admin/events/{id}/complete - Close out an event after it ran
pub async fn complete(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<StatusActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/events")).into_response());
    }

    let jar = if event::complete_event(&state.write_pool, &event_id).await? {
        tracing::info!(admin_id = %actor.id, event_id = %event_id, "Event completed");
        session::set_flash(jar, Flash::success("Event marked as completed."))
    } else {
        session::set_flash(jar, Flash::warning("Only scheduled events can be completed."))
    };

    Ok((jar, Redirect::to("/admin/events")).into_response())
}

#[derive(Template)]
#[template(path = "pages/admin/attendance.html")]
struct AttendanceTemplate {
    ctx: PageCtx,
    event: Event,
    roster: Vec<RosterEntry>,
}

/// GET /admin/events/{id}/attendance - Roster with per-registration
/// attendance marks
pub async fn attendance_page(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let Some(event) = event::find_event(&state.read_pool, &event_id).await? else {
        return Err(AppError::NotFound);
    };
    let roster = registration::event_roster(&state.read_pool, &event_id).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = AttendanceTemplate { ctx, event, roster }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct AttendanceActionInput {
    csrf_token: String,
    registration_id: String,
    mark: String,
}

/// POST /admin/events/{id}/attendance - Mark one registration attended
/// or absent
pub async fn attendance_action(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<AttendanceActionInput>,
) -> Result<Response, AppError> {
    let roster_url = format!("/admin/events/{event_id}/attendance");

    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to(&roster_url)).into_response());
    }

    let mark = input.mark.parse::<AttendanceStatus>().ok();
    let Some(mark @ (AttendanceStatus::Attended | AttendanceStatus::Absent)) = mark else {
        let jar = session::set_flash(jar, Flash::error("Mark a member attended or absent."));
        return Ok((jar, Redirect::to(&roster_url)).into_response());
    };

    let jar = if registration::set_attendance(&state.write_pool, &input.registration_id, mark)
        .await?
    {
        tracing::info!(
            admin_id = %actor.id,
            registration_id = %input.registration_id,
            mark = %mark,
            "Attendance marked"
        );
        session::set_flash(jar, Flash::success("Attendance saved."))
    } else {
        session::set_flash(jar, Flash::error("No such registration."))
    };

    Ok((jar, Redirect::to(&roster_url)).into_response())
}
