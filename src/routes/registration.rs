use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::{
    event::{self, Event},
    registration::{self, RegisterOutcome},
};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::{AppState, today};
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/member/register_confirm.html")]
struct RegisterConfirmTemplate {
    ctx: PageCtx,
    event: Event,
}

/// GET /events/{id}/register - Preflight the registration and, when
/// nothing blocks it, render the confirmation step
pub async fn page(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<Response, AppError> {
    let blocker =
        registration::registration_preflight(&state.read_pool, &member.id, &event_id, today())
            .await?;

    if let Some(outcome) = blocker {
        return Ok(blocked_response(jar, outcome, &event_id));
    }

    // The preflight found the event, so a miss here is a race with a
    // concurrent delete; treat it like any other vanished page.
    let Some(event) = event::find_event(&state.read_pool, &event_id).await? else {
        return Err(AppError::NotFound);
    };

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = RegisterConfirmTemplate { ctx, event }.render()?;

    Ok((jar, Html(html)).into_response())
}

#[derive(Deserialize)]
pub struct RegisterActionInput {
    csrf_token: String,
}

/// POST /events/{id}/register - Take the seat inside one write
/// transaction; every outcome maps to a flash and redirect
pub async fn action(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
    Form(input): Form<RegisterActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to(&format!("/events/{event_id}/register"))).into_response());
    }

    let outcome =
        registration::attempt_register(&state.write_pool, &member.id, &event_id, today()).await?;

    if outcome == RegisterOutcome::Registered {
        tracing::info!(member_id = %member.id, event_id = %event_id, "Member registered for event");

        let jar = session::clear_registration_intent(jar);
        let jar = session::set_flash(jar, Flash::success("You're registered! See you there."));
        return Ok((jar, Redirect::to("/my-events")).into_response());
    }

    Ok(blocked_response(jar, outcome, &event_id))
}

/// Shared flash/redirect map for everything that stops a registration.
/// The gate case remembers the event so the feedback flow can finish the
/// journey.
fn blocked_response(jar: CookieJar, outcome: RegisterOutcome, event_id: &str) -> Response {
    match outcome {
        RegisterOutcome::EventNotFound => {
            let jar = session::set_flash(jar, Flash::error("That event no longer exists."));
            (jar, Redirect::to("/events")).into_response()
        }
        RegisterOutcome::EventPast => {
            let jar = session::set_flash(jar, Flash::warning("This event has already taken place."));
            (jar, Redirect::to(&format!("/events/{event_id}"))).into_response()
        }
        RegisterOutcome::EventCancelled => {
            let jar = session::set_flash(
                jar,
                Flash::warning("This event is not open for registration."),
            );
            (jar, Redirect::to(&format!("/events/{event_id}"))).into_response()
        }
        RegisterOutcome::EventFull => {
            let jar = session::set_flash(jar, Flash::warning("Sorry, this event is full."));
            (jar, Redirect::to(&format!("/events/{event_id}"))).into_response()
        }
        RegisterOutcome::AlreadyRegistered => {
            let jar = session::set_flash(
                jar,
                Flash::info("You are already registered for this event."),
            );
            (jar, Redirect::to("/my-events")).into_response()
        }
        RegisterOutcome::GateBlocked => {
            let jar = session::remember_registration_intent(jar, event_id);
            let jar = session::set_flash(
                jar,
                Flash::warning(
                    "Please share feedback on the events you attended before registering for a new one.",
                ),
            );
            (jar, Redirect::to("/feedback/pending")).into_response()
        }
        RegisterOutcome::Registered => {
            // Only blocking outcomes reach this map.
            (jar, Redirect::to("/my-events")).into_response()
        }
    }
}
