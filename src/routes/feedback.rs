use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::{
    event::{self, Event},
    registration::{self, FeedbackOutcome, MemberRegistration, PendingFeedback},
};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/member/feedback_pending.html")]
struct FeedbackPendingTemplate {
    ctx: PageCtx,
    pending: Vec<PendingFeedback>,
    intent_event: Option<Event>,
}

/// GET /feedback/pending - Everything still blocking the member's next
/// registration; with nothing pending there is nothing to show
pub async fn pending(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<Response, AppError> {
    let pending = registration::pending_feedback_for(&state.read_pool, &member.id).await?;
    if pending.is_empty() {
        return Ok(Redirect::to("/my-events").into_response());
    }

    // The banner reminds them where they were headed when the gate
    // closed.
    let intent_event = match session::registration_intent(&jar) {
        Some(event_id) => event::find_event(&state.read_pool, &event_id).await?,
        None => None,
    };

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = FeedbackPendingTemplate {
        ctx,
        pending,
        intent_event,
    }
    .render()?;

    Ok((jar, Html(html)).into_response())
}

#[derive(Template)]
#[template(path = "pages/member/feedback_form.html")]
struct FeedbackFormTemplate {
    ctx: PageCtx,
    registration: MemberRegistration,
}

/// GET /events/{id}/feedback - Rating and comment form for an attended
/// event
pub async fn page(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<Response, AppError> {
    let registrations =
        registration::registrations_for_member(&state.read_pool, &member.id).await?;
    let Some(target) = registrations
        .into_iter()
        .find(|registration| registration.event_id == event_id)
    else {
        let jar = session::set_flash(jar, Flash::error("You were not registered for this event."));
        return Ok((jar, Redirect::to("/my-events")).into_response());
    };

    if !target.needs_feedback() {
        let jar = session::set_flash(
            jar,
            Flash::info("There is no feedback to give for this event."),
        );
        return Ok((jar, Redirect::to("/my-events")).into_response());
    }

    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = FeedbackFormTemplate {
        ctx,
        registration: target,
    }
    .render()?;

    Ok((jar, Html(html)).into_response())
}

#[derive(Deserialize)]
pub struct FeedbackActionInput {
    csrf_token: String,
    rating: String,
    comment: String,
}

/// POST /events/{id}/feedback - Record the feedback; once the last gap
/// is filled, resume any interrupted registration
pub async fn action(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
    Form(input): Form<FeedbackActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to(&format!("/events/{event_id}/feedback"))).into_response());
    }

    // A non-numeric rating falls through to the same outcome as an
    // out-of-range one.
    let rating = input.rating.parse::<i64>().unwrap_or(0);

    let outcome =
        registration::submit_feedback(&state.write_pool, &member.id, &event_id, rating, &input.comment)
            .await?;

    match outcome {
        FeedbackOutcome::Submitted => {
            tracing::info!(member_id = %member.id, event_id = %event_id, "Feedback submitted");

            // With the gate open again, pick up the registration the
            // member originally came for. The intent survives until that
            // registration succeeds.
            if let Some(intent) = session::registration_intent(&jar) {
                let still_pending =
                    registration::pending_feedback_count(&state.read_pool, &member.id).await?;
                if still_pending == 0 {
                    let jar = session::set_flash(
                        jar,
                        Flash::success("Thanks for the feedback! Now, about that event..."),
                    );
                    return Ok(
                        (jar, Redirect::to(&format!("/events/{intent}/register"))).into_response()
                    );
                }
            }

            let jar = session::set_flash(jar, Flash::success("Thanks for the feedback!"));
            Ok((jar, Redirect::to("/my-events")).into_response())
        }
        FeedbackOutcome::NotRegistered => {
            let jar =
                session::set_flash(jar, Flash::error("You were not registered for this event."));
            Ok((jar, Redirect::to("/my-events")).into_response())
        }
        FeedbackOutcome::NotAttended => {
            let jar = session::set_flash(
                jar,
                Flash::error("Feedback is only open for events you attended."),
            );
            Ok((jar, Redirect::to("/my-events")).into_response())
        }
        FeedbackOutcome::AlreadySubmitted => {
            let jar = session::set_flash(
                jar,
                Flash::info("You already shared feedback for this event."),
            );
            Ok((jar, Redirect::to("/my-events")).into_response())
        }
        FeedbackOutcome::InvalidRating => {
            let jar = session::set_flash(jar, Flash::error("Pick a rating from 1 to 5."));
            Ok((jar, Redirect::to(&format!("/events/{event_id}/feedback"))).into_response())
        }
        FeedbackOutcome::CommentTooShort => {
            let jar = session::set_flash(
                jar,
                Flash::error("Tell us a bit more, comments need at least 10 characters."),
            );
            Ok((jar, Redirect::to(&format!("/events/{event_id}/feedback"))).into_response())
        }
    }
}
