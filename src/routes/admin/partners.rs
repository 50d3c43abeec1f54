use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::partner::{self, Partner, PartnerRequest, ReviewOutcome};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/admin/partners.html")]
struct AdminPartnersTemplate {
    ctx: PageCtx,
    requests: Vec<PartnerRequest>,
    partners: Vec<Partner>,
}

/// GET /admin/partners - Review queue plus the current partner list
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let requests = partner::list_partner_requests(&state.read_pool).await?;
    let partners = partner::list_partners(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = AdminPartnersTemplate {
        ctx,
        requests,
        partners,
    }
    .render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct ReviewActionInput {
    csrf_token: String,
}

/// POST /admin/partners/requests/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ReviewActionInput>,
) -> Result<Response, AppError> {
    review(state, request_id, jar, actor.id, input, true).await
}

/// POST /admin/partners/requests/{id}/decline
pub async fn decline(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ReviewActionInput>,
) -> Result<Response, AppError> {
    review(state, request_id, jar, actor.id, input, false).await
}

async fn review(
    state: AppState,
    request_id: String,
    jar: CookieJar,
    actor_id: String,
    input: ReviewActionInput,
    approve: bool,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/partners")).into_response());
    }

    let outcome = partner::review_partner_request(&state.write_pool, &request_id, approve).await?;

    let jar = match outcome {
        ReviewOutcome::Approved { partner_id } => {
            tracing::info!(
                admin_id = %actor_id,
                request_id = %request_id,
                partner_id = %partner_id,
                "Partner request approved"
            );
            session::set_flash(
                jar,
                Flash::success("Request approved, the partner is now listed."),
            )
        }
        ReviewOutcome::Declined => {
            tracing::info!(admin_id = %actor_id, request_id = %request_id, "Partner request declined");
            session::set_flash(jar, Flash::success("Request declined."))
        }
        ReviewOutcome::AlreadyReviewed => {
            session::set_flash(jar, Flash::info("This request was already reviewed."))
        }
        ReviewOutcome::NotFound => session::set_flash(jar, Flash::error("No such request.")),
    };

    Ok((jar, Redirect::to("/admin/partners")).into_response())
}
