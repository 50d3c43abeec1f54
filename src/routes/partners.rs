use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::partner::{self, Partner, PartnerRequestInput};
use serde::Deserialize;

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/partners.html")]
struct PartnersTemplate {
    ctx: PageCtx,
    partners: Vec<Partner>,
}

/// GET /partners - Current partner organisations
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let partners = partner::list_partners(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = PartnersTemplate { ctx, partners }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Template)]
#[template(path = "pages/partner_request.html")]
struct PartnerRequestTemplate {
    ctx: PageCtx,
}

/// GET /partners/request - Partnership request form for organisations
pub async fn request_page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = PartnerRequestTemplate { ctx }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct RequestActionInput {
    csrf_token: String,
    org_name: String,
    contact_name: String,
    email: String,
    message: String,
}

/// POST /partners/request - Store the request and notify the inbox
pub async fn request_action(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<RequestActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/partners/request")).into_response());
    }

    let request = PartnerRequestInput {
        org_name: input.org_name,
        contact_name: input.contact_name,
        email: input.email,
        message: input.message,
    };

    match partner::submit_partner_request(&state.write_pool, request).await {
        Ok(stored) => {
            // Notification is best effort, the request is already stored.
            if let Err(error) = state.email.send_partner_request_notification(&stored).await {
                tracing::warn!("Failed to send partner request notification: {}", error);
            }

            let jar = session::set_flash(
                jar,
                Flash::success("Thanks! We received your request and will be in touch soon."),
            );
            Ok((jar, Redirect::to("/partners")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/partners/request")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
