use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::contact::{self, ContactInput};
use serde::Deserialize;

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/contact.html")]
struct ContactTemplate {
    ctx: PageCtx,
}

/// GET /contact - Contact form
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = ContactTemplate { ctx }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct ContactActionInput {
    csrf_token: String,
    name: String,
    email: String,
    subject: String,
    message: String,
}

/// POST /contact - Store the message and notify the inbox
pub async fn action(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<ContactActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/contact")).into_response());
    }

    let message = ContactInput {
        name: input.name,
        email: input.email,
        subject: input.subject,
        message: input.message,
    };

    match contact::record_contact_message(&state.write_pool, message).await {
        Ok(stored) => {
            // Notification is best effort, the message is already stored.
            if let Err(error) = state.email.send_contact_notification(&stored).await {
                tracing::warn!("Failed to send contact notification: {}", error);
            }

            let jar = session::set_flash(
                jar,
                Flash::success("Thanks for reaching out, we will reply by email."),
            );
            Ok((jar, Redirect::to("/contact")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/contact")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
