use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::member::{self, SignupInput, SignupOutcome};
use serde::Deserialize;

use crate::auth::MaybeMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/register.html")]
struct RegisterTemplate {
    ctx: PageCtx,
}

/// GET /register - Membership signup form
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<Response, AppError> {
    if member.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let (jar, ctx) = PageCtx::build(&state, jar, None).await?;
    let html = RegisterTemplate { ctx }.render()?;

    Ok((jar, Html(html)).into_response())
}

#[derive(Deserialize)]
pub struct RegisterActionInput {
    csrf_token: String,
    full_name: String,
    matric_no: String,
    email: String,
    password: String,
}

/// POST /register - Create a pending member account
pub async fn action(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<RegisterActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/register")).into_response());
    }

    let signup = SignupInput {
        full_name: input.full_name,
        matric_no: input.matric_no,
        email: input.email,
        password: input.password,
    };

    match member::signup(&state.write_pool, signup).await {
        Ok(SignupOutcome::Created { member_id }) => {
            tracing::info!(member_id = %member_id, "New member signed up");
            let jar = session::set_flash(
                jar,
                Flash::success(
                    "Welcome aboard! Sign in once the committee has activated your membership.",
                ),
            );
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Ok(SignupOutcome::EmailTaken) => {
            let jar = session::set_flash(
                jar,
                Flash::error("An account with this email already exists."),
            );
            Ok((jar, Redirect::to("/register")).into_response())
        }
        Ok(SignupOutcome::MatricTaken) => {
            let jar = session::set_flash(
                jar,
                Flash::error("An account with this matric number already exists."),
            );
            Ok((jar, Redirect::to("/register")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/register")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
