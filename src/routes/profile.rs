use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::member::{self, ChangePasswordInput, PasswordOutcome, UpdateProfileInput};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/member/profile.html")]
struct ProfileTemplate {
    ctx: PageCtx,
}

/// GET /profile - Account details and the password form
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, Some(member)).await?;
    let html = ProfileTemplate { ctx }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct ProfileActionInput {
    csrf_token: String,
    full_name: String,
}

/// POST /profile - Update the display name
pub async fn action(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
    Form(input): Form<ProfileActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/profile")).into_response());
    }

    let update = UpdateProfileInput {
        full_name: input.full_name,
    };

    match member::update_profile(&state.write_pool, &member.id, update).await {
        Ok(()) => {
            let jar = session::set_flash(jar, Flash::success("Profile updated."));
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

#[derive(Deserialize)]
pub struct PasswordActionInput {
    csrf_token: String,
    current_password: String,
    new_password: String,
}

/// POST /profile/password - Change the password after re-checking the
/// current one
pub async fn password_action(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(member): AuthMember,
    Form(input): Form<PasswordActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/profile")).into_response());
    }

    let change = ChangePasswordInput {
        current_password: input.current_password,
        new_password: input.new_password,
    };

    match member::change_password(&state.write_pool, &member.id, change).await {
        Ok(PasswordOutcome::Changed) => {
            tracing::info!(member_id = %member.id, "Password changed");
            let jar = session::set_flash(jar, Flash::success("Password changed."));
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Ok(PasswordOutcome::WrongCurrent) => {
            let jar = session::set_flash(jar, Flash::error("Current password is incorrect."));
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
