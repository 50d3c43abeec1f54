use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::member::{self, LoginOutcome};
use serde::Deserialize;

use crate::auth::{self, MaybeMember};
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginTemplate {
    ctx: PageCtx,
}

/// GET /login - Sign-in form
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<Response, AppError> {
    if member.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let (jar, ctx) = PageCtx::build(&state, jar, None).await?;
    let html = LoginTemplate { ctx }.render()?;

    Ok((jar, Html(html)).into_response())
}

#[derive(Deserialize)]
pub struct LoginActionInput {
    csrf_token: String,
    email: String,
    password: String,
}

/// POST /login - Verify credentials and set the auth cookie
pub async fn action(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/login")).into_response());
    }

    match member::authenticate(&state.read_pool, &input.email, &input.password).await? {
        LoginOutcome::LoggedIn(member) => {
            let cookie = auth::build_cookie(state.config.jwt.clone(), member.id.clone())
                .map_err(|error| AppError::InternalError(error.to_string()))?;
            tracing::info!(member_id = %member.id, "Member logged in");

            let jar = jar.add(cookie);
            let jar = session::set_flash(
                jar,
                Flash::success(format!("Welcome back, {}!", member.full_name)),
            );
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        LoginOutcome::InvalidCredentials => {
            let jar = session::set_flash(jar, Flash::error("Invalid email or password."));
            Ok((jar, Redirect::to("/login")).into_response())
        }
        LoginOutcome::Suspended => {
            let jar = session::set_flash(
                jar,
                Flash::error("This account is suspended. Contact the committee for help."),
            );
            Ok((jar, Redirect::to("/login")).into_response())
        }
    }
}

/// POST /logout - Clear the auth cookie
pub async fn logout(jar: CookieJar, Form(input): Form<LogoutInput>) -> Response {
    let (jar, _csrf_ok) = session::verify_csrf(jar, &input.csrf_token);

    // Dropping the cookie is harmless even when the token check fails;
    // the member can always sign back in.
    let jar = jar.remove(auth::removal_cookie());
    let jar = session::set_flash(jar, Flash::info("You have been signed out."));
    (jar, Redirect::to("/")).into_response()
}

#[derive(Deserialize)]
pub struct LogoutInput {
    csrf_token: String,
}
