use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::member::{self, Member, MembershipStatus, Role};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/admin/members.html")]
struct AdminMembersTemplate {
    ctx: PageCtx,
    members: Vec<Member>,
    status_filter: Option<String>,
}

#[derive(Deserialize)]
pub struct MembersQuery {
    status: Option<String>,
}

/// GET /admin/members - Roster, optionally filtered by membership
/// status; an unknown filter lists everyone
pub async fn page(
    State(state): State<AppState>,
    Query(query): Query<MembersQuery>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let status = query
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<MembershipStatus>().ok());
    let members = member::list_members(&state.read_pool, status).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = AdminMembersTemplate {
        ctx,
        members,
        status_filter: status.map(|status| status.as_ref().to_owned()),
    }
    .render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct ManageActionInput {
    csrf_token: String,
}

/// Executives can see the roster but only admins may change it.
fn admin_guard(jar: CookieJar, actor: &Member) -> Result<CookieJar, Response> {
    if actor.role.0 == Role::Admin {
        return Ok(jar);
    }

    tracing::warn!(member_id = %actor.id, "Non-admin attempted a member management action");
    let jar = session::set_flash(jar, Flash::error("Only admins can manage members."));
    Err((jar, Redirect::to("/admin/members")).into_response())
}

/// POST /admin/members/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ManageActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/members")).into_response());
    }

    let jar = match admin_guard(jar, &actor) {
        Ok(jar) => jar,
        Err(response) => return Ok(response),
    };

    let updated =
        member::set_membership_status(&state.write_pool, &member_id, MembershipStatus::Active)
            .await?;

    let jar = if updated {
        tracing::info!(admin_id = %actor.id, member_id = %member_id, "Member activated");
        session::set_flash(jar, Flash::success("Membership activated."))
    } else {
        session::set_flash(jar, Flash::error("No such member."))
    };

    Ok((jar, Redirect::to("/admin/members")).into_response())
}

/// POST /admin/members/{id}/suspend
pub async fn suspend(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ManageActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/members")).into_response());
    }

    let jar = match admin_guard(jar, &actor) {
        Ok(jar) => jar,
        Err(response) => return Ok(response),
    };

    let updated =
        member::set_membership_status(&state.write_pool, &member_id, MembershipStatus::Suspended)
            .await?;

    let jar = if updated {
        tracing::info!(admin_id = %actor.id, member_id = %member_id, "Member suspended");
        session::set_flash(
            jar,
            Flash::success("Membership suspended. Their session ends on the next request."),
        )
    } else {
        session::set_flash(jar, Flash::error("No such member."))
    };

    Ok((jar, Redirect::to("/admin/members")).into_response())
}

/// POST /admin/members/{id}/promote
pub async fn promote(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ManageActionInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/members")).into_response());
    }

    let jar = match admin_guard(jar, &actor) {
        Ok(jar) => jar,
        Err(response) => return Ok(response),
    };

    let updated = member::set_role(&state.write_pool, &member_id, Role::Executive).await?;

    let jar = if updated {
        tracing::info!(admin_id = %actor.id, member_id = %member_id, "Member promoted to executive");
        session::set_flash(jar, Flash::success("Promoted to executive."))
    } else {
        session::set_flash(jar, Flash::error("No such member."))
    };

    Ok((jar, Redirect::to("/admin/members")).into_response())
}
