use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use campushub_core::project::{self, Project, ProjectInput, ProjectStatus};
use serde::Deserialize;

use crate::auth::AuthMember;
use crate::error::AppError;
use crate::routes::AppState;
use crate::session::{self, Flash, PageCtx};

#[derive(Template)]
#[template(path = "pages/admin/projects.html")]
struct AdminProjectsTemplate {
    ctx: PageCtx,
    projects: Vec<Project>,
}

/// GET /admin/projects - Project list plus the creation form
pub async fn page(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let projects = project::list_projects(&state.read_pool).await?;

    let (jar, ctx) = PageCtx::build(&state, jar, Some(actor)).await?;
    let html = AdminProjectsTemplate { ctx, projects }.render()?;

    Ok((jar, Html(html)))
}

#[derive(Deserialize)]
pub struct CreateProjectInput {
    csrf_token: String,
    title: String,
    summary: String,
    year: String,
}

/// POST /admin/projects - Add a project to the showcase
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<CreateProjectInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/projects")).into_response());
    }

    // A non-numeric year reuses the range message from validation.
    let project = ProjectInput {
        title: input.title,
        summary: input.summary,
        year: input.year.trim().parse::<i64>().unwrap_or(0),
    };

    match project::create_project(&state.write_pool, project).await {
        Ok(project_id) => {
            tracing::info!(admin_id = %actor.id, project_id = %project_id, "Project created");
            let jar = session::set_flash(jar, Flash::success("Project added."));
            Ok((jar, Redirect::to("/admin/projects")).into_response())
        }
        Err(campushub_core::Error::Validate(errors)) => {
            let jar = session::set_flash(
                jar,
                Flash::error(campushub_core::validation_messages(&errors).join(" ")),
            );
            Ok((jar, Redirect::to("/admin/projects")).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

#[derive(Deserialize)]
pub struct ProjectStatusInput {
    csrf_token: String,
    status: String,
}

/// POST /admin/projects/{id}/status - Move a project along its
/// lifecycle
pub async fn set_status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    jar: CookieJar,
    AuthMember(actor): AuthMember,
    Form(input): Form<ProjectStatusInput>,
) -> Result<Response, AppError> {
    let (jar, csrf_ok) = session::verify_csrf(jar, &input.csrf_token);
    if !csrf_ok {
        let jar = session::set_flash(jar, Flash::error("The form expired, please try again."));
        return Ok((jar, Redirect::to("/admin/projects")).into_response());
    }

    let Ok(status) = input.status.parse::<ProjectStatus>() else {
        let jar = session::set_flash(jar, Flash::error("Unknown project status."));
        return Ok((jar, Redirect::to("/admin/projects")).into_response());
    };

    let jar = if project::set_project_status(&state.write_pool, &project_id, status).await? {
        tracing::info!(
            admin_id = %actor.id,
            project_id = %project_id,
            status = %status,
            "Project status changed"
        );
        session::set_flash(jar, Flash::success("Project status updated."))
    } else {
        session::set_flash(jar, Flash::error("No such project."))
    };

    Ok((jar, Redirect::to("/admin/projects")).into_response())
}
