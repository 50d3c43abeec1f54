use askama::Template;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use sqlx::SqlitePool;

use crate::auth::MaybeMember;
use crate::email::EmailService;
use crate::error::AppError;
use crate::middleware::{auth_middleware, back_office_middleware};
use crate::session::PageCtx;

mod about;
mod admin;
mod assets;
mod contact;
mod dashboard;
mod events;
mod feedback;
mod health;
mod home;
mod login;
mod my_events;
mod partners;
mod profile;
mod projects;
mod register;
mod registration;

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub read_pool: SqlitePool,
    pub write_pool: SqlitePool,
    pub email: EmailService,
}

/// Wall-clock date used for every "is this event in the past" decision
/// in the web layer. The domain layer takes it as an argument.
pub(crate) fn today() -> time::Date {
    time::OffsetDateTime::now_utc().date()
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
struct NotFoundTemplate {
    ctx: PageCtx,
}

pub async fn fallback(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeMember(member): MaybeMember,
) -> Result<impl IntoResponse, AppError> {
    let (jar, ctx) = PageCtx::build(&state, jar, member).await?;
    let html = NotFoundTemplate { ctx }.render()?;

    Ok((StatusCode::NOT_FOUND, jar, Html(html)))
}

pub fn router(app_state: AppState) -> Router {
    let member_routes = Router::new()
        .route("/dashboard", get(dashboard::page))
        .route("/my-events", get(my_events::page))
        .route("/feedback/pending", get(feedback::pending))
        .route(
            "/events/{id}/register",
            get(registration::page).post(registration::action),
        )
        .route(
            "/events/{id}/feedback",
            get(feedback::page).post(feedback::action),
        )
        .route("/profile", get(profile::page).post(profile::action))
        .route("/profile/password", post(profile::password_action))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard::page))
        .route("/admin/members", get(admin::members::page))
        .route("/admin/members/{id}/activate", post(admin::members::activate))
        .route("/admin/members/{id}/suspend", post(admin::members::suspend))
        .route("/admin/members/{id}/promote", post(admin::members::promote))
        .route("/admin/events", get(admin::events::page))
        .route(
            "/admin/events/new",
            get(admin::events::new_page).post(admin::events::new_action),
        )
        .route(
            "/admin/events/{id}/edit",
            get(admin::events::edit_page).post(admin::events::edit_action),
        )
        .route("/admin/events/{id}/cancel", post(admin::events::cancel))
        .route("/admin/events/{id}/complete", post(admin::events::complete))
        .route(
            "/admin/events/{id}/attendance",
            get(admin::events::attendance_page).post(admin::events::attendance_action),
        )
        .route("/admin/partners", get(admin::partners::page))
        .route(
            "/admin/partners/requests/{id}/approve",
            post(admin::partners::approve),
        )
        .route(
            "/admin/partners/requests/{id}/decline",
            post(admin::partners::decline),
        )
        .route(
            "/admin/projects",
            get(admin::projects::page).post(admin::projects::create),
        )
        .route(
            "/admin/projects/{id}/status",
            post(admin::projects::set_status),
        )
        // `route_layer` wraps inside-out: auth must be added last so it
        // runs before the role check.
        .route_layer(middleware::from_fn(back_office_middleware))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    Router::new()
        // Health check endpoints (no auth required)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/", get(home::page))
        .route("/about", get(about::page))
        .route("/events", get(events::index))
        .route("/events/{id}", get(events::detail))
        .route("/projects", get(projects::page))
        .route("/partners", get(partners::page))
        .route(
            "/partners/request",
            get(partners::request_page).post(partners::request_action),
        )
        .route("/contact", get(contact::page).post(contact::action))
        .route("/register", get(register::page).post(register::action))
        .route("/login", get(login::page).post(login::action))
        .route("/logout", post(login::logout))
        .merge(member_routes)
        .merge(admin_routes)
        .fallback(fallback)
        .nest_service("/static", assets::AssetsService::new())
        .with_state(app_state)
}
