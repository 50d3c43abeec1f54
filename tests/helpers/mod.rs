#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use campushub::config::{
    AdminConfig, Config, DatabaseConfig, EmailConfig, JwtConfig, ObservabilityConfig, ServerConfig,
};
use campushub::email::EmailService;
use campushub_core::member::{self, MembershipStatus, Role, SignupInput, SignupOutcome};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        },
        database: DatabaseConfig {
            url: ":memory:".to_owned(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-minimum-32-characters!".to_owned(),
            expiration_days: 7,
            issuer: "campushub".to_owned(),
            audience: "campushub".to_owned(),
        },
        email: EmailConfig::default(),
        observability: ObservabilityConfig::default(),
        admin: AdminConfig::default(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub config: Config,
}

/// Full router over a fresh in-memory database. The single pool stands
/// in for both the read and the write side.
pub async fn setup_app() -> anyhow::Result<TestApp> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    campushub_core::MIGRATOR.run(&pool).await?;

    let config = test_config();
    let email = EmailService::new_mock(&config.email);
    let router = campushub::create_app(config.clone(), pool.clone(), pool.clone(), email);

    Ok(TestApp {
        router,
        pool,
        config,
    })
}

impl TestApp {
    pub async fn get(&self, path: &str, cookies: &str) -> anyhow::Result<Response<Body>> {
        let mut request = Request::builder().uri(path);
        if !cookies.is_empty() {
            request = request.header(header::COOKIE, cookies);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::empty())?)
            .await?;

        Ok(response)
    }

    pub async fn post_form(
        &self,
        path: &str,
        cookies: &str,
        form: &[(&str, &str)],
    ) -> anyhow::Result<Response<Body>> {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            request = request.header(header::COOKIE, cookies);
        }

        let body = serde_urlencoded::to_string(form)?;
        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body))?)
            .await?;

        Ok(response)
    }

    /// One browser round trip: render `from` to pick up a fresh form
    /// token, then submit `form` to `to` with the token attached.
    pub async fn post_with_csrf(
        &self,
        auth: &str,
        from: &str,
        to: &str,
        form: &[(&str, &str)],
    ) -> anyhow::Result<Response<Body>> {
        let page = self.get(from, auth).await?;
        let token = set_cookie_value(&page, "csrf_token")
            .ok_or_else(|| anyhow::anyhow!("{from} did not issue a form token"))?;

        let cookies = if auth.is_empty() {
            format!("csrf_token={token}")
        } else {
            format!("{auth}; csrf_token={token}")
        };

        let mut fields = vec![("csrf_token", token.as_str())];
        fields.extend_from_slice(form);

        self.post_form(to, &cookies, &fields).await
    }
}

/// Every cookie pair a response sets, stripped of attributes.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::to_owned)
        .collect()
}

/// The value a response set for one cookie. A removal shows up as
/// `Some("")`.
pub fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find_map(|pair| pair.strip_prefix(&prefix).map(str::to_owned))
}

/// Decoded `kind:message` flash banner carried by a redirect, if any.
pub fn flash_cookie(response: &Response<Body>) -> Option<String> {
    let raw = set_cookie_value(response, "flash")?;
    if raw.is_empty() {
        return None;
    }

    Some(urlencoding::decode(&raw).ok()?.into_owned())
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

pub async fn body_string(response: Response<Body>) -> anyhow::Result<String> {
    let bytes = response.into_body().collect().await?.to_bytes();

    Ok(String::from_utf8(bytes.to_vec())?)
}

/// The web layer reads the real clock, so fixture dates are computed
/// relative to it.
pub fn date_offset(days: i64) -> String {
    let date = time::OffsetDateTime::now_utc().date() + time::Duration::days(days);
    campushub_core::iso_date(date).expect("offset date formats as ISO")
}

fn matric_for(name: &str) -> String {
    let digits = name.bytes().map(u32::from).sum::<u32>() % 10_000_000;
    format!("U{digits:07}A")
}

pub const TEST_PASSWORD: &str = "my_password";

/// Sign a member up and activate them, the way an admin would.
pub async fn create_active_member(app: &TestApp, name: &str) -> anyhow::Result<String> {
    let outcome = member::signup(
        &app.pool,
        SignupInput {
            full_name: format!("{name} Tan"),
            matric_no: matric_for(name),
            email: format!("{name}@campushub.localhost"),
            password: TEST_PASSWORD.to_owned(),
        },
    )
    .await?;

    let SignupOutcome::Created { member_id } = outcome else {
        anyhow::bail!("member {name} was not created: {outcome:?}");
    };

    member::set_membership_status(&app.pool, &member_id, MembershipStatus::Active).await?;

    Ok(member_id)
}

pub async fn create_admin(app: &TestApp, name: &str) -> anyhow::Result<String> {
    let member_id = create_active_member(app, name).await?;
    member::set_role(&app.pool, &member_id, Role::Admin).await?;

    Ok(member_id)
}

pub async fn create_executive(app: &TestApp, name: &str) -> anyhow::Result<String> {
    let member_id = create_active_member(app, name).await?;
    member::set_role(&app.pool, &member_id, Role::Executive).await?;

    Ok(member_id)
}

/// Session cookie pair for a signed-in member, minted directly so tests
/// do not have to walk the login form each time.
pub fn auth_cookie(app: &TestApp, member_id: &str) -> anyhow::Result<String> {
    let cookie = campushub::auth::build_cookie(app.config.jwt.clone(), member_id.to_owned())?;

    Ok(format!("{}={}", cookie.name(), cookie.value()))
}

pub async fn create_event_on(
    app: &TestApp,
    name: &str,
    event_date: &str,
    capacity: Option<i64>,
) -> anyhow::Result<String> {
    let event_id = campushub_core::event::create_event(
        &app.pool,
        campushub_core::event::EventInput {
            name: name.to_owned(),
            event_type: "workshop".to_owned(),
            description: String::new(),
            event_date: event_date.to_owned(),
            start_time: "18:00".to_owned(),
            location: "LT19".to_owned(),
            capacity,
        },
    )
    .await?;

    Ok(event_id)
}

/// Back-dated registration marked attended, arming the feedback gate
/// for `member_id`.
pub async fn attend_past_event(
    app: &TestApp,
    member_id: &str,
    name: &str,
) -> anyhow::Result<String> {
    let event_id = create_event_on(app, name, &date_offset(-7), None).await?;

    let registered_on = time::OffsetDateTime::now_utc().date() - time::Duration::days(10);
    let outcome = campushub_core::registration::attempt_register(
        &app.pool,
        member_id,
        &event_id,
        registered_on,
    )
    .await?;
    anyhow::ensure!(
        outcome == campushub_core::registration::RegisterOutcome::Registered,
        "setup registration failed: {outcome:?}"
    );

    let registration_id = sqlx::query_scalar::<_, String>(
        "SELECT id FROM registrations WHERE member_id = ? AND event_id = ?",
    )
    .bind(member_id)
    .bind(&event_id)
    .fetch_one(&app.pool)
    .await?;
    campushub_core::registration::set_attendance(
        &app.pool,
        &registration_id,
        campushub_core::registration::AttendanceStatus::Attended,
    )
    .await?;

    Ok(event_id)
}
