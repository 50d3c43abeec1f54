//! Signup, login and session lifecycle through the full router.

mod helpers;

use axum::http::StatusCode;
use campushub_core::member::{self, MembershipStatus};
use helpers::*;

#[tokio::test]
async fn signup_creates_a_pending_member() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app
        .post_with_csrf(
            "",
            "/register",
            "/register",
            &[
                ("full_name", "Priya Raman"),
                ("matric_no", "U2104317B"),
                ("email", "priya@example.edu"),
                ("password", "my_password"),
            ],
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    let flash = flash_cookie(&response).expect("signup should flash");
    assert!(flash.starts_with("success:"), "unexpected flash: {flash}");

    let status = sqlx::query_scalar::<_, String>(
        "SELECT membership_status FROM members WHERE email = 'priya@example.edu'",
    )
    .fetch_one(&app.pool)
    .await?;
    assert_eq!(status, "pending");

    Ok(())
}

#[tokio::test]
async fn signup_rejects_a_taken_email() -> anyhow::Result<()> {
    let app = setup_app().await?;
    create_active_member(&app, "dana").await?;

    let response = app
        .post_with_csrf(
            "",
            "/register",
            "/register",
            &[
                ("full_name", "Another Dana"),
                ("matric_no", "U9999999Z"),
                ("email", "dana@campushub.localhost"),
                ("password", "my_password"),
            ],
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/register"));
    assert_eq!(
        flash_cookie(&response).as_deref(),
        Some("error:An account with this email already exists.")
    );

    Ok(())
}

#[tokio::test]
async fn signup_flashes_the_field_errors() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app
        .post_with_csrf(
            "",
            "/register",
            "/register",
            &[
                ("full_name", "Priya Raman"),
                ("matric_no", "not-a-matric"),
                ("email", "priya@example.edu"),
                ("password", "my_password"),
            ],
        )
        .await?;

    assert_eq!(location(&response).as_deref(), Some("/register"));
    let flash = flash_cookie(&response).expect("validation should flash");
    assert!(flash.contains("Matric number"), "unexpected flash: {flash}");

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn login_sets_the_session_cookie() -> anyhow::Result<()> {
    let app = setup_app().await?;
    create_active_member(&app, "dana").await?;

    let response = app
        .post_with_csrf(
            "",
            "/login",
            "/login",
            &[
                ("email", "dana@campushub.localhost"),
                ("password", TEST_PASSWORD),
            ],
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));

    let token = set_cookie_value(&response, "auth_token").expect("login should set the cookie");
    assert!(!token.is_empty());

    let flash = flash_cookie(&response).expect("login should greet");
    assert!(flash.starts_with("success:Welcome back"), "unexpected flash: {flash}");

    Ok(())
}

#[tokio::test]
async fn login_rejects_a_wrong_password() -> anyhow::Result<()> {
    let app = setup_app().await?;
    create_active_member(&app, "dana").await?;

    let response = app
        .post_with_csrf(
            "",
            "/login",
            "/login",
            &[
                ("email", "dana@campushub.localhost"),
                ("password", "not-the-password"),
            ],
        )
        .await?;

    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(
        flash_cookie(&response).as_deref(),
        Some("error:Invalid email or password.")
    );
    assert_eq!(set_cookie_value(&response, "auth_token"), None);

    Ok(())
}

#[tokio::test]
async fn suspended_member_cannot_sign_in() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let member_id = create_active_member(&app, "dana").await?;
    member::set_membership_status(&app.pool, &member_id, MembershipStatus::Suspended).await?;

    let response = app
        .post_with_csrf(
            "",
            "/login",
            "/login",
            &[
                ("email", "dana@campushub.localhost"),
                ("password", TEST_PASSWORD),
            ],
        )
        .await?;

    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(
        flash_cookie(&response).as_deref(),
        Some("error:This account is suspended. Contact the committee for help.")
    );
    assert_eq!(set_cookie_value(&response, "auth_token"), None);

    Ok(())
}

#[tokio::test]
async fn dashboard_requires_a_session() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/dashboard", "").await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    Ok(())
}

#[tokio::test]
async fn a_garbage_token_is_treated_as_signed_out() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/dashboard", "auth_token=not.a.jwt").await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    Ok(())
}

#[tokio::test]
async fn suspension_ends_the_session_on_the_next_request() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let member_id = create_active_member(&app, "dana").await?;
    let auth = auth_cookie(&app, &member_id)?;

    let response = app.get("/dashboard", &auth).await?;
    assert_eq!(response.status(), StatusCode::OK);

    member::set_membership_status(&app.pool, &member_id, MembershipStatus::Suspended).await?;

    let response = app.get("/dashboard", &auth).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    Ok(())
}

#[tokio::test]
async fn signed_in_member_skips_the_auth_forms() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let member_id = create_active_member(&app, "dana").await?;
    let auth = auth_cookie(&app, &member_id)?;

    let response = app.get("/login", &auth).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));

    let response = app.get("/register", &auth).await?;
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));

    Ok(())
}

#[tokio::test]
async fn logout_clears_the_session_cookie() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let member_id = create_active_member(&app, "dana").await?;
    let auth = auth_cookie(&app, &member_id)?;

    let response = app.post_with_csrf(&auth, "/dashboard", "/logout", &[]).await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
    // The cookie comes back emptied.
    assert_eq!(set_cookie_value(&response, "auth_token").as_deref(), Some(""));
    assert_eq!(
        flash_cookie(&response).as_deref(),
        Some("info:You have been signed out.")
    );

    Ok(())
}
