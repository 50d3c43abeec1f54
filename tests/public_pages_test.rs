//! Probes, anonymous pages, embedded assets and the 404 fallback.

mod helpers;

use axum::http::{StatusCode, header};
use helpers::*;

#[tokio::test]
async fn the_probes_answer() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/health", "").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;
    assert!(body.contains("\"ok\""));

    let response = app.get("/ready", "").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;
    assert!(body.contains("\"ready\""));

    Ok(())
}

#[tokio::test]
async fn public_pages_render_for_anonymous_visitors() -> anyhow::Result<()> {
    let app = setup_app().await?;

    for path in [
        "/",
        "/about",
        "/events",
        "/projects",
        "/partners",
        "/partners/request",
        "/contact",
        "/register",
        "/login",
    ] {
        let response = app.get(path, "").await?;
        assert_eq!(response.status(), StatusCode::OK, "{path} did not render");
    }

    Ok(())
}

#[tokio::test]
async fn the_home_page_previews_upcoming_events() -> anyhow::Result<()> {
    let app = setup_app().await?;
    create_event_on(&app, "Intro Night", &date_offset(3), None).await?;
    create_event_on(&app, "Last Semester Mixer", &date_offset(-3), None).await?;

    let response = app.get("/", "").await?;
    let body = body_string(response).await?;

    assert!(body.contains("Intro Night"));
    assert!(!body.contains("Last Semester Mixer"));

    Ok(())
}

#[tokio::test]
async fn the_event_detail_page_counts_seats() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let event_id = create_event_on(&app, "Tiny Workshop", &date_offset(3), Some(12)).await?;

    let member_id = create_active_member(&app, "dana").await?;
    let today = time::OffsetDateTime::now_utc().date();
    campushub_core::registration::attempt_register(&app.pool, &member_id, &event_id, today)
        .await?;

    let response = app.get(&format!("/events/{event_id}"), "").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await?;

    assert!(body.contains("11 of 12 seats left"), "seat count missing");
    // Anonymous visitors are pointed at the sign-in instead of the
    // register button.
    assert!(body.contains("Sign in"));

    Ok(())
}

#[tokio::test]
async fn a_missing_event_is_a_404() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/events/no-such-event", "").await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn unknown_paths_render_the_not_found_page() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/no/such/page", "").await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await?;
    assert!(body.contains("Page not found"));

    Ok(())
}

#[tokio::test]
async fn embedded_assets_are_served_with_their_mime_type() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app.get("/static/css/main.css", "").await?;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/css"), "got {content_type}");

    let response = app.get("/static/css/missing.css", "").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
