//! Event registration workflow: the precondition ladder, the feedback
//! gate and the capacity boundary.

use campushub_core::registration::{
    RegisterOutcome, attempt_register, pending_feedback_for, registration_preflight,
    submit_feedback,
};
use time::macros::date;

mod helpers;

#[tokio::test]
async fn test_register_then_register_again_is_idempotent() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;
    let event = helpers::create_event_on(&pool, "Rust Workshop", "2026-06-20", None).await?;

    let first = attempt_register(&pool, &member, &event, helpers::today()).await?;
    assert_eq!(first, RegisterOutcome::Registered);

    let second = attempt_register(&pool, &member, &event, helpers::today()).await?;
    assert_eq!(second, RegisterOutcome::AlreadyRegistered);

    assert_eq!(helpers::registration_count(&pool, &event).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_pending_feedback_blocks_new_registration() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;

    let attended = helpers::create_event_on(&pool, "Git Talk", "2026-06-10", None).await?;
    helpers::attend_event(&pool, &member, &attended, date!(2026 - 06 - 01)).await?;

    let pending = pending_feedback_for(&pool, &member).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].event_name, "Git Talk");

    let next = helpers::create_event_on(&pool, "Hack Night", "2026-06-20", None).await?;
    let outcome = attempt_register(&pool, &member, &next, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::GateBlocked);
    assert_eq!(helpers::registration_count(&pool, &next).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_feedback_clears_the_gate() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;

    let attended = helpers::create_event_on(&pool, "Git Talk", "2026-06-10", None).await?;
    helpers::attend_event(&pool, &member, &attended, date!(2026 - 06 - 01)).await?;

    let next = helpers::create_event_on(&pool, "Hack Night", "2026-06-20", None).await?;
    let blocked = attempt_register(&pool, &member, &next, helpers::today()).await?;
    assert_eq!(blocked, RegisterOutcome::GateBlocked);

    submit_feedback(&pool, &member, &attended, 5, "Great intro to rebasing.").await?;
    assert!(pending_feedback_for(&pool, &member).await?.is_empty());

    let retried = attempt_register(&pool, &member, &next, helpers::today()).await?;
    assert_eq!(retried, RegisterOutcome::Registered);

    Ok(())
}

#[tokio::test]
async fn test_past_event_is_closed_regardless_of_state() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;

    let yesterday = helpers::create_event_on(&pool, "Yesterday", "2026-06-14", None).await?;
    let outcome = attempt_register(&pool, &member, &yesterday, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::EventPast);

    // Same answer even when the member is otherwise blocked: the event
    // check comes first.
    let attended = helpers::create_event_on(&pool, "Git Talk", "2026-06-10", None).await?;
    helpers::attend_event(&pool, &member, &attended, date!(2026 - 06 - 01)).await?;
    let outcome = attempt_register(&pool, &member, &yesterday, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::EventPast);

    Ok(())
}

#[tokio::test]
async fn test_event_dated_today_is_still_open() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;
    let event = helpers::create_event_on(&pool, "Same Day", "2026-06-15", None).await?;

    let outcome = attempt_register(&pool, &member, &event, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::Registered);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_and_completed_events_are_closed() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;

    let cancelled = helpers::create_event_on(&pool, "Cancelled", "2026-06-20", None).await?;
    campushub_core::event::cancel_event(&pool, &cancelled).await?;
    let outcome = attempt_register(&pool, &member, &cancelled, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::EventCancelled);

    let completed = helpers::create_event_on(&pool, "Completed", "2026-06-15", None).await?;
    campushub_core::event::complete_event(&pool, &completed).await?;
    let outcome = attempt_register(&pool, &member, &completed, helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::EventCancelled);

    Ok(())
}

#[tokio::test]
async fn test_unknown_event() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;

    let outcome = attempt_register(&pool, &member, "no-such-event", helpers::today()).await?;
    assert_eq!(outcome, RegisterOutcome::EventNotFound);

    Ok(())
}

#[tokio::test]
async fn test_capacity_boundary() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let event = helpers::create_event_on(&pool, "Tiny Room", "2026-06-20", Some(2)).await?;

    let alice = helpers::create_active_member(&pool, "alice").await?;
    let bob = helpers::create_active_member(&pool, "bob").await?;
    let carol = helpers::create_active_member(&pool, "carol").await?;

    // N-1 of N seats taken: still open.
    assert_eq!(
        attempt_register(&pool, &alice, &event, helpers::today()).await?,
        RegisterOutcome::Registered
    );
    assert_eq!(
        attempt_register(&pool, &bob, &event, helpers::today()).await?,
        RegisterOutcome::Registered
    );

    // N of N seats taken: full.
    assert_eq!(
        attempt_register(&pool, &carol, &event, helpers::today()).await?,
        RegisterOutcome::EventFull
    );
    assert_eq!(helpers::registration_count(&pool, &event).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_preflight_reports_without_writing() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let member = helpers::create_active_member(&pool, "alice").await?;
    let event = helpers::create_event_on(&pool, "Hack Night", "2026-06-20", None).await?;

    let clear = registration_preflight(&pool, &member, &event, helpers::today()).await?;
    assert_eq!(clear, None);
    assert_eq!(helpers::registration_count(&pool, &event).await?, 0);

    let attended = helpers::create_event_on(&pool, "Git Talk", "2026-06-10", None).await?;
    helpers::attend_event(&pool, &member, &attended, date!(2026 - 06 - 01)).await?;

    let blocked = registration_preflight(&pool, &member, &event, helpers::today()).await?;
    assert_eq!(blocked, Some(RegisterOutcome::GateBlocked));
    assert_eq!(helpers::registration_count(&pool, &event).await?, 0);

    Ok(())
}
