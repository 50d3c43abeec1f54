#![allow(dead_code)]

use campushub_core::event::{self, EventInput};
use campushub_core::member::{self, MembershipStatus, SignupInput, SignupOutcome};
use campushub_core::registration::{self, AttendanceStatus};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use time::Date;
use time::macros::date;

/// Fixed "today" so date arithmetic in tests is deterministic.
pub fn today() -> Date {
    date!(2026 - 06 - 15)
}

pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    campushub_core::MIGRATOR.run(&pool).await?;

    Ok(pool)
}

fn matric_for(name: &str) -> String {
    let digits = name.bytes().map(u32::from).sum::<u32>() % 10_000_000;
    format!("U{digits:07}A")
}

/// Sign a member up and activate them, the way an admin would.
pub async fn create_active_member(pool: &SqlitePool, name: &str) -> anyhow::Result<String> {
    let outcome = member::signup(
        pool,
        SignupInput {
            full_name: format!("{name} Tan"),
            matric_no: matric_for(name),
            email: format!("{name}@campushub.localhost"),
            password: "my_password".to_owned(),
        },
    )
    .await?;

    let SignupOutcome::Created { member_id } = outcome else {
        anyhow::bail!("member {name} was not created: {outcome:?}");
    };

    member::set_membership_status(pool, &member_id, MembershipStatus::Active).await?;

    Ok(member_id)
}

pub async fn create_event_on(
    pool: &SqlitePool,
    name: &str,
    event_date: &str,
    capacity: Option<i64>,
) -> anyhow::Result<String> {
    let event_id = event::create_event(
        pool,
        EventInput {
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

pub async fn registration_id(
    pool: &SqlitePool,
    member_id: &str,
    event_id: &str,
) -> anyhow::Result<String> {
    let id = sqlx::query_scalar::<_, String>(
        "SELECT id FROM registrations WHERE member_id = ? AND event_id = ?",
    )
    .bind(member_id)
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn registration_count(pool: &SqlitePool, event_id: &str) -> anyhow::Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Register (back-dated so the event was still ahead) and mark the
/// member attended, arming the feedback gate.
pub async fn attend_event(
    pool: &SqlitePool,
    member_id: &str,
    event_id: &str,
    registered_on: Date,
) -> anyhow::Result<()> {
    let outcome =
        registration::attempt_register(pool, member_id, event_id, registered_on).await?;
    anyhow::ensure!(
        outcome == registration::RegisterOutcome::Registered,
        "setup registration failed: {outcome:?}"
    );

    let id = registration_id(pool, member_id, event_id).await?;
    registration::set_attendance(pool, &id, AttendanceStatus::Attended).await?;

    Ok(())
}
