use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use sqlx::{SqlitePool, types::Text};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use crate::{Result, new_id, now_ts};

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex must compile"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time regex must compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub event_type: String,
    pub description: String,
    pub event_date: String,
    pub start_time: String,
    pub location: String,
    pub capacity: Option<i64>,
    pub status: Text<EventStatus>,
    pub created_at: i64,
}

impl Event {
    pub fn status_label(&self) -> &str {
        self.status.0.as_ref()
    }

    pub fn is_scheduled(&self) -> bool {
        self.status.0 == EventStatus::Scheduled
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.0 == EventStatus::Cancelled
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 120, message = "Event name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 40, message = "Event type is required"))]
    pub event_type: String,
    #[validate(length(max = 2000, message = "Description is limited to 2000 characters"))]
    pub description: String,
    #[validate(regex(path = *DATE_RE, message = "Date must be in YYYY-MM-DD format"))]
    pub event_date: String,
    #[validate(regex(path = *TIME_RE, message = "Start time must be in HH:MM format"))]
    pub start_time: String,
    #[validate(length(min = 1, max = 120, message = "Location is required"))]
    pub location: String,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i64>,
}

impl EventInput {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self.event_type = self.event_type.trim().to_owned();
        self.description = self.description.trim().to_owned();
        self.event_date = self.event_date.trim().to_owned();
        self.start_time = self.start_time.trim().to_owned();
        self.location = self.location.trim().to_owned();
        self
    }
}

pub async fn create_event(pool: &SqlitePool, input: EventInput) -> Result<String> {
    let input = input.normalized();
    input.validate()?;

    let event_id = new_id();
    sqlx::query(
        r#"
        INSERT INTO events (id, name, event_type, description, event_date, start_time, location, capacity, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event_id)
    .bind(&input.name)
    .bind(&input.event_type)
    .bind(&input.description)
    .bind(&input.event_date)
    .bind(&input.start_time)
    .bind(&input.location)
    .bind(input.capacity)
    .bind(EventStatus::Scheduled.as_ref())
    .bind(now_ts())
    .execute(pool)
    .await?;

    Ok(event_id)
}

/// Returns false when the event does not exist.
pub async fn update_event(pool: &SqlitePool, event_id: &str, input: EventInput) -> Result<bool> {
    let input = input.normalized();
    input.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE events
        SET name = ?, event_type = ?, description = ?, event_date = ?, start_time = ?, location = ?, capacity = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.event_type)
    .bind(&input.description)
    .bind(&input.event_date)
    .bind(&input.start_time)
    .bind(&input.location)
    .bind(input.capacity)
    .bind(event_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cancel a scheduled event. Existing registrations are kept as a
/// historical record; the registration workflow refuses cancelled
/// events on its own.
pub async fn cancel_event(pool: &SqlitePool, event_id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE events SET status = 'cancelled' WHERE id = ? AND status = 'scheduled'")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Close out a scheduled event after it has run.
pub async fn complete_event(pool: &SqlitePool, event_id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE events SET status = 'completed' WHERE id = ? AND status = 'scheduled'")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_event(pool: &SqlitePool, event_id: &str) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, event_type, description, event_date, start_time, location, capacity, status, created_at
        FROM events
        WHERE id = ?
        "#,
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    Ok(event)
}

/// Scheduled events dated today or later, soonest first.
pub async fn upcoming_events(pool: &SqlitePool, today: time::Date) -> Result<Vec<Event>> {
    let today = crate::iso_date(today)?;
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, event_type, description, event_date, start_time, location, capacity, status, created_at
        FROM events
        WHERE status = 'scheduled' AND event_date >= ?
        ORDER BY event_date ASC, start_time ASC
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Past events for the public archive, most recent first. Cancelled
/// events are omitted.
pub async fn recent_past_events(
    pool: &SqlitePool,
    today: time::Date,
    limit: i64,
) -> Result<Vec<Event>> {
    let today = crate::iso_date(today)?;
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, event_type, description, event_date, start_time, location, capacity, status, created_at
        FROM events
        WHERE status != 'cancelled' AND event_date < ?
        ORDER BY event_date DESC, start_time DESC
        LIMIT ?
        "#,
    )
    .bind(today)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Full catalogue for the back office, newest first.
pub async fn list_events(pool: &SqlitePool) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, event_type, description, event_date, start_time, location, capacity, status, created_at
        FROM events
        ORDER BY event_date DESC, start_time DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(events)
}

pub async fn upcoming_event_count(pool: &SqlitePool, today: time::Date) -> Result<i64> {
    let today = crate::iso_date(today)?;
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM events WHERE status = 'scheduled' AND event_date >= ?",
    )
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
