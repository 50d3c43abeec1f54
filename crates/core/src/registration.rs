use sqlx::{SqliteConnection, SqlitePool, types::Text};
use strum::{AsRefStr, Display, EnumString};
use time::Date;

use crate::event::EventStatus;
use crate::{Error, Result, iso_date, new_id, now_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Registered,
    Attended,
    Absent,
    Cancelled,
}

/// Every way an event registration attempt can end. These are expected
/// outcomes, not errors; callers turn them into flashes and redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
    EventNotFound,
    EventPast,
    EventCancelled,
    EventFull,
    GateBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Submitted,
    NotRegistered,
    NotAttended,
    AlreadySubmitted,
    InvalidRating,
    CommentTooShort,
}

/// An attended registration still waiting on the member's feedback.
/// Any of these existing blocks new registrations.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingFeedback {
    pub event_id: String,
    pub event_name: String,
    pub event_date: String,
}

#[derive(Debug, sqlx::FromRow)]
struct EventGate {
    event_date: String,
    status: Text<EventStatus>,
    capacity: Option<i64>,
}

/// Run the registration preconditions in order and report the first
/// blocker, or `None` when the member is clear to register. Callers
/// decide the connection: `attempt_register` passes its transaction so
/// the checks and the insert are atomic, the preflight passes a plain
/// read connection.
async fn check_registrable(
    conn: &mut SqliteConnection,
    member_id: &str,
    event_id: &str,
    today: &str,
) -> Result<Option<RegisterOutcome>> {
    let event = sqlx::query_as::<_, EventGate>(
        "SELECT event_date, status, capacity FROM events WHERE id = ?",
    )
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(event) = event else {
        return Ok(Some(RegisterOutcome::EventNotFound));
    };

    if event.event_date.as_str() < today {
        return Ok(Some(RegisterOutcome::EventPast));
    }

    // Completed-but-dated-today takes the same exit as cancelled:
    // registration is closed either way.
    if event.status.0 != EventStatus::Scheduled {
        return Ok(Some(RegisterOutcome::EventCancelled));
    }

    let gate_blockers = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM registrations
        WHERE member_id = ?
          AND attendance_status = 'attended'
          AND (feedback_rating IS NULL OR feedback_comment IS NULL OR feedback_comment = '')
        "#,
    )
    .bind(member_id)
    .fetch_one(&mut *conn)
    .await?;

    if gate_blockers > 0 {
        return Ok(Some(RegisterOutcome::GateBlocked));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE member_id = ? AND event_id = ?",
    )
    .bind(member_id)
    .bind(event_id)
    .fetch_one(&mut *conn)
    .await?;

    if existing > 0 {
        return Ok(Some(RegisterOutcome::AlreadyRegistered));
    }

    if let Some(capacity) = event.capacity {
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE event_id = ? AND attendance_status != 'cancelled'",
        )
        .bind(event_id)
        .fetch_one(&mut *conn)
        .await?;

        if taken >= capacity {
            return Ok(Some(RegisterOutcome::EventFull));
        }
    }

    Ok(None)
}

/// Register `member_id` for `event_id`, re-validating every
/// precondition and inserting inside one write transaction so the
/// capacity count cannot go stale between check and insert. The unique
/// (member, event) index backstops the duplicate race and is reported
/// as `AlreadyRegistered`, the same idempotent no-op as the explicit
/// check.
pub async fn attempt_register(
    pool: &SqlitePool,
    member_id: &str,
    event_id: &str,
    today: Date,
) -> Result<RegisterOutcome> {
    let today = iso_date(today)?;
    let mut tx = pool.begin().await?;

    if let Some(blocked) = check_registrable(&mut tx, member_id, event_id, &today).await? {
        return Ok(blocked);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO registrations (id, member_id, event_id, attendance_status, registered_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_id())
    .bind(member_id)
    .bind(event_id)
    .bind(AttendanceStatus::Registered.as_ref())
    .bind(now_ts())
    .execute(&mut *tx)
    .await;

    match inserted {
        Ok(_) => {
            tx.commit().await?;
            Ok(RegisterOutcome::Registered)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Ok(RegisterOutcome::AlreadyRegistered)
        }
        Err(e) => Err(e.into()),
    }
}

/// The same precondition ladder without the insert, for the GET
/// confirmation page. `None` means clear to register.
pub async fn registration_preflight(
    pool: &SqlitePool,
    member_id: &str,
    event_id: &str,
    today: Date,
) -> Result<Option<RegisterOutcome>> {
    let today = iso_date(today)?;
    let mut conn = pool.acquire().await?;
    check_registrable(&mut conn, member_id, event_id, &today).await
}

#[derive(Debug, sqlx::FromRow)]
struct FeedbackTarget {
    id: String,
    attendance_status: Text<AttendanceStatus>,
    feedback_rating: Option<i64>,
    feedback_comment: Option<String>,
}

impl FeedbackTarget {
    fn feedback_complete(&self) -> bool {
        self.feedback_rating.is_some()
            && self.feedback_comment.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Record post-event feedback, exactly once. Preconditions are checked
/// before input validation so a second submission reports
/// `AlreadySubmitted` whatever its payload, and the UPDATE repeats the
/// preconditions in its WHERE clause so the stored values can never be
/// overwritten.
pub async fn submit_feedback(
    pool: &SqlitePool,
    member_id: &str,
    event_id: &str,
    rating: i64,
    comment: &str,
) -> Result<FeedbackOutcome> {
    let mut tx = pool.begin().await?;

    let target = sqlx::query_as::<_, FeedbackTarget>(
        r#"
        SELECT id, attendance_status, feedback_rating, feedback_comment
        FROM registrations
        WHERE member_id = ? AND event_id = ?
        "#,
    )
    .bind(member_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(target) = target else {
        return Ok(FeedbackOutcome::NotRegistered);
    };

    if target.attendance_status.0 != AttendanceStatus::Attended {
        return Ok(FeedbackOutcome::NotAttended);
    }

    if target.feedback_complete() {
        return Ok(FeedbackOutcome::AlreadySubmitted);
    }

    if !(1..=5).contains(&rating) {
        return Ok(FeedbackOutcome::InvalidRating);
    }

    let comment = comment.trim();
    if comment.chars().count() < 10 {
        return Ok(FeedbackOutcome::CommentTooShort);
    }

    sqlx::query(
        r#"
        UPDATE registrations
        SET feedback_rating = ?, feedback_comment = ?, feedback_at = ?
        WHERE id = ?
          AND attendance_status = 'attended'
          AND (feedback_rating IS NULL OR feedback_comment IS NULL OR feedback_comment = '')
        "#,
    )
    .bind(rating)
    .bind(comment)
    .bind(now_ts())
    .bind(&target.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(FeedbackOutcome::Submitted)
}

/// Attended registrations with incomplete feedback, newest event first.
/// Non-empty means the member is gate-blocked.
pub async fn pending_feedback_for(
    pool: &SqlitePool,
    member_id: &str,
) -> Result<Vec<PendingFeedback>> {
    let pending = sqlx::query_as::<_, PendingFeedback>(
        r#"
        SELECT e.id AS event_id, e.name AS event_name, e.event_date
        FROM registrations r
        JOIN events e ON e.id = r.event_id
        WHERE r.member_id = ?
          AND r.attendance_status = 'attended'
          AND (r.feedback_rating IS NULL OR r.feedback_comment IS NULL OR r.feedback_comment = '')
        ORDER BY e.event_date DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    Ok(pending)
}

/// Nav badge count; 0 means the gate is open.
pub async fn pending_feedback_count(pool: &SqlitePool, member_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM registrations
        WHERE member_id = ?
          AND attendance_status = 'attended'
          AND (feedback_rating IS NULL OR feedback_comment IS NULL OR feedback_comment = '')
        "#,
    )
    .bind(member_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Outstanding feedback across all members, for the back-office
/// dashboard.
pub async fn outstanding_feedback_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM registrations
        WHERE attendance_status = 'attended'
          AND (feedback_rating IS NULL OR feedback_comment IS NULL OR feedback_comment = '')
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Seats taken; cancelled registrations do not hold a seat.
pub async fn active_registration_count(pool: &SqlitePool, event_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE event_id = ? AND attendance_status != 'cancelled'",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Post-event bookkeeping by an organiser. Only `attended` and
/// `absent` are valid marks; `attended` is what arms the feedback gate.
pub async fn set_attendance(
    pool: &SqlitePool,
    registration_id: &str,
    status: AttendanceStatus,
) -> Result<bool> {
    if !matches!(status, AttendanceStatus::Attended | AttendanceStatus::Absent) {
        return Err(Error::Server(format!(
            "attendance can only be marked attended or absent, not {status}"
        )));
    }

    let result = sqlx::query("UPDATE registrations SET attendance_status = ? WHERE id = ?")
        .bind(status.as_ref())
        .bind(registration_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberRegistration {
    pub registration_id: String,
    pub event_id: String,
    pub event_name: String,
    pub event_type: String,
    pub event_date: String,
    pub start_time: String,
    pub location: String,
    pub event_status: Text<EventStatus>,
    pub attendance_status: Text<AttendanceStatus>,
    pub feedback_rating: Option<i64>,
    pub feedback_comment: Option<String>,
}

impl MemberRegistration {
    pub fn attendance_label(&self) -> &str {
        self.attendance_status.0.as_ref()
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback_rating.is_some()
            && self.feedback_comment.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn needs_feedback(&self) -> bool {
        self.attendance_status.0 == AttendanceStatus::Attended && !self.has_feedback()
    }
}

/// Everything the member has ever signed up for, newest event first.
pub async fn registrations_for_member(
    pool: &SqlitePool,
    member_id: &str,
) -> Result<Vec<MemberRegistration>> {
    let registrations = sqlx::query_as::<_, MemberRegistration>(
        r#"
        SELECT r.id AS registration_id, e.id AS event_id, e.name AS event_name,
               e.event_type, e.event_date, e.start_time, e.location,
               e.status AS event_status, r.attendance_status,
               r.feedback_rating, r.feedback_comment
        FROM registrations r
        JOIN events e ON e.id = r.event_id
        WHERE r.member_id = ?
        ORDER BY e.event_date DESC, e.start_time DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    Ok(registrations)
}

/// Live registrations for events still ahead, soonest first. Dashboard
/// material.
pub async fn upcoming_registrations_for_member(
    pool: &SqlitePool,
    member_id: &str,
    today: Date,
) -> Result<Vec<MemberRegistration>> {
    let today = iso_date(today)?;
    let registrations = sqlx::query_as::<_, MemberRegistration>(
        r#"
        SELECT r.id AS registration_id, e.id AS event_id, e.name AS event_name,
               e.event_type, e.event_date, e.start_time, e.location,
               e.status AS event_status, r.attendance_status,
               r.feedback_rating, r.feedback_comment
        FROM registrations r
        JOIN events e ON e.id = r.event_id
        WHERE r.member_id = ?
          AND r.attendance_status = 'registered'
          AND e.status = 'scheduled'
          AND e.event_date >= ?
        ORDER BY e.event_date ASC, e.start_time ASC
        "#,
    )
    .bind(member_id)
    .bind(today)
    .fetch_all(pool)
    .await?;

    Ok(registrations)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RosterEntry {
    pub registration_id: String,
    pub member_name: String,
    pub matric_no: String,
    pub attendance_status: Text<AttendanceStatus>,
    pub feedback_rating: Option<i64>,
}

impl RosterEntry {
    pub fn attendance_label(&self) -> &str {
        self.attendance_status.0.as_ref()
    }

    pub fn is_marked(&self) -> bool {
        matches!(
            self.attendance_status.0,
            AttendanceStatus::Attended | AttendanceStatus::Absent
        )
    }
}

/// Sign-up sheet for the back-office attendance page.
pub async fn event_roster(pool: &SqlitePool, event_id: &str) -> Result<Vec<RosterEntry>> {
    let roster = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT r.id AS registration_id, m.full_name AS member_name, m.matric_no,
               r.attendance_status, r.feedback_rating
        FROM registrations r
        JOIN members m ON m.id = r.member_id
        WHERE r.event_id = ?
        ORDER BY m.full_name ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(roster)
}
