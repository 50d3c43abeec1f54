use serde::Deserialize;
use sqlx::{SqlitePool, types::Text};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use crate::{Result, new_id, now_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    New,
    Approved,
    Declined,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub blurb: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartnerRequest {
    pub id: String,
    pub org_name: String,
    pub contact_name: String,
    pub email: String,
    pub message: String,
    pub status: Text<RequestStatus>,
    pub created_at: i64,
    pub reviewed_at: Option<i64>,
}

impl PartnerRequest {
    pub fn status_label(&self) -> &str {
        self.status.0.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.status.0 == RequestStatus::New
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PartnerRequestInput {
    #[validate(length(min = 1, max = 120, message = "Organisation name is required"))]
    pub org_name: String,
    #[validate(length(min = 1, max = 80, message = "Contact name is required"))]
    pub contact_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 10, max = 2000, message = "Tell us a little more (at least 10 characters)"))]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Approved { partner_id: String },
    Declined,
    AlreadyReviewed,
    NotFound,
}

/// Store a partnership request from the public form. The caller sends
/// the notification email; storage does not depend on it.
pub async fn submit_partner_request(
    pool: &SqlitePool,
    mut input: PartnerRequestInput,
) -> Result<PartnerRequest> {
    input.org_name = input.org_name.trim().to_owned();
    input.contact_name = input.contact_name.trim().to_owned();
    input.email = input.email.trim().to_lowercase();
    input.message = input.message.trim().to_owned();
    input.validate()?;

    let request = PartnerRequest {
        id: new_id(),
        org_name: input.org_name,
        contact_name: input.contact_name,
        email: input.email,
        message: input.message,
        status: Text(RequestStatus::New),
        created_at: now_ts(),
        reviewed_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO partner_requests (id, org_name, contact_name, email, message, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.id)
    .bind(&request.org_name)
    .bind(&request.contact_name)
    .bind(&request.email)
    .bind(&request.message)
    .bind(request.status.0.as_ref())
    .bind(request.created_at)
    .execute(pool)
    .await?;

    Ok(request)
}

/// Approve or decline a request. Only `new` requests can be reviewed;
/// a second decision is an idempotent `AlreadyReviewed`. Approval also
/// creates the public partner row, in the same transaction.
pub async fn review_partner_request(
    pool: &SqlitePool,
    request_id: &str,
    approve: bool,
) -> Result<ReviewOutcome> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, PartnerRequest>(
        r#"
        SELECT id, org_name, contact_name, email, message, status, created_at, reviewed_at
        FROM partner_requests
        WHERE id = ?
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(request) = request else {
        return Ok(ReviewOutcome::NotFound);
    };

    if request.status.0 != RequestStatus::New {
        return Ok(ReviewOutcome::AlreadyReviewed);
    }

    let next = if approve {
        RequestStatus::Approved
    } else {
        RequestStatus::Declined
    };

    let updated = sqlx::query(
        "UPDATE partner_requests SET status = ?, reviewed_at = ? WHERE id = ? AND status = 'new'",
    )
    .bind(next.as_ref())
    .bind(now_ts())
    .bind(request_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(ReviewOutcome::AlreadyReviewed);
    }

    if !approve {
        tx.commit().await?;
        return Ok(ReviewOutcome::Declined);
    }

    let partner_id = new_id();
    sqlx::query(
        "INSERT INTO partners (id, name, website, blurb, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&partner_id)
    .bind(&request.org_name)
    .bind(None::<String>)
    .bind(&request.message)
    .bind(now_ts())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ReviewOutcome::Approved { partner_id })
}

pub async fn list_partners(pool: &SqlitePool) -> Result<Vec<Partner>> {
    let partners = sqlx::query_as::<_, Partner>(
        "SELECT id, name, website, blurb, created_at FROM partners ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(partners)
}

/// Back-office review queue: undecided requests first, newest first
/// within each group.
pub async fn list_partner_requests(pool: &SqlitePool) -> Result<Vec<PartnerRequest>> {
    let requests = sqlx::query_as::<_, PartnerRequest>(
        r#"
        SELECT id, org_name, contact_name, email, message, status, created_at, reviewed_at
        FROM partner_requests
        ORDER BY CASE WHEN status = 'new' THEN 0 ELSE 1 END, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

pub async fn new_partner_request_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM partner_requests WHERE status = 'new'",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
