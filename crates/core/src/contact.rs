use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{Result, new_id, now_ts};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 80, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 120, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 10, max = 2000, message = "Message must be at least 10 characters"))]
    pub message: String,
}

/// Store a message from the public contact form and hand the stored
/// row back so the caller can forward it to the association inbox.
pub async fn record_contact_message(
    pool: &SqlitePool,
    mut input: ContactInput,
) -> Result<ContactMessage> {
    input.name = input.name.trim().to_owned();
    input.email = input.email.trim().to_lowercase();
    input.subject = input.subject.trim().to_owned();
    input.message = input.message.trim().to_owned();
    input.validate()?;

    let message = ContactMessage {
        id: new_id(),
        name: input.name,
        email: input.email,
        subject: input.subject,
        message: input.message,
        created_at: now_ts(),
    };

    sqlx::query(
        "INSERT INTO contact_messages (id, name, email, subject, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(message.created_at)
    .execute(pool)
    .await?;

    Ok(message)
}
