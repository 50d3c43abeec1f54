use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use sqlx::{SqlitePool, types::Text};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use crate::password::{hash_password, verify_password};
use crate::{Result, new_id, now_ts};

/// Matriculation numbers look like `U2104317B`: a letter, seven digits,
/// a checksum letter.
static MATRIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][0-9]{7}[A-Z]$").expect("matric regex must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Pending,
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    Executive,
    Admin,
}

impl Role {
    /// Executives and admins may enter the back office.
    pub fn is_back_office(&self) -> bool {
        matches!(self, Role::Executive | Role::Admin)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Member {
    pub id: String,
    pub matric_no: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub membership_status: Text<MembershipStatus>,
    pub role: Text<Role>,
    pub joined_at: i64,
}

impl Member {
    pub fn status_label(&self) -> &str {
        self.membership_status.0.as_ref()
    }

    pub fn role_label(&self) -> &str {
        self.role.0.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.membership_status.0 == MembershipStatus::Active
    }

    pub fn is_back_office(&self) -> bool {
        self.role.0.is_back_office()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 80, message = "Full name is required"))]
    pub full_name: String,
    #[validate(regex(
        path = *MATRIC_RE,
        message = "Matric number must be a letter, seven digits and a letter, e.g. U2104317B"
    ))]
    pub matric_no: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "Password must be 8 to 64 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    Created { member_id: String },
    EmailTaken,
    MatricTaken,
}

#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(Member),
    InvalidCredentials,
    Suspended,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,
    #[validate(length(min = 8, max = 64, message = "New password must be 8 to 64 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    Changed,
    WrongCurrent,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 80, message = "Full name is required"))]
    pub full_name: String,
}

/// Self-registration. New members start as `pending` / `member`; an
/// admin activates them from the back office.
///
/// Email and matric uniqueness are pre-checked so each collision gets
/// its own outcome; the unique indexes backstop the race and map to the
/// same outcomes.
pub async fn signup(pool: &SqlitePool, mut input: SignupInput) -> Result<SignupOutcome> {
    input.full_name = input.full_name.trim().to_owned();
    input.matric_no = input.matric_no.trim().to_uppercase();
    input.email = input.email.trim().to_lowercase();
    input.validate()?;

    if find_by_email(pool, &input.email).await?.is_some() {
        return Ok(SignupOutcome::EmailTaken);
    }

    let matric_taken = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM members WHERE matric_no = ?",
    )
    .bind(&input.matric_no)
    .fetch_one(pool)
    .await?;
    if matric_taken > 0 {
        return Ok(SignupOutcome::MatricTaken);
    }

    let password_hash = hash_password(&input.password)?;
    let member_id = new_id();

    let inserted = sqlx::query(
        r#"
        INSERT INTO members (id, matric_no, email, full_name, password_hash, membership_status, role, joined_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&member_id)
    .bind(&input.matric_no)
    .bind(&input.email)
    .bind(&input.full_name)
    .bind(&password_hash)
    .bind(MembershipStatus::Pending.as_ref())
    .bind(Role::Member.as_ref())
    .bind(now_ts())
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => Ok(SignupOutcome::Created { member_id }),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            if db.message().contains("matric_no") {
                Ok(SignupOutcome::MatricTaken)
            } else {
                Ok(SignupOutcome::EmailTaken)
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Check credentials. Unknown email and wrong password collapse into
/// `InvalidCredentials` so the login form cannot be used to enumerate
/// accounts; suspension is only revealed after the password matches.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<LoginOutcome> {
    let Some(member) = find_by_email(pool, &email.trim().to_lowercase()).await? else {
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if !verify_password(password, &member.password_hash)? {
        return Ok(LoginOutcome::InvalidCredentials);
    }

    if member.membership_status.0 == MembershipStatus::Suspended {
        return Ok(LoginOutcome::Suspended);
    }

    Ok(LoginOutcome::LoggedIn(member))
}

pub async fn change_password(
    pool: &SqlitePool,
    member_id: &str,
    input: ChangePasswordInput,
) -> Result<PasswordOutcome> {
    input.validate()?;

    let Some(member) = find_by_id(pool, member_id).await? else {
        return Ok(PasswordOutcome::WrongCurrent);
    };

    if !verify_password(&input.current_password, &member.password_hash)? {
        return Ok(PasswordOutcome::WrongCurrent);
    }

    let password_hash = hash_password(&input.new_password)?;
    sqlx::query("UPDATE members SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(member_id)
        .execute(pool)
        .await?;

    Ok(PasswordOutcome::Changed)
}

pub async fn update_profile(
    pool: &SqlitePool,
    member_id: &str,
    mut input: UpdateProfileInput,
) -> Result<()> {
    input.full_name = input.full_name.trim().to_owned();
    input.validate()?;

    sqlx::query("UPDATE members SET full_name = ? WHERE id = ?")
        .bind(&input.full_name)
        .bind(member_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Admin transition. Returns false when the member does not exist.
pub async fn set_membership_status(
    pool: &SqlitePool,
    member_id: &str,
    status: MembershipStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE members SET membership_status = ? WHERE id = ?")
        .bind(status.as_ref())
        .bind(member_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Admin transition. Returns false when the member does not exist.
pub async fn set_role(pool: &SqlitePool, member_id: &str, role: Role) -> Result<bool> {
    let result = sqlx::query("UPDATE members SET role = ? WHERE id = ?")
        .bind(role.as_ref())
        .bind(member_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_by_id(pool: &SqlitePool, member_id: &str) -> Result<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, matric_no, email, full_name, password_hash, membership_status, role, joined_at
        FROM members
        WHERE id = ?
        "#,
    )
    .bind(member_id)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, matric_no, email, full_name, password_hash, membership_status, role, joined_at
        FROM members
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

/// Back-office roster, newest first, optionally filtered by status.
pub async fn list_members(
    pool: &SqlitePool,
    status: Option<MembershipStatus>,
) -> Result<Vec<Member>> {
    let members = match status {
        Some(status) => {
            sqlx::query_as::<_, Member>(
                r#"
                SELECT id, matric_no, email, full_name, password_hash, membership_status, role, joined_at
                FROM members
                WHERE membership_status = ?
                ORDER BY joined_at DESC
                "#,
            )
            .bind(status.as_ref())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Member>(
                r#"
                SELECT id, matric_no, email, full_name, password_hash, membership_status, role, joined_at
                FROM members
                ORDER BY joined_at DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(members)
}

pub async fn pending_member_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM members WHERE membership_status = 'pending'",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matric_regex_accepts_canonical_form() {
        assert!(MATRIC_RE.is_match("U2104317B"));
        assert!(MATRIC_RE.is_match("A0000000Z"));
    }

    #[test]
    fn matric_regex_rejects_malformed_values() {
        assert!(!MATRIC_RE.is_match("u2104317b"));
        assert!(!MATRIC_RE.is_match("U210431B"));
        assert!(!MATRIC_RE.is_match("U21043178"));
        assert!(!MATRIC_RE.is_match("2104317BB"));
        assert!(!MATRIC_RE.is_match(""));
    }

    #[test]
    fn status_and_role_round_trip_as_snake_case() {
        assert_eq!(MembershipStatus::Pending.as_ref(), "pending");
        assert_eq!(
            "suspended".parse::<MembershipStatus>().unwrap(),
            MembershipStatus::Suspended
        );
        assert_eq!(Role::Executive.as_ref(), "executive");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn back_office_roles() {
        assert!(!Role::Member.is_back_office());
        assert!(Role::Executive.is_back_office());
        assert!(Role::Admin.is_back_office());
    }
}
