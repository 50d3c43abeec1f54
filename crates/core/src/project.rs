use serde::Deserialize;
use sqlx::{SqlitePool, types::Text};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use crate::{Result, new_id, now_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planned,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub status: Text<ProjectStatus>,
    pub year: i64,
    pub created_at: i64,
}

impl Project {
    pub fn status_label(&self) -> &str {
        self.status.0.as_ref()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 120, message = "Project title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Summary is required"))]
    pub summary: String,
    #[validate(range(min = 2000, max = 2100, message = "Year must be a four-digit year"))]
    pub year: i64,
}

pub async fn create_project(pool: &SqlitePool, mut input: ProjectInput) -> Result<String> {
    input.title = input.title.trim().to_owned();
    input.summary = input.summary.trim().to_owned();
    input.validate()?;

    let project_id = new_id();
    sqlx::query(
        "INSERT INTO projects (id, title, summary, status, year, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&project_id)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(ProjectStatus::Planned.as_ref())
    .bind(input.year)
    .bind(now_ts())
    .execute(pool)
    .await?;

    Ok(project_id)
}

/// Returns false when the project does not exist.
pub async fn set_project_status(
    pool: &SqlitePool,
    project_id: &str,
    status: ProjectStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
        .bind(status.as_ref())
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Showcase listing, most recent year first.
pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, title, summary, status, year, created_at
        FROM projects
        ORDER BY year DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(projects)
}
