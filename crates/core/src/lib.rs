pub mod contact;
pub mod error;
pub mod event;
pub mod member;
pub mod partner;
pub mod password;
pub mod project;
pub mod registration;

pub use error::{Error, Result, validation_messages};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Embedded schema migrations, shared by the server binary and every
/// test suite.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// New ULID row identifier.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Current unix timestamp in seconds.
pub(crate) fn now_ts() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Format a calendar date the way the schema stores it, `YYYY-MM-DD`.
/// Stored dates compare correctly as plain strings.
pub fn iso_date(date: time::Date) -> Result<String> {
    Ok(date.format(&DATE_FORMAT)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn iso_date_pads_to_schema_format() {
        assert_eq!(iso_date(date!(2026 - 03 - 07)).unwrap(), "2026-03-07");
    }

    #[test]
    fn iso_dates_order_lexicographically() {
        let earlier = iso_date(date!(2026 - 09 - 30)).unwrap();
        let later = iso_date(date!(2026 - 10 - 01)).unwrap();
        assert!(earlier < later);
    }
}
