use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use campushub_core::{member::Member, registration};
use rand::distr::{Alphanumeric, SampleString};
use strum::{AsRefStr, Display, EnumString};

use crate::error::AppError;
use crate::routes::AppState;

const FLASH_COOKIE_NAME: &str = "flash";
const CSRF_COOKIE_NAME: &str = "csrf_token";
const INTENT_COOKIE_NAME: &str = "registration_intent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
    Info,
    Warning,
}

/// One-shot banner carried across a redirect in a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Warning,
            message: message.into(),
        }
    }

    pub fn kind_label(&self) -> &str {
        self.kind.as_ref()
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}

pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let value = format!(
        "{}:{}",
        flash.kind.as_ref(),
        urlencoding::encode(&flash.message)
    );
    jar.add(session_cookie(FLASH_COOKIE_NAME, value))
}

/// Pop the flash. The value renders once; the same response replaces
/// the cookie with a removal.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE_NAME) else {
        return (jar, None);
    };

    let flash = parse_flash(cookie.value());
    (jar.remove(removal(FLASH_COOKIE_NAME)), flash)
}

// A malformed cookie (hand-edited or truncated) renders as no banner at
// all rather than an error.
fn parse_flash(raw: &str) -> Option<Flash> {
    let (kind, message) = raw.split_once(':')?;
    let kind = kind.parse::<FlashKind>().ok()?;
    let message = urlencoding::decode(message).ok()?.into_owned();

    Some(Flash { kind, message })
}

/// Issue the form token for a page render. One slot per browser, so the
/// newest rendered page wins.
pub fn issue_csrf(jar: CookieJar) -> (CookieJar, String) {
    let token = Alphanumeric.sample_string(&mut rand::rng(), 32);
    let jar = jar.add(session_cookie(CSRF_COOKIE_NAME, token.clone()));

    (jar, token)
}

/// Double-submit check. The cookie is consumed whether or not the token
/// matches, so a submitted token cannot be replayed.
pub fn verify_csrf(jar: CookieJar, submitted: &str) -> (CookieJar, bool) {
    let ok = jar
        .get(CSRF_COOKIE_NAME)
        .map(|cookie| !submitted.is_empty() && cookie.value() == submitted)
        .unwrap_or(false);

    (jar.remove(removal(CSRF_COOKIE_NAME)), ok)
}

/// Remember which event a visitor tried to join while blocked, so the
/// feedback flow can send them back afterwards. Single slot: a newer
/// attempt replaces an older one.
pub fn remember_registration_intent(jar: CookieJar, event_id: &str) -> CookieJar {
    jar.add(session_cookie(INTENT_COOKIE_NAME, event_id.to_owned()))
}

pub fn registration_intent(jar: &CookieJar) -> Option<String> {
    jar.get(INTENT_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

pub fn clear_registration_intent(jar: CookieJar) -> CookieJar {
    jar.remove(removal(INTENT_COOKIE_NAME))
}

/// Everything the base layout needs: the signed-in member for the nav,
/// the popped flash, the feedback badge count and the form token.
pub struct PageCtx {
    pub member: Option<Member>,
    pub flash: Option<Flash>,
    pub pending_feedback: i64,
    pub csrf_token: String,
}

impl PageCtx {
    pub async fn build(
        state: &AppState,
        jar: CookieJar,
        member: Option<Member>,
    ) -> Result<(CookieJar, PageCtx), AppError> {
        let (jar, flash) = take_flash(jar);
        let (jar, csrf_token) = issue_csrf(jar);

        let pending_feedback = match &member {
            Some(member) => {
                registration::pending_feedback_count(&state.read_pool, &member.id).await?
            }
            None => 0,
        };

        Ok((
            jar,
            PageCtx {
                member,
                flash,
                pending_feedback,
                csrf_token,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_round_trips_through_the_cookie() {
        let jar = set_flash(CookieJar::new(), Flash::success("You are in! See you there."));
        let (jar, flash) = take_flash(jar);

        assert_eq!(
            flash,
            Some(Flash::success("You are in! See you there."))
        );
        assert!(jar.get(FLASH_COOKIE_NAME).is_none());
    }

    #[test]
    fn flash_survives_reserved_characters() {
        let jar = set_flash(CookieJar::new(), Flash::error("Comment: too short; 10+ chars"));
        let (_, flash) = take_flash(jar);

        assert_eq!(flash, Some(Flash::error("Comment: too short; 10+ chars")));
    }

    #[test]
    fn missing_flash_is_none() {
        let (_, flash) = take_flash(CookieJar::new());
        assert_eq!(flash, None);
    }

    #[test]
    fn malformed_flash_is_dropped() {
        let jar = CookieJar::new().add(session_cookie(FLASH_COOKIE_NAME, "nonsense".to_owned()));
        let (_, flash) = take_flash(jar);

        assert_eq!(flash, None);
    }

    #[test]
    fn csrf_token_matches_once() {
        let (jar, token) = issue_csrf(CookieJar::new());

        let (jar, ok) = verify_csrf(jar, &token);
        assert!(ok);

        // Consumed on first use.
        let (_, ok) = verify_csrf(jar, &token);
        assert!(!ok);
    }

    #[test]
    fn csrf_rejects_a_foreign_token() {
        let (jar, _token) = issue_csrf(CookieJar::new());
        let (_, ok) = verify_csrf(jar, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

        assert!(!ok);
    }

    #[test]
    fn csrf_rejects_an_empty_submission() {
        let (jar, _token) = issue_csrf(CookieJar::new());
        let (_, ok) = verify_csrf(jar, "");

        assert!(!ok);
    }

    #[test]
    fn registration_intent_is_a_single_slot() {
        let jar = remember_registration_intent(CookieJar::new(), "event-1");
        let jar = remember_registration_intent(jar, "event-2");

        assert_eq!(registration_intent(&jar).as_deref(), Some("event-2"));

        let jar = clear_registration_intent(jar);
        assert_eq!(registration_intent(&jar), None);
    }
}
