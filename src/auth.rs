use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use campushub_core::member::{self, Member, MembershipStatus};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::routes::AppState;

const AUTH_COOKIE_NAME: &str = "auth_token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    aud: String, // Optional. Audience
    exp: u64, // Required (validate_exp defaults to true in validation). Expiration time (as UTC timestamp)
    iat: u64, // Optional. Issued at (as UTC timestamp)
    iss: String, // Optional. Issuer
    sub: String, // Optional. Subject (whom token refers to)
}

pub fn generate_token(config: JwtConfig, sub: String) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let claims = Claims {
        aud: config.audience,
        exp: now + config.expiration_days * 24 * 60 * 60,
        iat: now,
        iss: config.issuer,
        sub,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn build_cookie<'a>(config: JwtConfig, sub: String) -> anyhow::Result<Cookie<'a>> {
    let token = generate_token(config, sub)?;

    Ok(Cookie::build((AUTH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build())
}

/// Named removal cookie for logout; the path must match the login cookie
/// or browsers keep the old one around.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(AUTH_COOKIE_NAME);
    cookie.set_path("/");
    cookie
}

/// Check signature, expiry, issuer and audience. Returns the member id
/// the token was minted for.
pub fn verify_token(config: &JwtConfig, token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.to_owned()]);
    validation.set_audience(&[config.audience.to_owned()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims.sub)
}

/// Logged-in member for the current request, inserted by the auth
/// middleware on protected routes.
#[derive(Debug, Clone)]
pub struct CurrentMember(pub Member);

/// Resolve a token subject to a live session. A deleted account yields
/// `None`, and so does a suspended one, so suspension takes effect on
/// the member's next request rather than at token expiry.
pub async fn load_session_member(
    state: &AppState,
    member_id: &str,
) -> campushub_core::Result<Option<Member>> {
    let Some(member) = member::find_by_id(&state.read_pool, member_id).await? else {
        return Ok(None);
    };

    if member.membership_status.0 == MembershipStatus::Suspended {
        return Ok(None);
    }

    Ok(Some(member))
}

/// Handler-side extractor for routes behind the auth middleware.
pub struct AuthMember(pub Member);

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentMember>()
            .map(|current| AuthMember(current.0.clone()))
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Optional session for public pages: the header greets a logged-in
/// member but the page never redirects.
pub struct MaybeMember(pub Option<Member>);

impl FromRequestParts<AppState> for MaybeMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // On protected routes the middleware has already done the work.
        if let Some(current) = parts.extensions.get::<CurrentMember>() {
            return Ok(MaybeMember(Some(current.0.clone())));
        }

        let jar = match CookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(_) => return Ok(MaybeMember(None)),
        };

        let Some(token) = jar.get(AUTH_COOKIE_NAME).map(|cookie| cookie.value()) else {
            return Ok(MaybeMember(None));
        };

        let Some(member_id) = verify_token(&state.config.jwt, token) else {
            return Ok(MaybeMember(None));
        };

        let member = load_session_member(state, &member_id).await?;

        Ok(MaybeMember(member))
    }
}
