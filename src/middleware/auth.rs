use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::auth::{CurrentMember, load_session_member, verify_token};
use crate::routes::AppState;

/// Authentication middleware for member-only routes.
///
/// Validates the auth_token cookie, reloads the member row and inserts
/// [`CurrentMember`] for downstream handlers.
/// Redirects to /login if:
/// - Token is missing or fails validation
/// - The member no longer exists
/// - The membership was suspended since the token was minted
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match jar.get("auth_token") {
        Some(cookie) => cookie.value(),
        None => {
            tracing::warn!("Missing auth_token cookie, redirecting to login");
            return (StatusCode::SEE_OTHER, [("Location", "/login")]).into_response();
        }
    };

    let Some(member_id) = verify_token(&state.config.jwt, token) else {
        tracing::warn!("Invalid auth token, redirecting to login");
        return (StatusCode::SEE_OTHER, [("Location", "/login")]).into_response();
    };

    match load_session_member(&state, &member_id).await {
        Ok(Some(member)) => {
            req.extensions_mut().insert(CurrentMember(member));
            next.run(req).await
        }
        Ok(None) => {
            tracing::warn!(
                member_id = %member_id,
                "Session member missing or suspended, redirecting to login"
            );
            (StatusCode::SEE_OTHER, [("Location", "/login")]).into_response()
        }
        Err(e) => {
            tracing::error!(
                "Database error loading session member: {:?}, redirecting to login",
                e
            );
            (StatusCode::SEE_OTHER, [("Location", "/login")]).into_response()
        }
    }
}
