//! Back-office authorization middleware

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::auth::CurrentMember;

/// Verifies the member holds a back-office role. Runs after the auth
/// middleware, which inserts [`CurrentMember`].
pub async fn back_office_middleware(request: Request, next: Next) -> Result<Response, Response> {
    let current = request
        .extensions()
        .get::<CurrentMember>()
        .cloned()
        .ok_or_else(|| {
            warn!("Back-office middleware: no authenticated member found in request extensions");
            (
                StatusCode::UNAUTHORIZED,
                "Authentication required to access the back office",
            )
                .into_response()
        })?;

    if !current.0.is_back_office() {
        error!(
            member_id = %current.0.id,
            "Member without a committee role attempted to access an admin route"
        );
        return Err((
            StatusCode::FORBIDDEN,
            "A committee role is required to access this resource",
        )
            .into_response());
    }

    Ok(next.run(request).await)
}
