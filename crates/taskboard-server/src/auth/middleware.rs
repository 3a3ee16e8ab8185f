use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{error::AppError, routes::AppState};

use super::jwt::verify_access_token;

/// The acting user, resolved from the bearer token before any handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects the request with 401 unless it carries a valid access token.
///
/// The rest of the request runs inside a span naming the caller.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = verify_access_token(token, &state.config.jwt_secret)?;

    let span = tracing::debug_span!("caller", user_id = %claims.sub, email = %claims.email);
    request.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(request).instrument(span).await)
}
