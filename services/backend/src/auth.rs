use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use tracing::debug;

use crate::AppState;
use crate::error::Error;
use crate::models::Principal;

/// Resolves `Authorization: Bearer <token>` to the acting user.
///
/// A request without the header is anonymous. A header that is malformed or
/// carries an unknown token is rejected instead of being downgraded to anonymous.
impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Principal::anonymous());
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("Malformed authorization header".into()))?;

        match state.users.find_by_token(token).await? {
            Some(user) => {
                debug!("Request authenticated as user {}", user.id);
                Ok(user.into())
            }
            None => Err(Error::Unauthorized("Invalid API token".into())),
        }
    }
}
