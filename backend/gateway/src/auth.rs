//! Gateway Authentication Module
//!
//! Accepts `Authorization: Bearer <token>` or a `token` cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tower_cookies::Cookie;
use tracing::{debug, warn};

use menuscan_core::User;

use crate::response::ApiError;
use crate::server::GatewayState;

pub const TOKEN_COOKIE: &str = "token";
const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// The authenticated caller, loaded fresh from the store on every request.
pub struct RequireAuth(pub User);

/// Bearer header first, then the token cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|val| val.to_str().ok())
        .flat_map(|val| val.split(';'))
        .find_map(|raw| {
            let cookie = Cookie::parse(raw.trim()).ok()?;
            (cookie.name() == TOKEN_COOKIE).then(|| cookie.value().to_string())
        })
}

#[async_trait]
impl FromRequestParts<GatewayState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            debug!(uri = %parts.uri, "Request without credentials");
            return Err(ApiError::unauthorized(NOT_AUTHORIZED));
        };

        let claims = state.tokens.verify(&token).map_err(|e| {
            warn!(error = %e, "Rejected session token");
            ApiError::unauthorized(NOT_AUTHORIZED)
        })?;
        let user_id = claims.user_id()?;

        match state.users.get_user(user_id).await? {
            Some(user) => Ok(RequireAuth(user)),
            None => {
                warn!(user_id = %user_id, "Token for unknown user");
                Err(ApiError::unauthorized("User not found"))
            }
        }
    }
}
