//! The authentication gate: axum extractors that resolve a principal.
//!
//! Token lookup order is bearer header first, then the session cookie —
//! API callers send `Authorization: Bearer <token>`, the browser UI rides
//! on its cookie. Either way the token is re-verified on every request;
//! nothing client-supplied outside the signed claims is trusted.
//!
//! Two variants, per the gate contract:
//! - [`Principal`] — **required**: rejects with a generic 401 when no
//!   valid token is present.
//! - [`MaybePrincipal`] — **optional**: never rejects; handlers that
//!   behave differently for anonymous callers check the inner `Option`.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::{SessionClaims, TokenKeys};

/// Cookie carrying the session token for browser clients.
pub const TOKEN_COOKIE: &str = "shellgate_token";

/// A verified principal. Extraction fails with 401 if no valid token is
/// presented.
pub struct Principal(pub SessionClaims);

/// An optionally-verified principal. Extraction never fails; the inner
/// option is `None` for anonymous or invalid-token callers.
pub struct MaybePrincipal(pub Option<SessionClaims>);

/// Rejection for [`Principal`]: a generic 401. The body never says why —
/// expired, malformed, and absent tokens all look the same.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Principal
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        extract_token(parts)
            .and_then(|token| keys.verify(&token))
            .map(Principal)
            .ok_or(AuthRejection)
    }
}

impl<S> FromRequestParts<S> for MaybePrincipal
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        Ok(MaybePrincipal(
            extract_token(parts).and_then(|token| keys.verify(&token)),
        ))
    }
}

/// Pulls a candidate token out of the request: bearer header first, then
/// the session cookie. Empty values count as absent.
fn extract_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            raw.strip_prefix("Bearer ")
                .or_else(|| raw.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned);

    from_header.or_else(|| {
        parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    (name == TOKEN_COOKIE).then(|| value.trim().to_string())
                })
            })
            .filter(|v| !v.is_empty())
    })
}

// =========================================================================
// Tests
// =========================================================================
