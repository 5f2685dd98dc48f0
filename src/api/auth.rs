use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, AppState};

/// Opaque identifier of the requester, inserted into request extensions by
/// [`require_basic_auth`] and extracted by the handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

/// Authentication middleware. Fails closed: a missing header, a non-Basic
/// scheme, undecodable credentials, an unknown email and a wrong password
/// all resolve to 401 with an empty body before any handler runs.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = decode_basic_credentials(request.headers());

    let Some((email, password)) = credentials else {
        tracing::warn!("Authentication failed: missing or malformed Basic credentials");
        return ApiError::Unauthenticated.into_response();
    };

    match state.store().verify_user_credentials(&email, &password).await {
        Ok(Some(user_id)) => {
            tracing::Span::current().record("user_id", tracing::field::display(user_id));
            request.extensions_mut().insert(AuthenticatedUser(user_id));
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("Authentication failed for {}", email);
            ApiError::Unauthenticated.into_response()
        }
        Err(e) => {
            tracing::error!("Credential lookup failed: {}", e);
            ApiError::Unauthenticated.into_response()
        }
    }
}

/// Decode routine for the Basic scheme: prefix check, base64 decode, then
/// a single split on the first colon, so passwords may contain colons.
fn decode_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;

    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", BASE64.encode(credentials))
    }

    #[test]
    fn test_decodes_email_and_password() {
        let headers = headers_with(&basic("jane@example.com:hunter2"));
        let (email, password) = decode_basic_credentials(&headers).unwrap();
        assert_eq!(email, "jane@example.com");
        assert_eq!(password, "hunter2");
    }

    #[test]
    fn test_password_may_contain_colons() {
        let headers = headers_with(&basic("jane@example.com:pa:ss:word"));
        let (_, password) = decode_basic_credentials(&headers).unwrap();
        assert_eq!(password, "pa:ss:word");
    }

    #[test]
    fn test_rejects_missing_header() {
        assert!(decode_basic_credentials(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_rejects_non_basic_scheme() {
        let headers = headers_with("Bearer some-token");
        assert!(decode_basic_credentials(&headers).is_none());
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let headers = headers_with("Basic not!!base64");
        assert!(decode_basic_credentials(&headers).is_none());
    }

    #[test]
    fn test_rejects_credentials_without_colon() {
        let headers = headers_with(&basic("no-colon-here"));
        assert!(decode_basic_credentials(&headers).is_none());
    }
}
