//! Bearer-token authentication for the signing route.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;
use super::error::ApiError;

/// The authenticated principal, attached to the request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
}

/// Resolves a bearer token to a caller.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Caller>;
}

/// Accepts exactly one configured token. Without a token nothing is accepted.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    token: Option<String>,
}

impl StaticTokenAuthenticator {
    pub fn new(token: Option<String>) -> Self {
        StaticTokenAuthenticator { token }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<Caller> {
        let expected = self.token.as_deref()?;
        (token == expected).then(|| Caller {
            id: "api-token".to_string(),
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("no bearer token provided");
        return Err(ApiError::Unauthorized);
    };

    match state.authenticator.authenticate(token) {
        Some(caller) => {
            request.extensions_mut().insert(caller);
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("invalid bearer token provided");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn static_token_matches_exactly() {
        let auth = StaticTokenAuthenticator::new(Some("s3cret".to_string()));
        assert!(auth.authenticate("s3cret").is_some());
        assert!(auth.authenticate("s3cret ").is_none());
        assert!(auth.authenticate("other").is_none());

        let unset = StaticTokenAuthenticator::default();
        assert!(unset.authenticate("").is_none());
        assert!(unset.authenticate("s3cret").is_none());
    }

    #[test]
    fn bearer_token_is_extracted_from_authorization_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
