//! Bearer-token authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::state::AppState;

/// Resolved caller identity, injected into request extensions
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

/// Reject requests without a resolvable bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer(&request)
        .ok_or_else(|| Error::Authentication("No authorization header".to_string()))?;

    let owner = state
        .auth()
        .resolve(&token)
        .await?
        .ok_or_else(|| Error::Authentication("Invalid token".to_string()))?;

    request.extensions_mut().insert(OwnerId(owner));
    Ok(next.run(request).await)
}

fn extract_bearer(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(str::trim))
        .filter(|token| !token.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request_with_header(value: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/api/documents");
        if let Some(v) = value {
            builder = builder.header("Authorization", v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(
            extract_bearer(&request_with_header(Some("Bearer abc123"))),
            Some("abc123".to_string())
        );
        assert_eq!(extract_bearer(&request_with_header(Some("Bearer "))), None);
        assert_eq!(extract_bearer(&request_with_header(Some("Basic abc"))), None);
        assert_eq!(extract_bearer(&request_with_header(None)), None);
    }
}
