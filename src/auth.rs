use anyhow::anyhow;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::AppError};

/// Guard for the generation endpoints: the caller must present the configured
/// cron secret as a bearer token. A missing secret is a deployment mistake
/// and surfaces as a 500, a wrong token as a 401.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let secret = state
        .cron_secret
        .as_deref()
        .filter(|secret| !secret.trim().is_empty())
        .ok_or_else(|| AppError::Internal(anyhow!("cron secret not configured")))?;

    let token = extract_bearer(req.headers())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    if token != secret {
        return Err(AppError::Unauthorized("invalid cron secret".to_string()));
    }

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let raw = value.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?;
    if token.trim().is_empty() {
        None
    } else {
        Some(token.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer shhh-secret");
        assert_eq!(extract_bearer(&headers), Some("shhh-secret".to_string()));
    }

    #[test]
    fn accepts_lowercase_scheme_and_trims() {
        let headers = headers_with_auth("bearer  padded-token ");
        assert_eq!(extract_bearer(&headers), Some("padded-token".to_string()));
    }

    #[test]
    fn rejects_missing_or_empty_tokens() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers_with_auth("Bearer   ")), None);
        assert_eq!(extract_bearer(&headers_with_auth("Basic abc")), None);
    }
}
