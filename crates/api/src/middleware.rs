use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors::{auth_error_to_response, json_error};
use crate::app::services::AppServices;
use crate::context::SessionContext;

/// Resolve the bearer token to an active identity, or answer 401.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "Unauthorized"))?;

    let identity = services
        .auth
        .authenticate(token)
        .await
        .map_err(auth_error_to_response)?;

    req.extensions_mut().insert(SessionContext::new(identity));

    Ok(next.run(req).await)
}

/// The token from an `Authorization: Bearer <token>` header, if well formed.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token)
}
