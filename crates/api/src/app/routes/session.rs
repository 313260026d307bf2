use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};

use crate::app::dto::{self, json_body};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::extract_bearer;

pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LoginBody>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.auth.login(&body.email, &body.password).await {
        Ok(token) => (
            StatusCode::OK,
            Json(dto::LoginResponse {
                ok: true,
                token,
                redirect_url: services.login_redirect_url.clone(),
            }),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Idempotent: answers `ok` whether or not the token named a live session.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = extract_bearer(&headers) {
        services.auth.logout(token);
    }
    (StatusCode::OK, Json(dto::OkResponse::ok())).into_response()
}

pub async fn me(Extension(session): Extension<SessionContext>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(dto::MeResponse {
            ok: true,
            user: session.identity().into(),
        }),
    )
        .into_response()
}
