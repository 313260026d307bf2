use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::dto::{self, json_body};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/step1", post(step1))
        .route("/step2", post(step2))
        .route("/step3", post(step3))
}

pub async fn step1(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::SignupStep1Body>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.signup.step1(body.into()).await {
        Ok(token) => (
            StatusCode::OK,
            Json(dto::SignupStartedResponse {
                ok: true,
                signup_token: token,
            }),
        )
            .into_response(),
        Err(e) => errors::signup_error_to_response(e),
    }
}

pub async fn step2(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::SignupStep2Body>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.signup.step2(body.into()).await {
        Ok(()) => (StatusCode::OK, Json(dto::OkResponse::ok())).into_response(),
        Err(e) => errors::signup_error_to_response(e),
    }
}

pub async fn step3(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::SignupStep3Body>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.signup.step3(body.into()).await {
        Ok(done) => (
            StatusCode::OK,
            Json(dto::SignupCompletedResponse {
                ok: true,
                redirect_url: services.signup_redirect_url.clone(),
                order: done.order.into(),
                created: done.created.into(),
            }),
        )
            .into_response(),
        Err(e) => errors::signup_error_to_response(e),
    }
}
