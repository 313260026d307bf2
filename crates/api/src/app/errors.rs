use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use onboard_auth::AuthError;
use onboard_core::DomainError;
use onboard_signup::SignupError;

pub const SIGNUP_EXPIRED: &str = "signup session expired";
pub const INVALID_SIGNUP_DATA: &str = "invalid signup data";
const INTERNAL: &str = "internal error";

pub fn signup_error_to_response(err: SignupError) -> axum::response::Response {
    match err {
        SignupError::Domain(err @ DomainError::Validation { .. }) => {
            json_error(StatusCode::BAD_REQUEST, err.to_string())
        }
        SignupError::Domain(DomainError::Conflict(msg)) => json_error(StatusCode::BAD_REQUEST, msg),
        SignupError::Domain(DomainError::NotFound | DomainError::InvalidState(_)) => {
            json_error(StatusCode::BAD_REQUEST, SIGNUP_EXPIRED)
        }
        SignupError::Domain(DomainError::Unauthorized | DomainError::InvalidId(_)) => {
            json_error(StatusCode::BAD_REQUEST, INVALID_SIGNUP_DATA)
        }
        SignupError::Internal(detail) => {
            tracing::error!(error = %detail, "signup failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "Unauthorized"),
        AuthError::Internal(detail) => {
            tracing::error!(error = %detail, "authentication failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "ok": false,
            "error": message.into(),
        })),
    )
        .into_response()
}
