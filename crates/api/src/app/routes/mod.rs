use axum::{Router, routing::get};

pub mod session;
pub mod signup;
pub mod system;

/// Public `/api` endpoints: signup and login/logout.
pub fn public_router() -> Router {
    Router::new()
        .nest("/signup", signup::router())
        .merge(session::public_router())
}

/// Endpoints that require a valid session.
pub fn protected_router() -> Router {
    Router::new().route("/me", get(session::me))
}
