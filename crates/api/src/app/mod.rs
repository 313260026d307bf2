//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage selection, workflow/gate construction, sweeper
//! - `routes/`: HTTP handlers (signup steps, session endpoints, health)
//! - `dto.rs`: request/response bodies and their mapping to domain requests
//! - `errors.rs`: the single error → response mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::auth_middleware,
    ));

    let api = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        )
}
