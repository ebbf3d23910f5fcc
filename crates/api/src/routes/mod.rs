//! API routes

pub mod billing;
pub mod health;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::optional_session, config::Config, security::security_headers_middleware,
    state::AppState,
};

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Session is optional here; the billing handlers decide what a missing one means
    let api_routes = Router::new()
        .route("/pricing", get(billing::pricing))
        .route("/billing/subscription", get(billing::get_subscription))
        .route(
            "/billing/generate-user-stripe",
            post(billing::generate_user_stripe),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_manager.clone(),
            optional_session,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
