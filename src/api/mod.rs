//! HTTP boundary: routes, API-key check, CORS and request tracing

pub mod auth;
pub mod error;
pub mod handlers;
pub mod request;

use crate::metrics::ServiceMetrics;
use crate::service::FraudScoringService;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use auth::ApiKeyAuth;
pub use error::{AppError, AppResult};
pub use request::{ClassificationRequest, LocationData, PredictionRequest};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: FraudScoringService,
    pub metrics: Arc<ServiceMetrics>,
    pub auth: Arc<ApiKeyAuth>,
}

impl AppState {
    pub fn new(service: FraudScoringService, metrics: Arc<ServiceMetrics>, auth: ApiKeyAuth) -> Self {
        Self {
            service,
            metrics,
            auth: Arc::new(auth),
        }
    }
}

/// Build the application router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    // API-key protected routes
    let scoring_routes = Router::new()
        .route("/api/v1/classify", post(handlers::classify))
        .route("/predict", post(handlers::predict))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(scoring_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// `*` allows any origin without credentials; otherwise only the listed
/// origins, with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Wildcards cannot be combined with credentials, so mirror the preflight
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
