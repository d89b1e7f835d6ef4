//! # Web API Module
//!
//! `axum` router exposing the similar-products aggregation over HTTP.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /product/:id/similar` | [`handlers::similar_products::get_similar_products`] |
//! | `GET /health` | [`handlers::health::health_check`] |

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod errors;
pub mod handlers;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

/// Create the web application with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route(
            "/product/:id/similar",
            get(handlers::similar_products::get_similar_products),
        )
        .route("/health", get(handlers::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Web application created with all routes and middleware");
    router
}
