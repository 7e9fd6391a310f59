use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::remote::RemoteDataService;

pub mod handlers;
pub mod models;

pub fn create_router(remote: Arc<RemoteDataService>, static_dir: &str) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/search", post(handlers::search_handler))
        .route("/api/meta", get(handlers::meta_handler))
        .with_state(remote)
        // Static site: search form, results page, legal pages
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}
