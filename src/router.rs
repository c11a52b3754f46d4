use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{api, app::App, config::CorsConfig};

pub fn router(app: App) -> Router {
    let cors = cors_layer(&app.config.cors);

    Router::new()
        .route("/liveness", get(api::health_checks::ok))
        .route("/readiness", get(api::health_checks::readiness))
        .nest("/api", api::routes())
        .fallback(api::not_found)
        .with_state(app)
        .layer(cors)
        .layer(middleware::from_fn(api::exception_boundary))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
}
