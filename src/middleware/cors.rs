use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{config::AppConfig, middleware::request_id::REQUEST_ID_HEADER};

pub fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let mut headers = vec![ACCEPT, AUTHORIZATION, CONTENT_TYPE, REQUEST_ID_HEADER.clone()];
    if config.auth_dev_overrides_enabled() {
        headers.push(HeaderName::from_static("x-user-id"));
    }

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(headers)
        .expose_headers([REQUEST_ID_HEADER.clone()]);

    if config.cors_origins.iter().any(|origin| origin.trim() == "*") {
        return layer.allow_origin(Any).allow_credentials(false);
    }

    let origins = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();
    layer.allow_origin(origins).allow_credentials(true)
}
