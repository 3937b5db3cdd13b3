use axum::http::{ HeaderName, HeaderValue, Method };
use tower_http::cors::CorsLayer;

pub fn create_cors_layer(environment: &str) -> CorsLayer {
    if environment == "production" {
        let origin = std::env
            ::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "https://app.venturelink.example".to_string());

        CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().expect("invalid CORS_ORIGIN"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                HeaderName::from_static("content-type"),
                HeaderName::from_static("authorization"),
            ])
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                HeaderName::from_static("content-type"),
                HeaderName::from_static("authorization"),
                HeaderName::from_static("accept"),
            ])
            .allow_credentials(true)
    }
}
