// HTTP request handlers for the SmartHire auth proxy
pub mod health;
pub mod proxy;

use actix_web::web;

// Re-export the main handler functions
pub use health::{health, HealthResponse};
pub use proxy::{proxy_api, API_PROXY_PREFIX};

/// Register the proxy and health routes
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Health endpoint
        .route("/ping", web::get().to(health))
        // Upstream API, any method
        .route(
            &format!("{API_PROXY_PREFIX}/{{tail:.*}}"),
            web::route().to(proxy_api),
        );
}
