#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use smarthire_auth::{
    handlers::{configure_services, API_PROXY_PREFIX},
    settings::SmartHireSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = SmartHireSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    if settings.api.base_url.is_empty() {
        log::warn!("No API base URL configured; proxied requests will fail with 500");
    }

    start_server(settings).await
}

/// Start the proxy server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: SmartHireSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    // Configure CORS for the web client
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &SmartHireSettings) {
    println!("Starting SmartHire auth proxy on http://{bind_address}");
    println!();
    println!("Proxy endpoints:");
    println!("  ALL {API_PROXY_PREFIX}/{{path}}  - Forwarded to upstream API as /{{path}}");
    println!(
        "                         Upstream API base: {}",
        if settings.api.base_url.is_empty() {
            "(not configured)"
        } else {
            settings.api.base_url.as_str()
        }
    );
    println!();
    println!("System endpoints:");
    println!("  GET  /ping           - Health check");
}
