use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tillpoint::config::Settings;
use tillpoint::modules;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tillpoint=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::from_env().expect("Failed to load configuration");
    settings.validate().expect("Configuration validation failed");

    tracing::info!("Starting Tillpoint Settlement & Tax Accrual Service");
    tracing::info!("Environment: {}", settings.app.env);
    tracing::info!("Server binding to: {}", settings.server.bind_address());

    // Create database connection pool (runs embedded migrations)
    let db_pool = settings
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    // Start HTTP server
    let bind_address = settings.server.bind_address();
    let server = HttpServer::new(move || {
        let pool = db_pool.clone();
        let settings = settings.clone();

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
            .configure(move |cfg| modules::configure(cfg, &pool, &settings))
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "tillpoint"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "Tillpoint Settlement & Tax Accrual Service",
        "version": "0.1.0",
        "status": "running"
    }))
}
