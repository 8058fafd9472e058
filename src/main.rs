mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod realtime;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{dev::Service as _, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::services::{FirebaseIdentity, IdentityProvider};

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    log::error!("❌ {}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    log::info!("🚀 Starting Alumni Connect API...");
    log::info!("🎓 College domain: {}", config.college_domain);
    log::info!("🛡️  Bootstrap admins: {}", config.admin_emails.len());

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to MongoDB", e))?;
    log::info!("✅ MongoDB connected successfully");

    let identity: Arc<dyn IdentityProvider> = Arc::new(
        FirebaseIdentity::new(&config).map_err(|e| startup_error("Failed to set up identity provider", e))?,
    );
    log::info!("🔐 Identity provider ready for project {}", config.firebase_project_id);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    log::info!("📁 Uploads stored in {}", config.upload_dir.display());

    // 🧹 Complete past events
    log::info!("📅 Starting background jobs...");
    jobs::event_sweeper::start_event_sweeper(
        db.clone(),
        Duration::from_secs(config.event_sweep_interval_secs),
    )
    .await;
    log::info!("✅ Background jobs started");

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);
    log::info!("🔌 WebSocket relay at: ws://{}/ws", bind_address);

    let db_data = web::Data::new(db);
    let identity_data: web::Data<dyn IdentityProvider> = web::Data::from(identity);
    let registry_data = web::Data::new(realtime::SocketRegistry::default());
    let cors_origins = config.cors_origins.clone();
    let config_data = web::Data::new(config);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::CONTENT_DISPOSITION,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(identity_data.clone())
            .app_data(registry_data.clone())
            .app_data(config_data.clone())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    if res.status().is_client_error() || res.status().is_server_error() {
                        api::metrics::increment_error_count();
                    }
                    Ok(res)
                }
            })
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
            .default_service(web::to(api::not_found))
    })
    .bind(bind_address)?
    .run()
    .await
}
