pub mod achievements;
pub mod admin;
pub mod auth;
pub mod discussions;
pub mod events;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod metrics;
pub mod swagger;
pub mod uploads;
pub mod users;

use actix_web::{error::InternalError, web, HttpResponse};

use crate::middleware::{AuthMiddleware, RequireRole};
use crate::models::Role;

/// 400 `{message, error}` for bodies, query strings and path segments that
/// fail to deserialize.
fn bad_request<E: std::fmt::Display + std::fmt::Debug + 'static>(message: &str, err: E) -> actix_web::Error {
    let body = serde_json::json!({
        "message": message,
        "error": err.to_string()
    });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Unknown routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "message": "Route not found" }))
}

/// Full route table. Shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request("Invalid request body", err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request("Invalid query parameters", err)))
        .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request("Invalid path parameter", err)))
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Realtime relay (token in the query string, browsers cannot set headers on upgrade)
        .route("/ws", web::get().to(crate::realtime::connect))
        // Uploaded images
        .route("/uploads/{file}", web::get().to(uploads::serve_upload))
        // Auth: profile registration against the provider's token
        .service(
            web::scope("/api/v1/auth")
                .wrap(AuthMiddleware)
                .route("/register", web::post().to(auth::register))
                .route("/me", web::get().to(auth::get_me))
                .route("/verify", web::get().to(auth::verify_token)),
        )
        // Users: directory and own profile
        .service(
            web::scope("/api/v1/users")
                .wrap(AuthMiddleware)
                .route("", web::get().to(users::list_users))
                .route("/alumni", web::get().to(users::list_alumni))
                .route("/me", web::get().to(users::get_my_profile))
                .route("/me", web::put().to(users::update_my_profile))
                .route("/me/photo", web::post().to(users::upload_my_photo))
                .route("/{uid}", web::get().to(users::get_user)),
        )
        // Admin: wraps run bottom-up, so authentication happens before the role check
        .service(
            web::scope("/api/v1/admin")
                .wrap(RequireRole::any_of(&[Role::Admin]))
                .wrap(AuthMiddleware)
                .service(admin::list_users)
                .service(admin::pending_users)
                .service(admin::verify_user)
                .service(admin::change_role)
                .service(admin::delete_user)
                .service(admin::stats),
        )
        .service(
            web::scope("/api/v1/discussions")
                .wrap(AuthMiddleware)
                .service(discussions::list_discussions)
                .service(discussions::create_discussion)
                .service(discussions::get_discussion)
                .service(discussions::update_discussion)
                .service(discussions::delete_discussion)
                .service(discussions::add_comment)
                .service(discussions::delete_comment)
                .service(discussions::toggle_like),
        )
        .service(
            web::scope("/api/v1/jobs")
                .wrap(AuthMiddleware)
                .service(jobs::list_jobs)
                .service(jobs::create_job)
                .service(jobs::get_job)
                .service(jobs::update_job)
                .service(jobs::delete_job),
        )
        .service(
            web::scope("/api/v1/events")
                .wrap(AuthMiddleware)
                .service(events::list_events)
                .service(events::create_event)
                // before /{id} so "registrations" is not read as an id
                .service(events::my_registrations)
                .service(events::get_event)
                .service(events::update_event)
                .service(events::delete_event)
                .service(events::register_for_event)
                .service(events::unregister_from_event)
                .service(events::list_registrations)
                .service(events::export_registrations),
        )
        .service(
            web::scope("/api/v1/messages")
                .wrap(AuthMiddleware)
                .service(messages::list_conversations)
                .service(messages::start_conversation)
                .service(messages::get_messages)
                .service(messages::send_message)
                .service(messages::mark_read),
        )
        .service(
            web::scope("/api/v1/achievements")
                .wrap(AuthMiddleware)
                .service(achievements::list_achievements)
                .service(achievements::create_achievement)
                .service(achievements::delete_achievement),
        )
        .service(
            web::scope("/api/v1/uploads")
                .wrap(AuthMiddleware)
                .route("/image", web::post().to(uploads::upload_image)),
        );
}
