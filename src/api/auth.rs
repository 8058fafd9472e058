use actix_web::{web, HttpResponse};

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{RegisterUserRequest, UserResponse};
use crate::services::identity_service::IdentityProvider;
use crate::services::user_service;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Profile created", body = UserResponse),
        (status = 400, description = "Invalid request or user already registered"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    identity: web::Data<dyn IdentityProvider>,
    config: web::Data<AppConfig>,
    request: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/register - uid: {}, email: {}", claims.uid, claims.email);

    let user = user_service::register(&db, identity.get_ref(), &config, &claims, request.into_inner()).await?;

    log::info!("✅ Registration successful: {} as {} (verified: {})", user.email, user.role, user.verified);
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Stored profile of the caller", body = UserResponse),
        (status = 404, description = "Not registered yet")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(claims: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let user = user_service::get_by_uid(&db, &claims.uid).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(claims: web::ReqData<Claims>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "valid": true,
        "claims": claims.into_inner()
    }))
}
