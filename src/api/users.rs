use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{Role, UpdateProfileRequest, UserListQuery, UserResponse};
use crate::services::{upload_service, user_service};
use crate::utils::AppError;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(
        ("role" = Option<String>, Query, description = "student, alumni, admin or clubMember"),
        ("department" = Option<String>, Query, description = "Department code, e.g. CSE"),
        ("batch" = Option<i32>, Query, description = "Graduation year"),
        ("verified" = Option<bool>, Query, description = "Verification flag"),
        ("search" = Option<String>, Query, description = "Case-insensitive name match"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size, max 100")
    ),
    responses(
        (status = 200, description = "Paginated user directory")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    db: web::Data<MongoDB>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = user_service::list_users(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(UserResponse::from)))
}

/// Verified alumni only; the other directory filters still apply.
#[utoipa::path(
    get,
    path = "/api/v1/users/alumni",
    tag = "Users",
    responses(
        (status = 200, description = "Paginated list of verified alumni")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_alumni(
    db: web::Data<MongoDB>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = UserListQuery {
        role: Some(Role::Alumni),
        verified: Some(true),
        ..query.into_inner()
    };
    let page = user_service::list_users(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(UserResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 404, description = "Not registered yet")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_profile(claims: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let user = user_service::get_by_uid(&db, &claims.uid).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid field")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_my_profile(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️  PUT /users/me - uid: {}", claims.uid);
    let user = user_service::update_profile(&db, &claims.uid, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// POST /api/v1/users/me/photo - multipart `image`
pub async fn upload_my_photo(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let current = user_service::require_profile(&db, &claims).await?;

    let form = upload_service::read_image_form(payload, "image", config.max_upload_bytes).await?;
    let image = form
        .image
        .ok_or_else(|| AppError::InvalidRequest("An image file is required".to_string()))?;
    let url = upload_service::save_image(&config.upload_dir, &image, config.max_upload_bytes).await?;

    let user = user_service::set_photo(&db, &claims.uid, &url).await?;
    if let Some(previous) = current.photo_url.as_deref() {
        upload_service::remove_image(&config.upload_dir, previous).await;
    }

    log::info!("🖼️  Profile photo updated for {}", claims.uid);
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{uid}",
    tag = "Users",
    params(
        ("uid" = String, Path, description = "Identity-provider uid")
    ),
    responses(
        (status = 200, description = "Public profile", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = user_service::get_by_uid(&db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
