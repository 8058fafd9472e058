use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::middleware::{ensure_role, Claims};
use crate::models::{AchievementQuery, AchievementResponse, Role};
use crate::services::{achievement_service, upload_service, user_service};
use crate::utils::{parse_object_id, AppError};

const POSTER_ROLES: [Role; 3] = [Role::Admin, Role::Alumni, Role::ClubMember];

/// GET /api/v1/achievements - six per page unless `limit` says otherwise
#[get("")]
pub async fn list_achievements(
    db: web::Data<MongoDB>,
    query: web::Query<AchievementQuery>,
) -> Result<HttpResponse, AppError> {
    let page = achievement_service::list(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(AchievementResponse::from)))
}

/// POST /api/v1/achievements - multipart `image` + `description`
#[post("")]
pub async fn create_achievement(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    ensure_role(&claims, &POSTER_ROLES)?;
    let poster = user_service::require_profile(&db, &claims).await?;

    let form = upload_service::read_image_form(payload, "image", config.max_upload_bytes).await?;
    let description = form.field("description").unwrap_or_default().to_string();
    if description.trim().is_empty() {
        return Err(AppError::InvalidRequest("Description is required".to_string()));
    }
    let image = form
        .image
        .ok_or_else(|| AppError::InvalidRequest("An image file is required".to_string()))?;

    let image_url = upload_service::save_image(&config.upload_dir, &image, config.max_upload_bytes).await?;
    let achievement = match achievement_service::create(&db, &poster, image_url.clone(), &description).await {
        Ok(achievement) => achievement,
        Err(e) => {
            upload_service::remove_image(&config.upload_dir, &image_url).await;
            return Err(e);
        }
    };

    Ok(HttpResponse::Created().json(AchievementResponse::from(achievement)))
}

/// DELETE /api/v1/achievements/{id} - poster or admin
#[delete("/{id}")]
pub async fn delete_achievement(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "achievement")?;
    let removed = achievement_service::delete(&db, &claims, id).await?;
    upload_service::remove_image(&config.upload_dir, &removed.image_url).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Achievement deleted"
    })))
}
