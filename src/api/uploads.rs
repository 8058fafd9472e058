use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse};

use crate::config::AppConfig;
use crate::middleware::Claims;
use crate::services::upload_service;
use crate::utils::AppError;

/// POST /api/v1/uploads/image - multipart `image`, returns `{url}`
pub async fn upload_image(
    claims: web::ReqData<Claims>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = upload_service::read_image_form(payload, "image", config.max_upload_bytes).await?;
    let image = form
        .image
        .ok_or_else(|| AppError::InvalidRequest("An image file is required".to_string()))?;

    let url = upload_service::save_image(&config.upload_dir, &image, config.max_upload_bytes).await?;
    log::info!("📤 Image uploaded by {}: {}", claims.uid, url);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "url": url
    })))
}

/// GET /uploads/{file}
pub async fn serve_upload(
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let file = upload_service::stored_path(&config.upload_dir, &name)
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found".to_string()))
        }
        Err(e) => return Err(AppError::Internal(format!("Failed to read upload: {}", e))),
    };

    Ok(HttpResponse::Ok()
        .content_type(upload_service::content_type_for(&name))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_app, test_db, StaticIdentity};
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn unknown_or_foreign_names_are_not_served() {
        let db = test_db().await;
        let app = test_app!(db, Arc::new(StaticIdentity::new()));

        let missing = format!("/uploads/{}.png", uuid::Uuid::new_v4());
        for uri in ["/uploads/passwd", "/uploads/..%2Fsecret.png", missing.as_str()] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::post().uri("/api/v1/uploads/image").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
