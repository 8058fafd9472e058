use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{
    CommentRequest, CreateDiscussionRequest, DiscussionQuery, DiscussionResponse, LikeResponse,
    UpdateDiscussionRequest,
};
use crate::services::{discussion_service, user_service};
use crate::utils::{parse_object_id, AppError};

/// GET /api/v1/discussions - newest first, filter by department or author
#[get("")]
pub async fn list_discussions(
    db: web::Data<MongoDB>,
    query: web::Query<DiscussionQuery>,
) -> Result<HttpResponse, AppError> {
    let page = discussion_service::list(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(DiscussionResponse::from)))
}

/// GET /api/v1/discussions/{id}
#[get("/{id}")]
pub async fn get_discussion(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "discussion")?;
    let post = discussion_service::get(&db, id).await?;
    Ok(HttpResponse::Ok().json(DiscussionResponse::from(post)))
}

/// POST /api/v1/discussions
#[post("")]
pub async fn create_discussion(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateDiscussionRequest>,
) -> Result<HttpResponse, AppError> {
    let author = user_service::require_profile(&db, &claims).await?;
    log::info!("💬 POST /discussions - {} in {}", author.uid, request.department.as_str());

    let post = discussion_service::create(&db, &author, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(DiscussionResponse::from(post)))
}

/// PUT /api/v1/discussions/{id} - author or admin
#[put("/{id}")]
pub async fn update_discussion(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateDiscussionRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "discussion")?;
    let post = discussion_service::update(&db, &claims, id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DiscussionResponse::from(post)))
}

/// DELETE /api/v1/discussions/{id} - author or admin
#[delete("/{id}")]
pub async fn delete_discussion(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "discussion")?;
    discussion_service::delete(&db, &claims, id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Discussion deleted"
    })))
}

/// POST /api/v1/discussions/{id}/comments
#[post("/{id}/comments")]
pub async fn add_comment(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<CommentRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "discussion")?;
    let author = user_service::require_profile(&db, &claims).await?;
    let post = discussion_service::add_comment(&db, &author, id, &request.content).await?;
    Ok(HttpResponse::Created().json(DiscussionResponse::from(post)))
}

/// DELETE /api/v1/discussions/{id}/comments/{comment_id} - comment author or admin
#[delete("/{id}/comments/{comment_id}")]
pub async fn delete_comment(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, comment_id) = path.into_inner();
    let id = parse_object_id(&id, "discussion")?;
    let comment_id = parse_object_id(&comment_id, "comment")?;
    let post = discussion_service::delete_comment(&db, &claims, id, comment_id).await?;
    Ok(HttpResponse::Ok().json(DiscussionResponse::from(post)))
}

/// POST /api/v1/discussions/{id}/like - toggles the caller's like
#[post("/{id}/like")]
pub async fn toggle_like(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "discussion")?;
    let (liked, like_count) = discussion_service::toggle_like(&db, &claims.uid, id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse {
        success: true,
        liked,
        like_count,
    }))
}

#[cfg(test)]
mod tests {
    use crate::models::Role;
    use crate::test_support::{claims, seed_user, test_app, test_db, StaticIdentity};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn identity() -> Arc<StaticIdentity> {
        Arc::new(
            StaticIdentity::new()
                .with_token("author", claims("s-1", "asha@college.edu", Some(Role::Student)))
                .with_token("other", claims("s-2", "kiran@college.edu", Some(Role::Student)))
                .with_token("admin", claims("adm", "dean@college.edu", Some(Role::Admin))),
        )
    }

    fn with_token(req: test::TestRequest, token: &str) -> test::TestRequest {
        req.insert_header(("Authorization", format!("Bearer {}", token)))
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn only_author_or_admin_may_delete() {
        let db = test_db().await;
        seed_user(&db, "s-1", "asha@college.edu", Role::Student).await;
        let app = test_app!(db, identity());

        let req = with_token(test::TestRequest::post().uri("/api/v1/discussions"), "author")
            .set_json(json!({ "department": "CSE", "title": "Placements", "content": "Tips?" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/discussions/{}", id);

        let req = with_token(test::TestRequest::delete().uri(&uri), "other").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = with_token(test::TestRequest::delete().uri(&uri), "admin").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = with_token(test::TestRequest::get().uri(&uri), "other").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn likes_toggle_and_comments_append() {
        let db = test_db().await;
        seed_user(&db, "s-1", "asha@college.edu", Role::Student).await;
        seed_user(&db, "s-2", "kiran@college.edu", Role::Student).await;
        let app = test_app!(db, identity());

        let req = with_token(test::TestRequest::post().uri("/api/v1/discussions"), "author")
            .set_json(json!({ "department": "ECE", "title": "Labs", "content": "Schedule" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let base = format!("/api/v1/discussions/{}", created["id"].as_str().unwrap());

        let like = || with_token(test::TestRequest::post().uri(&format!("{}/like", base)), "other").to_request();
        let body: Value = test::call_and_read_body_json(&app, like()).await;
        assert_eq!(body["liked"], true);
        assert_eq!(body["likeCount"], 1);
        let body: Value = test::call_and_read_body_json(&app, like()).await;
        assert_eq!(body["liked"], false);
        assert_eq!(body["likeCount"], 0);

        let req = with_token(test::TestRequest::post().uri(&format!("{}/comments", base)), "other")
            .set_json(json!({ "content": "Thursday works" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["commentCount"], 1);
        assert_eq!(body["comments"][0]["author"]["uid"], "s-2");

        let req = with_token(test::TestRequest::get().uri("/api/v1/discussions?department=ECE"), "other").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
    }
}
