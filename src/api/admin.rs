use actix_web::{delete, get, patch, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{ChangeRoleRequest, Role, UserListQuery, UserResponse, VerifyUserRequest};
use crate::services::identity_service::IdentityProvider;
use crate::services::user_service;
use crate::utils::AppError;

/// GET /api/v1/admin/users - full directory, same filters as /users
#[get("/users")]
pub async fn list_users(
    db: web::Data<MongoDB>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = user_service::list_users(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(UserResponse::from)))
}

/// GET /api/v1/admin/users/pending - alumni awaiting verification
#[get("/users/pending")]
pub async fn pending_users(
    db: web::Data<MongoDB>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = UserListQuery {
        role: Some(Role::Alumni),
        verified: Some(false),
        ..query.into_inner()
    };
    let page = user_service::list_users(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(UserResponse::from)))
}

/// An empty body means "verify"; anything else must be a valid `{verified}`.
fn verified_flag(body: &[u8]) -> Result<bool, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(true);
    }
    let request: VerifyUserRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid request body: {}", e)))?;
    Ok(request.verified.unwrap_or(true))
}

/// PATCH /api/v1/admin/users/{uid}/verify - `{verified}` defaults to true
#[patch("/users/{uid}/verify")]
pub async fn verify_user(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    identity: web::Data<dyn IdentityProvider>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let uid = path.into_inner();
    let verified = verified_flag(&body)?;
    log::info!("🛡️  PATCH /admin/users/{}/verify - {} by {}", uid, verified, admin.uid);

    let user = user_service::set_verified(&db, identity.get_ref(), &uid, verified).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

/// PATCH /api/v1/admin/users/{uid}/role
#[patch("/users/{uid}/role")]
pub async fn change_role(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    identity: web::Data<dyn IdentityProvider>,
    path: web::Path<String>,
    request: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let uid = path.into_inner();
    log::info!("🛡️  PATCH /admin/users/{}/role - {} by {}", uid, request.role, admin.uid);

    let user = user_service::change_role(&db, identity.get_ref(), &uid, request.role).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

/// DELETE /api/v1/admin/users/{uid} - profile and provider account
#[delete("/users/{uid}")]
pub async fn delete_user(
    admin: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    identity: web::Data<dyn IdentityProvider>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let uid = path.into_inner();
    if uid == admin.uid {
        return Err(AppError::InvalidRequest("Admins cannot delete their own account".to_string()));
    }
    log::info!("🗑️  DELETE /admin/users/{} by {}", uid, admin.uid);

    user_service::delete_user(&db, identity.get_ref(), &uid).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User deleted"
    })))
}

/// GET /api/v1/admin/stats
#[get("/stats")]
pub async fn stats(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let stats = user_service::stats(&db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "stats": stats
    })))
}

#[cfg(test)]
mod tests {
    use crate::database::collections;
    use crate::models::{Role, User};
    use crate::test_support::{claims, seed_user, test_app, test_db, StaticIdentity};
    use actix_web::{http::StatusCode, test};
    use mongodb::bson::doc;
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn identity() -> Arc<StaticIdentity> {
        Arc::new(
            StaticIdentity::new()
                .with_token("admin", claims("adm", "dean@college.edu", Some(Role::Admin)))
                .with_token("student", claims("s-1", "asha@college.edu", Some(Role::Student))),
        )
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn promotion_to_club_member_shows_in_profile() {
        let db = test_db().await;
        seed_user(&db, "adm", "dean@college.edu", Role::Admin).await;
        seed_user(&db, "s-1", "asha@college.edu", Role::Student).await;
        let identity = identity();
        let app = test_app!(db, identity.clone());

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/users/s-1/role")
            .insert_header(("Authorization", "Bearer admin"))
            .set_json(json!({ "role": "clubMember" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/v1/users/s-1")
            .insert_header(("Authorization", "Bearer student"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["role"], "clubMember");

        let updates = identity.claim_updates.lock().unwrap().clone();
        assert_eq!(updates, vec![("s-1".to_string(), Role::ClubMember, true)]);
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn role_change_is_undone_when_claims_fail() {
        let db = test_db().await;
        seed_user(&db, "adm", "dean@college.edu", Role::Admin).await;
        seed_user(&db, "s-1", "asha@college.edu", Role::Student).await;
        let identity = identity();
        identity.fail_claims.store(true, Ordering::SeqCst);
        let app = test_app!(db, identity.clone());

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/users/s-1/role")
            .insert_header(("Authorization", "Bearer admin"))
            .set_json(json!({ "role": "clubMember" }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_server_error());

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/users/s-1/verify")
            .insert_header(("Authorization", "Bearer admin"))
            .set_json(json!({ "verified": false }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_server_error());

        let stored = db
            .collection::<User>(collections::USERS)
            .find_one(doc! { "uid": "s-1" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::Student);
        assert!(stored.verified);
        assert!(identity.claim_updates.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn admin_scope_rejects_other_roles() {
        let db = test_db().await;
        let app = test_app!(db, identity());

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/stats")
            .insert_header(("Authorization", "Bearer student"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri("/api/v1/admin/stats").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn verification_defaults_to_true() {
        let db = test_db().await;
        seed_user(&db, "adm", "dean@college.edu", Role::Admin).await;
        seed_user(&db, "a-1", "ravi@corp.com", Role::Alumni).await;
        db.collection::<User>(collections::USERS)
            .update_one(doc! { "uid": "a-1" }, doc! { "$set": { "verified": false } })
            .await
            .unwrap();
        let identity = identity();
        let app = test_app!(db, identity.clone());

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/users/pending")
            .insert_header(("Authorization", "Bearer admin"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/users/a-1/verify")
            .insert_header(("Authorization", "Bearer admin"))
            .set_json(json!({ "verified": "false" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/users/pending")
            .insert_header(("Authorization", "Bearer admin"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/users/a-1/verify")
            .insert_header(("Authorization", "Bearer admin"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["verified"], true);

        let req = test::TestRequest::delete()
            .uri("/api/v1/admin/users/a-1")
            .insert_header(("Authorization", "Bearer admin"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(identity.deleted.lock().unwrap().clone(), vec!["a-1".to_string()]);
    }

    #[actix_web::test]
    async fn verify_body_defaults_only_when_empty() {
        assert_eq!(super::verified_flag(b"").unwrap(), true);
        assert_eq!(super::verified_flag(b"  \n").unwrap(), true);
        assert_eq!(super::verified_flag(br#"{"verified":false}"#).unwrap(), false);
        assert_eq!(super::verified_flag(b"{}").unwrap(), true);
        assert!(matches!(
            super::verified_flag(br#"{"verified":"false"}"#),
            Err(crate::utils::AppError::InvalidRequest(_))
        ));
    }
}
