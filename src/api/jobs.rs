use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::{ensure_role, Claims};
use crate::models::{CreateJobRequest, JobQuery, JobResponse, Role, UpdateJobRequest};
use crate::services::{job_service, user_service};
use crate::utils::{parse_object_id, AppError};

const POSTER_ROLES: [Role; 2] = [Role::Alumni, Role::Admin];

/// GET /api/v1/jobs - filter by `mode` and company prefix
#[get("")]
pub async fn list_jobs(db: web::Data<MongoDB>, query: web::Query<JobQuery>) -> Result<HttpResponse, AppError> {
    let page = job_service::list(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(JobResponse::from)))
}

/// GET /api/v1/jobs/{id}
#[get("/{id}")]
pub async fn get_job(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "job")?;
    let job = job_service::get(&db, id).await?;
    Ok(HttpResponse::Ok().json(JobResponse::from(job)))
}

/// POST /api/v1/jobs - alumni and admins
#[post("")]
pub async fn create_job(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateJobRequest>,
) -> Result<HttpResponse, AppError> {
    ensure_role(&claims, &POSTER_ROLES)?;
    let poster = user_service::require_profile(&db, &claims).await?;
    log::info!("💼 POST /jobs - {} at {} by {}", request.role, request.company, poster.uid);

    let job = job_service::create(&db, &poster, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(JobResponse::from(job)))
}

/// PUT /api/v1/jobs/{id} - poster or admin
#[put("/{id}")]
pub async fn update_job(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateJobRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "job")?;
    let job = job_service::update(&db, &claims, id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse::from(job)))
}

/// DELETE /api/v1/jobs/{id} - poster or admin
#[delete("/{id}")]
pub async fn delete_job(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "job")?;
    job_service::delete(&db, &claims, id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Job deleted"
    })))
}

#[cfg(test)]
mod tests {
    use crate::models::Role;
    use crate::test_support::{claims, seed_user, test_app, test_db, StaticIdentity};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn students_cannot_post_jobs() {
        let db = test_db().await;
        seed_user(&db, "a-1", "ravi@corp.com", Role::Alumni).await;
        seed_user(&db, "s-1", "asha@college.edu", Role::Student).await;
        let identity = Arc::new(
            StaticIdentity::new()
                .with_token("alum", claims("a-1", "ravi@corp.com", Some(Role::Alumni)))
                .with_token("student", claims("s-1", "asha@college.edu", Some(Role::Student))),
        );
        let app = test_app!(db, identity);

        let job = json!({
            "company": "Acme",
            "role": "Backend Intern",
            "mode": "remote",
            "link": "https://acme.example/jobs/1",
            "description": "Rust services"
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/jobs")
            .insert_header(("Authorization", "Bearer student"))
            .set_json(&job)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/v1/jobs")
            .insert_header(("Authorization", "Bearer alum"))
            .set_json(&job)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["postedBy"]["uid"], "a-1");

        let req = test::TestRequest::get()
            .uri("/api/v1/jobs?mode=remote&company=ac")
            .insert_header(("Authorization", "Bearer student"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
    }
}
