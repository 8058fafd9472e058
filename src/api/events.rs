use actix_web::{delete, get, http::header, post, put, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::{ensure_role, Claims};
use crate::models::{
    CreateEventRequest, EventQuery, EventResponse, RegistrationResponse, Role, UpdateEventRequest,
};
use crate::services::{event_service, export_service, user_service};
use crate::utils::{parse_object_id, AppError};

const ORGANIZER_ROLES: [Role; 3] = [Role::Admin, Role::Alumni, Role::ClubMember];

/// GET /api/v1/events - `status` filter; upcoming soonest first
#[get("")]
pub async fn list_events(db: web::Data<MongoDB>, query: web::Query<EventQuery>) -> Result<HttpResponse, AppError> {
    let page = event_service::list(&db, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(EventResponse::from)))
}

/// GET /api/v1/events/registrations/me
#[get("/registrations/me")]
pub async fn my_registrations(claims: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let list = event_service::my_registrations(&db, &claims.uid).await?;
    let items: Vec<RegistrationResponse> = list.into_iter().map(RegistrationResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": items.len(),
        "items": items
    })))
}

/// GET /api/v1/events/{id} - includes the registration count
#[get("/{id}")]
pub async fn get_event(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    let event = event_service::get(&db, id).await?;
    let count = event_service::registration_count(&db, id).await?;

    let mut response = EventResponse::from(event);
    response.registration_count = Some(count);
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/events - admins, alumni and club members
#[post("")]
pub async fn create_event(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, AppError> {
    ensure_role(&claims, &ORGANIZER_ROLES)?;
    let creator = user_service::require_profile(&db, &claims).await?;
    log::info!("📅 POST /events - '{}' by {}", request.title, creator.uid);

    let event = event_service::create(&db, &creator, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(EventResponse::from(event)))
}

/// PUT /api/v1/events/{id} - creator or admin
#[put("/{id}")]
pub async fn update_event(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    let event = event_service::update(&db, &claims, id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EventResponse::from(event)))
}

/// DELETE /api/v1/events/{id} - creator or admin
#[delete("/{id}")]
pub async fn delete_event(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    event_service::delete(&db, &claims, id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Event deleted"
    })))
}

/// POST /api/v1/events/{id}/register
#[post("/{id}/register")]
pub async fn register_for_event(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    let user = user_service::require_profile(&db, &claims).await?;
    let registration = event_service::register(&db, &user, id).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "registration": RegistrationResponse::from(registration)
    })))
}

/// DELETE /api/v1/events/{id}/register
#[delete("/{id}/register")]
pub async fn unregister_from_event(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    event_service::unregister(&db, &claims.uid, id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Registration cancelled"
    })))
}

/// GET /api/v1/events/{id}/registrations - creator or admin
#[get("/{id}/registrations")]
pub async fn list_registrations(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    let (_, list) = event_service::registrations_for(&db, &claims, id).await?;
    let items: Vec<RegistrationResponse> = list.into_iter().map(RegistrationResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": items.len(),
        "items": items
    })))
}

/// GET /api/v1/events/{id}/registrations/export - xlsx attachment
#[get("/{id}/registrations/export")]
pub async fn export_registrations(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "event")?;
    let (event, list) = event_service::registrations_for(&db, &claims, id).await?;

    let bytes = export_service::registrations_workbook(&list)?;
    let file_name = export_service::export_file_name(&event.title);
    log::info!("📊 Exported {} registrations for '{}' ({} bytes)", list.len(), event.title, bytes.len());

    Ok(HttpResponse::Ok()
        .content_type(export_service::XLSX_CONTENT_TYPE)
        .insert_header((header::CONTENT_DISPOSITION, export_service::attachment_header(&file_name)))
        .body(bytes))
}
