use actix_web::{get, patch, post, web, HttpResponse};

use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{
    ConversationResponse, MessageHistoryQuery, MessageResponse, SendMessageRequest, StartConversationRequest,
    User, UserSummary,
};
use crate::realtime::{self, SocketRegistry};
use crate::services::{message_service, user_service};
use crate::utils::{parse_object_id, AppError};

/// GET /api/v1/messages/conversations - most recent activity first
#[get("/conversations")]
pub async fn list_conversations(claims: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let conversations = message_service::list_conversations(&db, &claims.uid).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": conversations.len(),
        "items": conversations
    })))
}

/// POST /api/v1/messages/conversations - get or create the thread with `participantUid`
#[post("/conversations")]
pub async fn start_conversation(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<StartConversationRequest>,
) -> Result<HttpResponse, AppError> {
    user_service::require_profile(&db, &claims).await?;
    let other_uid = request.into_inner().participant_uid;

    let conversation = message_service::get_or_create_conversation(&db, &claims.uid, &other_uid).await?;
    let other: User = user_service::get_by_uid(&db, &other_uid).await?;
    Ok(HttpResponse::Ok().json(ConversationResponse::new(
        conversation,
        Some(UserSummary::from(&other)),
        0,
    )))
}

/// GET /api/v1/messages/conversations/{id}/messages - chronological within the page
#[get("/conversations/{id}/messages")]
pub async fn get_messages(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    query: web::Query<MessageHistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "conversation")?;
    message_service::conversation_for(&db, id, &claims.uid).await?;

    let page = message_service::history(&db, id, query.page, query.limit).await?;
    Ok(HttpResponse::Ok().json(page.map(MessageResponse::from)))
}

/// POST /api/v1/messages/conversations/{id}/messages - stores and relays
#[post("/conversations/{id}/messages")]
pub async fn send_message(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    registry: web::Data<SocketRegistry>,
    path: web::Path<String>,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "conversation")?;
    let conversation = message_service::conversation_for(&db, id, &claims.uid).await?;

    let message = message_service::send_message(&db, &conversation, &claims.uid, &request.text).await?;
    let response = MessageResponse::from(message);
    realtime::push_message(&registry, &response).await;

    Ok(HttpResponse::Created().json(response))
}

/// PATCH /api/v1/messages/conversations/{id}/read
#[patch("/conversations/{id}/read")]
pub async fn mark_read(
    claims: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    registry: web::Data<SocketRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path, "conversation")?;
    let conversation = message_service::conversation_for(&db, id, &claims.uid).await?;

    let updated = message_service::mark_read(&db, id, &claims.uid).await?;
    if updated > 0 {
        realtime::push_read(&registry, &conversation, &claims.uid).await;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updated": updated
    })))
}
