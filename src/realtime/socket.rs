use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message as WsMessage;
use serde::Deserialize;

use super::events::{ClientEvent, ServerEvent};
use super::SocketRegistry;
use crate::api::metrics;
use crate::database::MongoDB;
use crate::middleware::auth::bearer_token;
use crate::models::{Conversation, MessageResponse};
use crate::services::identity_service::IdentityProvider;
use crate::services::{message_service, user_service};
use crate::utils::{parse_object_id, AppError};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// Writes a frame to every open socket of `uid`. Sockets that refuse the
/// write are closed and dropped from the registry.
pub async fn send_to(registry: &SocketRegistry, uid: &str, frame: &str) {
    for (id, mut session) in registry.handles(uid).await {
        if session.text(frame.to_string()).await.is_err() {
            registry.unregister(uid, id).await;
        }
    }
}

/// Relays a stored message to both participants, including the sender's other tabs.
pub async fn push_message(registry: &SocketRegistry, message: &MessageResponse) {
    let frame = ServerEvent::Message {
        message: message.clone(),
    }
    .to_json();

    send_to(registry, &message.receiver_uid, &frame).await;
    send_to(registry, &message.sender_uid, &frame).await;
    metrics::increment_messages_relayed();
}

/// Tells both participants that `reader_uid` has read the conversation.
pub async fn push_read(registry: &SocketRegistry, conversation: &Conversation, reader_uid: &str) {
    let frame = ServerEvent::Read {
        conversation_id: conversation.id.map(|id| id.to_hex()).unwrap_or_default(),
        reader_uid: reader_uid.to_string(),
    }
    .to_json();

    for uid in &conversation.participants {
        send_to(registry, uid, &frame).await;
    }
}

/// GET /ws?token=<id token> - upgrades to the messaging socket
pub async fn connect(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<SocketQuery>,
    db: web::Data<MongoDB>,
    identity: web::Data<dyn IdentityProvider>,
    registry: web::Data<SocketRegistry>,
) -> Result<HttpResponse, AppError> {
    let token = query
        .into_inner()
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer_token(req.headers()))
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let claims = identity.verify_token(&token).await.map_err(|e| {
        log::warn!("⚠️  Socket rejected: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;
    user_service::require_profile(&db, &claims).await?;

    let (response, session, stream) = actix_ws::handle(&req, body)
        .map_err(|e| AppError::InvalidRequest(format!("WebSocket handshake failed: {}", e)))?;

    let uid = claims.uid;
    let db = db.get_ref().clone();
    let registry = registry.get_ref().clone();

    actix_rt::spawn(async move {
        let connection_id = registry.register(&uid, session.clone()).await;
        metrics::socket_opened();
        log::info!("🔌 Socket opened for {} ({} open)", uid, registry.connection_count().await);

        let mut session = session;
        let mut stream = stream;
        let mut close_reason = None;

        while let Some(Ok(frame)) = stream.recv().await {
            match frame {
                WsMessage::Text(text) => {
                    if let Err(e) = handle_frame(&db, &registry, &uid, &mut session, &text).await {
                        let reply = ServerEvent::error(e.public_message()).to_json();
                        if session.text(reply).await.is_err() {
                            break;
                        }
                    }
                }
                WsMessage::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                WsMessage::Close(reason) => {
                    close_reason = reason;
                    break;
                }
                _ => {}
            }
        }

        registry.unregister(&uid, connection_id).await;
        metrics::socket_closed();
        if registry.is_online(&uid).await {
            log::info!("🔌 Socket closed for {} (other tabs still open)", uid);
        } else {
            log::info!("🔌 Socket closed for {}", uid);
        }
        let _ = session.close(close_reason).await;
    });

    Ok(response)
}

async fn handle_frame(
    db: &MongoDB,
    registry: &SocketRegistry,
    uid: &str,
    session: &mut actix_ws::Session,
    raw: &str,
) -> Result<(), AppError> {
    let event: ClientEvent = serde_json::from_str(raw)
        .map_err(|e| AppError::InvalidRequest(format!("Unrecognised event: {}", e)))?;

    match event {
        ClientEvent::Send { receiver_uid, text } => {
            let conversation = message_service::get_or_create_conversation(db, uid, &receiver_uid).await?;
            let message = message_service::send_message(db, &conversation, uid, &text).await?;
            push_message(registry, &MessageResponse::from(message)).await;
        }
        ClientEvent::Read { conversation_id } => {
            let id = parse_object_id(&conversation_id, "conversation")?;
            let conversation = message_service::conversation_for(db, id, uid).await?;
            message_service::mark_read(db, id, uid).await?;
            push_read(registry, &conversation, uid).await;
        }
        ClientEvent::Ping => {
            // A closed session ends the read loop on its next poll
            let _ = session.text(ServerEvent::Pong.to_json()).await;
        }
    }

    Ok(())
}
