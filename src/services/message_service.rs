use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::ReturnDocument;
use std::collections::HashMap;

use crate::database::{collections, is_duplicate_key, MongoDB};
use crate::models::{Conversation, ConversationResponse, Message, User, UserSummary};
use crate::utils::{AppError, PageRequest, Paginated};

pub const MAX_MESSAGE_LEN: usize = 2_000;
const HISTORY_PAGE_SIZE: u64 = 30;

fn conversations(db: &MongoDB) -> mongodb::Collection<Conversation> {
    db.collection::<Conversation>(collections::CONVERSATIONS)
}

fn messages(db: &MongoDB) -> mongodb::Collection<Message> {
    db.collection::<Message>(collections::MESSAGES)
}

pub fn validate_message_text(text: &str) -> Result<String, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidRequest("Message text is required".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LEN
        )));
    }
    Ok(text.to_string())
}

/// Returns the single conversation for the pair, creating it if needed. The
/// upsert on the unique participant key makes concurrent calls from both
/// sides converge on one document.
pub async fn get_or_create_conversation(
    db: &MongoDB,
    me: &str,
    other: &str,
) -> Result<Conversation, AppError> {
    if me == other {
        return Err(AppError::InvalidRequest("Cannot start a conversation with yourself".to_string()));
    }

    let other_exists = db
        .collection::<User>(collections::USERS)
        .count_documents(doc! { "uid": other })
        .await?;
    if other_exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let (participant_key, participants) = Conversation::participants_for(me, other);
    let now = BsonDateTime::now();
    let filter = doc! { "participant_key": &participant_key };
    let upsert = conversations(db)
        .find_one_and_update(
            filter.clone(),
            doc! {
                "$setOnInsert": {
                    "participant_key": &participant_key,
                    "participants": &participants,
                    "created_at": now,
                    "updated_at": now,
                }
            },
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await;

    match upsert {
        Ok(Some(conversation)) => Ok(conversation),
        Ok(None) => Err(AppError::Internal("Upsert returned no conversation".to_string())),
        // Lost the race against the other participant's upsert: read theirs
        Err(e) if is_duplicate_key(&e) => conversations(db)
            .find_one(filter)
            .await?
            .ok_or_else(|| AppError::Internal("Conversation vanished after conflict".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Loads a conversation and checks that `uid` takes part in it.
pub async fn conversation_for(db: &MongoDB, id: ObjectId, uid: &str) -> Result<Conversation, AppError> {
    let conversation = conversations(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    if !conversation.includes(uid) {
        return Err(AppError::Forbidden("You are not part of this conversation".to_string()));
    }
    Ok(conversation)
}

/// Caller's conversations, most recent activity first, with the other
/// participant's profile summary and the caller's unread count.
pub async fn list_conversations(db: &MongoDB, uid: &str) -> Result<Vec<ConversationResponse>, AppError> {
    let list: Vec<Conversation> = conversations(db)
        .find(doc! { "participants": uid })
        .sort(doc! { "updated_at": -1 })
        .await?
        .try_collect()
        .await?;

    let other_uids: Vec<String> = list
        .iter()
        .filter_map(|c| c.other_participant(uid).map(str::to_string))
        .collect();

    let profiles: HashMap<String, UserSummary> = db
        .collection::<User>(collections::USERS)
        .find(doc! { "uid": { "$in": &other_uids } })
        .await?
        .try_collect::<Vec<User>>()
        .await?
        .iter()
        .map(|user| (user.uid.clone(), UserSummary::from(user)))
        .collect();

    let mut responses = Vec::with_capacity(list.len());
    for conversation in list {
        let unread = match conversation.id {
            Some(id) => {
                messages(db)
                    .count_documents(doc! { "conversation_id": id, "receiver_uid": uid, "read": false })
                    .await?
            }
            None => 0,
        };
        let other = conversation
            .other_participant(uid)
            .and_then(|other| profiles.get(other).cloned());
        responses.push(ConversationResponse::new(conversation, other, unread));
    }

    Ok(responses)
}

/// One page of history. Pages count back from the newest message; items
/// within a page are oldest first so the client can append them directly.
pub async fn history(
    db: &MongoDB,
    conversation_id: ObjectId,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Paginated<Message>, AppError> {
    let page = PageRequest::new(page, limit, HISTORY_PAGE_SIZE);
    let filter = doc! { "conversation_id": conversation_id };

    let total = messages(db).count_documents(filter.clone()).await?;
    let mut items: Vec<Message> = messages(db)
        .find(filter)
        .sort(doc! { "created_at": -1, "_id": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;
    items.reverse();

    Ok(Paginated::new(items, page, total))
}

/// Persists a message and refreshes the conversation's last-message cache.
pub async fn send_message(
    db: &MongoDB,
    conversation: &Conversation,
    sender_uid: &str,
    text: &str,
) -> Result<Message, AppError> {
    let text = validate_message_text(text)?;
    let conversation_id = conversation
        .id
        .ok_or_else(|| AppError::Internal("Conversation has no id".to_string()))?;
    let receiver_uid = conversation
        .other_participant(sender_uid)
        .ok_or_else(|| AppError::Forbidden("You are not part of this conversation".to_string()))?
        .to_string();

    let now = BsonDateTime::now();
    let mut message = Message {
        id: None,
        conversation_id,
        sender_uid: sender_uid.to_string(),
        receiver_uid,
        text,
        read: false,
        created_at: now,
    };

    let result = messages(db).insert_one(&message).await?;
    message.id = result.inserted_id.as_object_id();

    conversations(db)
        .update_one(
            doc! { "_id": conversation_id },
            doc! {
                "$set": {
                    "last_message": &message.text,
                    "last_message_at": now,
                    "last_sender_uid": sender_uid,
                    "updated_at": now,
                }
            },
        )
        .await?;

    Ok(message)
}

/// Marks every message addressed to `reader_uid` in the conversation as read.
pub async fn mark_read(db: &MongoDB, conversation_id: ObjectId, reader_uid: &str) -> Result<u64, AppError> {
    let result = messages(db)
        .update_many(
            doc! { "conversation_id": conversation_id, "receiver_uid": reader_uid, "read": false },
            doc! { "$set": { "read": true } },
        )
        .await?;
    Ok(result.modified_count)
}
