use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;
use crate::utils::time::{opt_to_rfc3339, to_rfc3339};

/// Two-party thread (collection: conversations). `participant_key` is the
/// sorted pair joined with `:` and carries a unique index, so the pair maps
/// to exactly one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub participant_key: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<BsonDateTime>,
    #[serde(default)]
    pub last_sender_uid: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl Conversation {
    /// Sorted participants and the key derived from them.
    pub fn participants_for(a: &str, b: &str) -> (String, Vec<String>) {
        let mut pair = vec![a.to_string(), b.to_string()];
        pair.sort();
        (pair.join(":"), pair)
    }

    pub fn includes(&self, uid: &str) -> bool {
        self.participants.iter().any(|p| p == uid)
    }

    pub fn other_participant(&self, uid: &str) -> Option<&str> {
        if !self.includes(uid) {
            return None;
        }
        self.participants
            .iter()
            .map(String::as_str)
            .find(|p| *p != uid)
    }
}

/// Direct message (collection: messages)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub conversation_id: ObjectId,
    pub sender_uid: String,
    pub receiver_uid: String,
    pub text: String,
    pub read: bool,
    pub created_at: BsonDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub participant_uid: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageHistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_uid: String,
    pub receiver_uid: String,
    pub text: String,
    pub read: bool,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        MessageResponse {
            id: message.id.map(|id| id.to_hex()).unwrap_or_default(),
            conversation_id: message.conversation_id.to_hex(),
            sender_uid: message.sender_uid,
            receiver_uid: message.receiver_uid,
            text: message.text,
            read: message.read,
            created_at: to_rfc3339(message.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participants: Vec<String>,
    pub other_participant: Option<UserSummary>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub last_sender_uid: Option<String>,
    pub unread_count: u64,
    pub created_at: String,
}

impl ConversationResponse {
    pub fn new(conversation: Conversation, other: Option<UserSummary>, unread_count: u64) -> Self {
        ConversationResponse {
            id: conversation.id.map(|id| id.to_hex()).unwrap_or_default(),
            participants: conversation.participants,
            other_participant: other,
            last_message: conversation.last_message,
            last_message_at: opt_to_rfc3339(conversation.last_message_at),
            last_sender_uid: conversation.last_sender_uid,
            unread_count,
            created_at: to_rfc3339(conversation.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(a: &str, b: &str) -> Conversation {
        let (participant_key, participants) = Conversation::participants_for(a, b);
        Conversation {
            id: None,
            participant_key,
            participants,
            last_message: None,
            last_message_at: None,
            last_sender_uid: None,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        }
    }

    #[test]
    fn key_is_independent_of_argument_order() {
        let (k1, p1) = Conversation::participants_for("zoe", "adam");
        let (k2, p2) = Conversation::participants_for("adam", "zoe");
        assert_eq!(k1, "adam:zoe");
        assert_eq!(k1, k2);
        assert_eq!(p1, p2);
    }

    #[test]
    fn other_participant_requires_membership() {
        let conv = conversation("adam", "zoe");
        assert_eq!(conv.other_participant("adam"), Some("zoe"));
        assert_eq!(conv.other_participant("zoe"), Some("adam"));
        assert_eq!(conv.other_participant("eve"), None);
        assert!(!conv.includes("eve"));
    }
}
