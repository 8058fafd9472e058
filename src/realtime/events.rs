use serde::{Deserialize, Serialize};

use crate::models::MessageResponse;

/// Frames a client may send over the socket.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    Send { receiver_uid: String, text: String },
    #[serde(rename_all = "camelCase")]
    Read { conversation_id: String },
    Ping,
}

/// Frames pushed by the server.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    Message {
        message: MessageResponse,
    },
    #[serde(rename_all = "camelCase")]
    Read {
        conversation_id: String,
        reader_uid: String,
    },
    Error {
        message: String,
    },
    Pong,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data enum: serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","message":"encode"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_frames() {
        let send: ClientEvent =
            serde_json::from_str(r#"{"type":"send","receiverUid":"u2","text":"hello"}"#).unwrap();
        assert_eq!(
            send,
            ClientEvent::Send {
                receiver_uid: "u2".to_string(),
                text: "hello".to_string()
            }
        );

        let read: ClientEvent =
            serde_json::from_str(r#"{"type":"read","conversationId":"abc"}"#).unwrap();
        assert_eq!(
            read,
            ClientEvent::Read {
                conversation_id: "abc".to_string()
            }
        );

        assert_eq!(serde_json::from_str::<ClientEvent>(r#"{"type":"ping"}"#).unwrap(), ClientEvent::Ping);
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn server_frames_are_tagged() {
        let value: serde_json::Value = serde_json::from_str(&ServerEvent::Pong.to_json()).unwrap();
        assert_eq!(value, json!({ "type": "pong" }));

        let read = ServerEvent::Read {
            conversation_id: "c1".to_string(),
            reader_uid: "u1".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&read.to_json()).unwrap();
        assert_eq!(value, json!({ "type": "read", "conversationId": "c1", "readerUid": "u1" }));

        let value: serde_json::Value = serde_json::from_str(&ServerEvent::error("nope").to_json()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "nope");
    }
}
