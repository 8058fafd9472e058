use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::user::Role;
use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EventCreator {
    pub uid: String,
    pub role: Role,
    pub name: String,
}

/// Event (collection: events)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub date: BsonDateTime,
    pub venue: String,
    /// Informational only, registrations are not capped
    pub capacity: Option<i32>,
    pub status: EventStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_by: EventCreator,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    /// RFC 3339 or `YYYY-MM-DD[THH:MM]`
    pub date: String,
    pub venue: String,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub venue: String,
    pub capacity: Option<i32>,
    pub status: EventStatus,
    pub image_url: Option<String>,
    pub created_by: EventCreator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_count: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        EventResponse {
            id: event.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: event.title,
            description: event.description,
            date: to_rfc3339(event.date),
            venue: event.venue,
            capacity: event.capacity,
            status: event.status,
            image_url: event.image_url,
            created_by: event.created_by,
            registration_count: None,
            created_at: to_rfc3339(event.created_at),
            updated_at: to_rfc3339(event.updated_at),
        }
    }
}
