use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::time::to_rfc3339;

pub const ACHIEVEMENTS_PAGE_SIZE: u64 = 6;

/// Showcase entry (collection: achievements)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub image_url: String,
    pub description: String,
    pub posted_by_uid: String,
    pub posted_by_name: String,
    pub created_at: BsonDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct AchievementQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub posted_by: String,
    pub posted_by_uid: String,
    pub created_at: String,
}

impl From<Achievement> for AchievementResponse {
    fn from(a: Achievement) -> Self {
        AchievementResponse {
            id: a.id.map(|id| id.to_hex()).unwrap_or_default(),
            image_url: a.image_url,
            description: a.description,
            posted_by: a.posted_by_name,
            posted_by_uid: a.posted_by_uid,
            created_at: to_rfc3339(a.created_at),
        }
    }
}
