use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::user::Role;
use crate::utils::time::to_rfc3339;

/// A user's sign-up for an event (collection: registrations). Name, email and
/// role are copied from the profile at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event_id: ObjectId,
    pub user_uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub registered_at: BsonDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub event_id: String,
    pub user_uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub registered_at: String,
}

impl From<Registration> for RegistrationResponse {
    fn from(reg: Registration) -> Self {
        RegistrationResponse {
            id: reg.id.map(|id| id.to_hex()).unwrap_or_default(),
            event_id: reg.event_id.to_hex(),
            user_uid: reg.user_uid,
            name: reg.name,
            email: reg.email,
            role: reg.role,
            registered_at: to_rfc3339(reg.registered_at),
        }
    }
}
