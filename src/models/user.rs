use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::department::Department;
use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Student,
    Alumni,
    Admin,
    ClubMember,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Alumni, Role::Admin, Role::ClubMember];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
            Role::Admin => "admin",
            Role::ClubMember => "clubMember",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile document (collection: users). `uid` is the identity provider's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub uid: String,
    pub email: String,
    pub name: String,
    pub department: Option<Department>,
    /// Graduation year
    pub batch: Option<i32>,
    pub role: Role,
    pub verified: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub name: String,
    pub department: Option<Department>,
    pub batch: Option<i32>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub department: Option<Department>,
    pub batch: Option<i32>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyUserRequest {
    pub verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub batch: Option<i32>,
    pub verified: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub uid: String,
    pub email: String,
    pub name: String,
    pub department: Option<Department>,
    pub batch: Option<i32>,
    pub role: Role,
    pub verified: bool,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            uid: user.uid,
            email: user.email,
            name: user.name,
            department: user.department,
            batch: user.batch,
            role: user.role,
            verified: user.verified,
            photo_url: user.photo_url,
            bio: user.bio,
            linkedin: user.linkedin,
            company: user.company,
            designation: user.designation,
            created_at: to_rfc3339(user.created_at),
            updated_at: to_rfc3339(user.updated_at),
        }
    }
}

/// Minimal public view used inside conversations and listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub uid: String,
    pub name: String,
    pub role: Role,
    pub photo_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            uid: user.uid.clone(),
            name: user.name.clone(),
            role: user.role,
            photo_url: user.photo_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_camel_case_names() {
        assert_eq!(serde_json::to_string(&Role::ClubMember).unwrap(), "\"clubMember\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"student\"").unwrap(),
            Role::Student
        );
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }
}
