use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::department::Department;
use super::user::Role;
use crate::utils::time::to_rfc3339;

/// Discussion board post (collection: discussions). Comments and likes are
/// embedded in the post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub department: Department,
    pub title: String,
    pub content: String,
    pub author_uid: String,
    pub author_name: String,
    pub author_role: Role,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// uids of users who liked the post
    #[serde(default)]
    pub likes: Vec<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub author_uid: String,
    pub author_name: String,
    pub content: String,
    pub created_at: BsonDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscussionRequest {
    pub department: Department,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDiscussionRequest {
    pub department: Option<Department>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscussionQuery {
    pub department: Option<Department>,
    /// uid of the author
    pub author: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub author: AuthorSummary,
    pub content: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        CommentResponse {
            id: comment.id.to_hex(),
            author: AuthorSummary {
                uid: comment.author_uid,
                name: comment.author_name,
                role: None,
            },
            content: comment.content,
            created_at: to_rfc3339(comment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionResponse {
    pub id: String,
    pub department: Department,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub comments: Vec<CommentResponse>,
    pub likes: Vec<String>,
    pub like_count: usize,
    pub comment_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Discussion> for DiscussionResponse {
    fn from(post: Discussion) -> Self {
        DiscussionResponse {
            id: post.id.map(|id| id.to_hex()).unwrap_or_default(),
            department: post.department,
            title: post.title,
            content: post.content,
            author: AuthorSummary {
                uid: post.author_uid,
                name: post.author_name,
                role: Some(post.author_role),
            },
            like_count: post.likes.len(),
            comment_count: post.comments.len(),
            comments: post.comments.into_iter().map(CommentResponse::from).collect(),
            likes: post.likes,
            created_at: to_rfc3339(post.created_at),
            updated_at: to_rfc3339(post.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub success: bool,
    pub liked: bool,
    pub like_count: usize,
}
