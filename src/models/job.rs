use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Remote,
    Onsite,
    Hybrid,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "remote",
            WorkMode::Onsite => "onsite",
            WorkMode::Hybrid => "hybrid",
        }
    }
}

/// Job or internship posting (collection: jobs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub company: String,
    pub role: String,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub mode: WorkMode,
    pub link: Option<String>,
    pub description: String,
    pub posted_by_uid: String,
    pub posted_by_name: String,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateJobRequest {
    pub company: String,
    pub role: String,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub mode: WorkMode,
    pub link: Option<String>,
    pub description: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateJobRequest {
    pub company: Option<String>,
    pub role: Option<String>,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub mode: Option<WorkMode>,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    pub mode: Option<WorkMode>,
    pub company: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: String,
    pub company: String,
    pub role: String,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub mode: WorkMode,
    pub link: Option<String>,
    pub description: String,
    pub posted_by: PosterSummary,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PosterSummary {
    pub uid: String,
    pub name: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            company: job.company,
            role: job.role,
            duration: job.duration,
            stipend: job.stipend,
            mode: job.mode,
            link: job.link,
            description: job.description,
            posted_by: PosterSummary {
                uid: job.posted_by_uid,
                name: job.posted_by_name,
            },
            created_at: to_rfc3339(job.created_at),
            updated_at: to_rfc3339(job.updated_at),
        }
    }
}
