use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document, Regex};
use mongodb::options::ReturnDocument;

use crate::database::{collections, MongoDB};
use crate::middleware::{ensure_owner_or_admin, Claims};
use crate::models::{CreateJobRequest, Job, JobQuery, UpdateJobRequest, User};
use crate::utils::{escape_regex, optional_text, required_text, AppError, PageRequest, Paginated, DEFAULT_LIMIT};

fn jobs(db: &MongoDB) -> mongodb::Collection<Job> {
    db.collection::<Job>(collections::JOBS)
}

/// Application links must be absolute http(s) URLs.
fn validate_link(link: &str) -> Result<String, AppError> {
    let link = link.trim();
    if link.starts_with("https://") || link.starts_with("http://") {
        Ok(link.to_string())
    } else {
        Err(AppError::InvalidRequest("Link must start with http:// or https://".to_string()))
    }
}

fn list_filter(query: &JobQuery) -> Document {
    let mut filter = Document::new();
    if let Some(mode) = query.mode {
        filter.insert("mode", mode.as_str());
    }
    // prefix match, case-insensitive
    if let Some(company) = query.company.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert(
            "company",
            Regex {
                pattern: format!("^{}", escape_regex(company)),
                options: "i".to_string(),
            },
        );
    }
    filter
}

pub async fn list(db: &MongoDB, query: &JobQuery) -> Result<Paginated<Job>, AppError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_LIMIT);
    let filter = list_filter(query);

    let collection = jobs(db);
    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Job> = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated::new(items, page, total))
}

pub async fn get(db: &MongoDB, id: ObjectId) -> Result<Job, AppError> {
    jobs(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

pub async fn create(db: &MongoDB, poster: &User, request: CreateJobRequest) -> Result<Job, AppError> {
    let now = BsonDateTime::now();
    let mut job = Job {
        id: None,
        company: required_text(&request.company, "Company")?,
        role: required_text(&request.role, "Role")?,
        duration: optional_text(request.duration.as_deref()),
        stipend: optional_text(request.stipend.as_deref()),
        mode: request.mode,
        link: optional_text(request.link.as_deref()).map(|l| validate_link(&l)).transpose()?,
        description: required_text(&request.description, "Description")?,
        posted_by_uid: poster.uid.clone(),
        posted_by_name: poster.name.clone(),
        created_at: now,
        updated_at: now,
    };

    let result = jobs(db).insert_one(&job).await?;
    job.id = result.inserted_id.as_object_id();
    log::info!("💼 Job posted: {} at {} by {}", job.role, job.company, poster.uid);
    Ok(job)
}

pub async fn update(
    db: &MongoDB,
    claims: &Claims,
    id: ObjectId,
    request: UpdateJobRequest,
) -> Result<Job, AppError> {
    let job = get(db, id).await?;
    ensure_owner_or_admin(claims, &job.posted_by_uid)?;

    let mut update_doc = doc! { "updated_at": BsonDateTime::now() };
    if let Some(company) = &request.company {
        update_doc.insert("company", required_text(company, "Company")?);
    }
    if let Some(role) = &request.role {
        update_doc.insert("role", required_text(role, "Role")?);
    }
    if let Some(duration) = request.duration {
        update_doc.insert("duration", optional_text(Some(duration.as_str())));
    }
    if let Some(stipend) = request.stipend {
        update_doc.insert("stipend", optional_text(Some(stipend.as_str())));
    }
    if let Some(mode) = request.mode {
        update_doc.insert("mode", mode.as_str());
    }
    if let Some(link) = request.link {
        let link = optional_text(Some(link.as_str())).map(|l| validate_link(&l)).transpose()?;
        update_doc.insert("link", link);
    }
    if let Some(description) = &request.description {
        update_doc.insert("description", required_text(description, "Description")?);
    }

    jobs(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

pub async fn delete(db: &MongoDB, claims: &Claims, id: ObjectId) -> Result<(), AppError> {
    let job = get(db, id).await?;
    ensure_owner_or_admin(claims, &job.posted_by_uid)?;

    jobs(db).delete_one(doc! { "_id": id }).await?;
    log::info!("🗑️  Job {} deleted by {}", id, claims.uid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_must_be_http() {
        assert!(validate_link("https://careers.example.com/42").is_ok());
        assert!(validate_link("javascript:alert(1)").is_err());
    }

    #[test]
    fn company_filter_keeps_punctuation() {
        let pattern = |company: &str| {
            let filter = list_filter(&JobQuery {
                company: Some(company.to_string()),
                ..Default::default()
            });
            match filter.get("company") {
                Some(mongodb::bson::Bson::RegularExpression(re)) => re.pattern.clone(),
                other => panic!("expected regex, got {:?}", other),
            }
        };
        assert_eq!(pattern(" AT&T "), "^AT&T");
        assert_eq!(pattern("C++ Labs"), "^C\\+\\+ Labs");
        assert_eq!(pattern("Yahoo!"), "^Yahoo!");
        assert!(list_filter(&JobQuery::default()).is_empty());
    }
}
