use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;

use crate::database::{collections, MongoDB};
use crate::middleware::{ensure_owner_or_admin, Claims};
use crate::models::{
    Comment, CreateDiscussionRequest, Discussion, DiscussionQuery, UpdateDiscussionRequest, User,
};
use crate::utils::{AppError, PageRequest, Paginated, DEFAULT_LIMIT};

const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 10_000;
const MAX_COMMENT_LEN: usize = 2_000;

fn discussions(db: &MongoDB) -> mongodb::Collection<Discussion> {
    db.collection::<Discussion>(collections::DISCUSSIONS)
}

fn validate_text(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::InvalidRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

pub async fn list(db: &MongoDB, query: &DiscussionQuery) -> Result<Paginated<Discussion>, AppError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_LIMIT);

    let mut filter = Document::new();
    if let Some(department) = query.department {
        filter.insert("department", department.as_str());
    }
    if let Some(author) = &query.author {
        filter.insert("author_uid", author.as_str());
    }

    let collection = discussions(db);
    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Discussion> = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated::new(items, page, total))
}

pub async fn get(db: &MongoDB, id: ObjectId) -> Result<Discussion, AppError> {
    discussions(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".to_string()))
}

pub async fn create(
    db: &MongoDB,
    author: &User,
    request: CreateDiscussionRequest,
) -> Result<Discussion, AppError> {
    let now = BsonDateTime::now();
    let mut post = Discussion {
        id: None,
        department: request.department,
        title: validate_text(&request.title, "Title", MAX_TITLE_LEN)?,
        content: validate_text(&request.content, "Content", MAX_CONTENT_LEN)?,
        author_uid: author.uid.clone(),
        author_name: author.name.clone(),
        author_role: author.role,
        comments: vec![],
        likes: vec![],
        created_at: now,
        updated_at: now,
    };

    let result = discussions(db).insert_one(&post).await?;
    post.id = result.inserted_id.as_object_id();
    Ok(post)
}

pub async fn update(
    db: &MongoDB,
    claims: &Claims,
    id: ObjectId,
    request: UpdateDiscussionRequest,
) -> Result<Discussion, AppError> {
    let post = get(db, id).await?;
    ensure_owner_or_admin(claims, &post.author_uid)?;

    let mut update_doc = doc! { "updated_at": BsonDateTime::now() };
    if let Some(department) = request.department {
        update_doc.insert("department", department.as_str());
    }
    if let Some(title) = &request.title {
        update_doc.insert("title", validate_text(title, "Title", MAX_TITLE_LEN)?);
    }
    if let Some(content) = &request.content {
        update_doc.insert("content", validate_text(content, "Content", MAX_CONTENT_LEN)?);
    }

    discussions(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".to_string()))
}

pub async fn delete(db: &MongoDB, claims: &Claims, id: ObjectId) -> Result<(), AppError> {
    let post = get(db, id).await?;
    ensure_owner_or_admin(claims, &post.author_uid)?;

    discussions(db).delete_one(doc! { "_id": id }).await?;
    log::info!("🗑️  Discussion {} deleted by {}", id, claims.uid);
    Ok(())
}

pub async fn add_comment(
    db: &MongoDB,
    author: &User,
    id: ObjectId,
    content: &str,
) -> Result<Discussion, AppError> {
    let comment = Comment {
        id: ObjectId::new(),
        author_uid: author.uid.clone(),
        author_name: author.name.clone(),
        content: validate_text(content, "Comment", MAX_COMMENT_LEN)?,
        created_at: BsonDateTime::now(),
    };
    let comment = mongodb::bson::to_document(&comment)?;

    discussions(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$push": { "comments": comment } })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".to_string()))
}

pub async fn delete_comment(
    db: &MongoDB,
    claims: &Claims,
    id: ObjectId,
    comment_id: ObjectId,
) -> Result<Discussion, AppError> {
    let post = get(db, id).await?;
    let comment = post
        .comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    ensure_owner_or_admin(claims, &comment.author_uid)?;

    discussions(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$pull": { "comments": { "_id": comment_id } } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".to_string()))
}

/// Flips the caller's like; returns whether the post is now liked and the new count.
pub async fn toggle_like(db: &MongoDB, uid: &str, id: ObjectId) -> Result<(bool, usize), AppError> {
    let post = get(db, id).await?;
    let already_liked = post.likes.iter().any(|u| u == uid);

    let update = if already_liked {
        doc! { "$pull": { "likes": uid } }
    } else {
        doc! { "$addToSet": { "likes": uid } }
    };

    let updated = discussions(db)
        .find_one_and_update(doc! { "_id": id }, update)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Discussion not found".to_string()))?;

    Ok((!already_liked, updated.likes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(validate_text("  hello ", "Title", 10).unwrap(), "hello");
        assert!(validate_text("   ", "Title", 10).is_err());
        assert!(validate_text("eleven chars", "Title", 10).is_err());
    }
}
