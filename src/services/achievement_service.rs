use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::database::{collections, MongoDB};
use crate::middleware::{ensure_owner_or_admin, Claims};
use crate::models::{Achievement, AchievementQuery, User, ACHIEVEMENTS_PAGE_SIZE};
use crate::utils::{AppError, PageRequest, Paginated};

const MAX_DESCRIPTION_LEN: usize = 1_000;

fn achievements(db: &MongoDB) -> mongodb::Collection<Achievement> {
    db.collection::<Achievement>(collections::ACHIEVEMENTS)
}

pub async fn list(db: &MongoDB, query: &AchievementQuery) -> Result<Paginated<Achievement>, AppError> {
    let page = PageRequest::new(query.page, query.limit, ACHIEVEMENTS_PAGE_SIZE);

    let collection = achievements(db);
    let total = collection.count_documents(doc! {}).await?;
    let items: Vec<Achievement> = collection
        .find(doc! {})
        .sort(doc! { "created_at": -1, "_id": -1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated::new(items, page, total))
}

pub async fn create(
    db: &MongoDB,
    poster: &User,
    image_url: String,
    description: &str,
) -> Result<Achievement, AppError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::InvalidRequest("Description is required".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }

    let mut achievement = Achievement {
        id: None,
        image_url,
        description: description.to_string(),
        posted_by_uid: poster.uid.clone(),
        posted_by_name: poster.name.clone(),
        created_at: BsonDateTime::now(),
    };

    let result = achievements(db).insert_one(&achievement).await?;
    achievement.id = result.inserted_id.as_object_id();
    log::info!("🏆 Achievement posted by {}", poster.uid);
    Ok(achievement)
}

/// Removes the document and returns it so the caller can drop the stored image.
pub async fn delete(db: &MongoDB, claims: &Claims, id: ObjectId) -> Result<Achievement, AppError> {
    let achievement = achievements(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Achievement not found".to_string()))?;
    ensure_owner_or_admin(claims, &achievement.posted_by_uid)?;

    achievements(db).delete_one(doc! { "_id": id }).await?;
    log::info!("🗑️  Achievement {} deleted by {}", id, claims.uid);
    Ok(achievement)
}
