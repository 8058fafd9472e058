use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;

use crate::database::{collections, is_duplicate_key, MongoDB};
use crate::middleware::{ensure_owner_or_admin, Claims};
use crate::models::{
    CreateEventRequest, Event, EventCreator, EventQuery, EventStatus, Registration,
    UpdateEventRequest, User,
};
use crate::utils::time::parse_datetime;
use crate::utils::{required_text, AppError, PageRequest, Paginated, DEFAULT_LIMIT};

fn events(db: &MongoDB) -> mongodb::Collection<Event> {
    db.collection::<Event>(collections::EVENTS)
}

fn registrations(db: &MongoDB) -> mongodb::Collection<Registration> {
    db.collection::<Registration>(collections::REGISTRATIONS)
}

fn validate_capacity(capacity: Option<i32>) -> Result<Option<i32>, AppError> {
    match capacity {
        Some(c) if c <= 0 => Err(AppError::InvalidRequest(
            "Capacity must be a positive number".to_string(),
        )),
        other => Ok(other),
    }
}

/// Upcoming events are listed soonest first, everything else newest first.
pub async fn list(db: &MongoDB, query: &EventQuery) -> Result<Paginated<Event>, AppError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_LIMIT);

    let mut filter = Document::new();
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    let sort = match query.status {
        Some(EventStatus::Upcoming) => doc! { "date": 1 },
        _ => doc! { "date": -1 },
    };

    let collection = events(db);
    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Event> = collection
        .find(filter)
        .sort(sort)
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated::new(items, page, total))
}

pub async fn get(db: &MongoDB, id: ObjectId) -> Result<Event, AppError> {
    events(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

pub async fn registration_count(db: &MongoDB, event_id: ObjectId) -> Result<u64, AppError> {
    Ok(registrations(db)
        .count_documents(doc! { "event_id": event_id })
        .await?)
}

pub async fn create(db: &MongoDB, creator: &User, request: CreateEventRequest) -> Result<Event, AppError> {
    let now = BsonDateTime::now();
    let mut event = Event {
        id: None,
        title: required_text(&request.title, "Title")?,
        description: required_text(&request.description, "Description")?,
        date: parse_datetime(&request.date, "date")?,
        venue: required_text(&request.venue, "Venue")?,
        capacity: validate_capacity(request.capacity)?,
        status: EventStatus::Upcoming,
        image_url: request.image_url.filter(|u| !u.trim().is_empty()),
        created_by: EventCreator {
            uid: creator.uid.clone(),
            role: creator.role,
            name: creator.name.clone(),
        },
        created_at: now,
        updated_at: now,
    };

    let result = events(db).insert_one(&event).await?;
    event.id = result.inserted_id.as_object_id();
    log::info!("📅 Event created: {} by {} ({})", event.title, creator.uid, creator.role);
    Ok(event)
}

pub async fn update(
    db: &MongoDB,
    claims: &Claims,
    id: ObjectId,
    request: UpdateEventRequest,
) -> Result<Event, AppError> {
    let event = get(db, id).await?;
    ensure_owner_or_admin(claims, &event.created_by.uid)?;

    let mut update_doc = doc! { "updated_at": BsonDateTime::now() };
    if let Some(title) = &request.title {
        update_doc.insert("title", required_text(title, "Title")?);
    }
    if let Some(description) = &request.description {
        update_doc.insert("description", required_text(description, "Description")?);
    }
    if let Some(date) = &request.date {
        update_doc.insert("date", parse_datetime(date, "date")?);
    }
    if let Some(venue) = &request.venue {
        update_doc.insert("venue", required_text(venue, "Venue")?);
    }
    if let Some(capacity) = validate_capacity(request.capacity)? {
        update_doc.insert("capacity", capacity);
    }
    if let Some(status) = request.status {
        update_doc.insert("status", status.as_str());
    }
    if let Some(image_url) = &request.image_url {
        update_doc.insert("image_url", image_url.trim());
    }

    events(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

/// Deletes the event only; its registrations stay in the collection.
pub async fn delete(db: &MongoDB, claims: &Claims, id: ObjectId) -> Result<(), AppError> {
    let event = get(db, id).await?;
    ensure_owner_or_admin(claims, &event.created_by.uid)?;

    events(db).delete_one(doc! { "_id": id }).await?;
    log::info!("🗑️  Event {} deleted by {}", id, claims.uid);
    Ok(())
}

pub async fn register(db: &MongoDB, user: &User, event_id: ObjectId) -> Result<Registration, AppError> {
    let event = get(db, event_id).await?;
    if event.status != EventStatus::Upcoming {
        return Err(AppError::InvalidRequest(format!(
            "Registration is closed: event is {}",
            event.status.as_str()
        )));
    }

    let collection = registrations(db);
    let already = collection
        .find_one(doc! { "event_id": event_id, "user_uid": &user.uid })
        .await?;
    if already.is_some() {
        return Err(AppError::InvalidRequest("Already registered for this event".to_string()));
    }

    let mut registration = Registration {
        id: None,
        event_id,
        user_uid: user.uid.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        registered_at: BsonDateTime::now(),
    };

    // The unique (event_id, user_uid) index catches a concurrent double submit
    match collection.insert_one(&registration).await {
        Ok(result) => registration.id = result.inserted_id.as_object_id(),
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::InvalidRequest("Already registered for this event".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    log::info!("🎟️  {} registered for {}", user.uid, event.title);
    Ok(registration)
}

pub async fn unregister(db: &MongoDB, uid: &str, event_id: ObjectId) -> Result<(), AppError> {
    let result = registrations(db)
        .delete_one(doc! { "event_id": event_id, "user_uid": uid })
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Registration not found".to_string()));
    }
    Ok(())
}

/// Registrations of an event in sign-up order. Creator or admin only.
pub async fn registrations_for(
    db: &MongoDB,
    claims: &Claims,
    event_id: ObjectId,
) -> Result<(Event, Vec<Registration>), AppError> {
    let event = get(db, event_id).await?;
    ensure_owner_or_admin(claims, &event.created_by.uid)?;

    let list: Vec<Registration> = registrations(db)
        .find(doc! { "event_id": event_id })
        .sort(doc! { "registered_at": 1 })
        .await?
        .try_collect()
        .await?;

    Ok((event, list))
}

pub async fn my_registrations(db: &MongoDB, uid: &str) -> Result<Vec<Registration>, AppError> {
    Ok(registrations(db)
        .find(doc! { "user_uid": uid })
        .sort(doc! { "registered_at": -1 })
        .await?
        .try_collect()
        .await?)
}

/// Marks every upcoming event whose date has passed as completed.
pub async fn sweep_past_events(db: &MongoDB) -> Result<u64, AppError> {
    let result = events(db)
        .update_many(
            doc! {
                "status": EventStatus::Upcoming.as_str(),
                "date": { "$lt": BsonDateTime::now() },
            },
            doc! {
                "$set": {
                    "status": EventStatus::Completed.as_str(),
                    "updated_at": BsonDateTime::now(),
                }
            },
        )
        .await?;

    Ok(result.modified_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_must_be_positive() {
        assert_eq!(validate_capacity(None).unwrap(), None);
        assert_eq!(validate_capacity(Some(50)).unwrap(), Some(50));
        assert!(validate_capacity(Some(0)).is_err());
        assert!(validate_capacity(Some(-3)).is_err());
    }
}
