use futures::TryStreamExt;
use mongodb::bson::{doc, Document, DateTime as BsonDateTime, Regex};
use mongodb::options::ReturnDocument;

use crate::config::AppConfig;
use crate::database::{collections, is_duplicate_key, MongoDB};
use crate::middleware::Claims;
use crate::models::{
    RegisterUserRequest, Role, UpdateProfileRequest, User, UserListQuery,
};
use crate::services::identity_service::IdentityProvider;
use crate::utils::{escape_regex, optional_text, required_text, AppError, PageRequest, Paginated, DEFAULT_LIMIT};

/// Role and verification flag a new account starts with. Listed admin emails
/// win, then the college domain makes a verified student, everybody else is
/// an alumni account awaiting verification.
pub fn derive_role(email: &str, college_domain: &str, admin_emails: &[String]) -> (Role, bool) {
    let email = email.trim().to_lowercase();

    if admin_emails.iter().any(|admin| *admin == email) {
        return (Role::Admin, true);
    }

    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && domain == college_domain => (Role::Student, true),
        _ => (Role::Alumni, false),
    }
}

fn users(db: &MongoDB) -> mongodb::Collection<User> {
    db.collection::<User>(collections::USERS)
}

pub async fn register(
    db: &MongoDB,
    identity: &dyn IdentityProvider,
    config: &AppConfig,
    claims: &Claims,
    request: RegisterUserRequest,
) -> Result<User, AppError> {
    let name = required_text(&request.name, "Name")?;
    if claims.email.is_empty() {
        return Err(AppError::InvalidRequest("Account has no email address".to_string()));
    }

    let collection = users(db);
    let existing = collection
        .find_one(doc! { "$or": [ { "uid": &claims.uid }, { "email": &claims.email } ] })
        .await?;
    if existing.is_some() {
        return Err(AppError::InvalidRequest("User already registered".to_string()));
    }

    let (role, verified) = derive_role(&claims.email, &config.college_domain, &config.admin_emails);
    let now = BsonDateTime::now();
    let mut user = User {
        id: None,
        uid: claims.uid.clone(),
        email: claims.email.clone(),
        name,
        department: request.department,
        batch: request.batch,
        role,
        verified,
        photo_url: request.photo_url,
        bio: None,
        linkedin: None,
        company: None,
        designation: None,
        created_at: now,
        updated_at: now,
    };

    match collection.insert_one(&user).await {
        Ok(result) => user.id = result.inserted_id.as_object_id(),
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::InvalidRequest("User already registered".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    // Without the claims every role check would fail, so the profile goes too
    // and the client can simply retry.
    if let Err(e) = identity.set_custom_claims(&user.uid, role, verified).await {
        log::error!("❌ Claims not written for {}, rolling back registration: {}", user.uid, e);
        if let Err(cleanup) = collection.delete_one(doc! { "uid": &user.uid }).await {
            log::error!("❌ Could not remove profile {}: {}", user.uid, cleanup);
        }
        return Err(e);
    }

    log::info!("✅ User registered: {} as {} (verified: {})", user.email, role, verified);
    Ok(user)
}

pub async fn get_by_uid(db: &MongoDB, uid: &str) -> Result<User, AppError> {
    users(db)
        .find_one(doc! { "uid": uid })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Profile of the caller; content creation requires a registered profile.
pub async fn require_profile(db: &MongoDB, claims: &Claims) -> Result<User, AppError> {
    match get_by_uid(db, &claims.uid).await {
        Err(AppError::NotFound(_)) => Err(AppError::Forbidden(
            "Complete your registration first".to_string(),
        )),
        other => other,
    }
}

pub async fn update_profile(
    db: &MongoDB,
    uid: &str,
    request: UpdateProfileRequest,
) -> Result<User, AppError> {
    let mut update_doc = doc! { "updated_at": BsonDateTime::now() };

    if let Some(name) = &request.name {
        update_doc.insert("name", required_text(name, "Name")?);
    }
    if let Some(department) = &request.department {
        update_doc.insert("department", department.as_str());
    }
    if let Some(batch) = request.batch {
        update_doc.insert("batch", batch);
    }
    let optional_fields = [
        ("photo_url", &request.photo_url),
        ("bio", &request.bio),
        ("linkedin", &request.linkedin),
        ("company", &request.company),
        ("designation", &request.designation),
    ];
    for (field, value) in optional_fields {
        if let Some(value) = value {
            update_doc.insert(field, optional_text(Some(value.as_str())));
        }
    }

    let result = users(db)
        .update_one(doc! { "uid": uid }, doc! { "$set": update_doc })
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    get_by_uid(db, uid).await
}

pub async fn set_photo(db: &MongoDB, uid: &str, photo_url: &str) -> Result<User, AppError> {
    update_profile(
        db,
        uid,
        UpdateProfileRequest {
            photo_url: Some(photo_url.to_string()),
            ..Default::default()
        },
    )
    .await
}

fn list_filter(query: &UserListQuery) -> Document {
    let mut filter = doc! {};
    if let Some(role) = query.role {
        filter.insert("role", role.as_str());
    }
    if let Some(department) = query.department {
        filter.insert("department", department.as_str());
    }
    if let Some(batch) = query.batch {
        filter.insert("batch", batch);
    }
    if let Some(verified) = query.verified {
        filter.insert("verified", verified);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.insert(
            "name",
            Regex {
                pattern: escape_regex(search),
                options: "i".to_string(),
            },
        );
    }
    filter
}

pub async fn list_users(db: &MongoDB, query: &UserListQuery) -> Result<Paginated<User>, AppError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_LIMIT);
    let filter = list_filter(query);
    let collection = users(db);

    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<User> = collection
        .find(filter)
        .sort(doc! { "name": 1 })
        .skip(page.skip())
        .limit(page.limit_i64())
        .await?
        .try_collect()
        .await?;

    Ok(Paginated::new(items, page, total))
}

pub async fn set_verified(
    db: &MongoDB,
    identity: &dyn IdentityProvider,
    uid: &str,
    verified: bool,
) -> Result<User, AppError> {
    let user = update_access(db, identity, uid, doc! { "verified": verified }).await?;
    log::info!("✅ {} verification set to {}", user.email, verified);
    Ok(user)
}

pub async fn change_role(
    db: &MongoDB,
    identity: &dyn IdentityProvider,
    uid: &str,
    role: Role,
) -> Result<User, AppError> {
    let user = update_access(db, identity, uid, doc! { "role": role.as_str() }).await?;
    log::info!("✅ {} is now {}", user.email, role);
    Ok(user)
}

/// Applies a role/verified change to the profile and mirrors it into the
/// provider's custom claims. When the claims write fails the stored values are
/// put back, so profile and token never disagree.
async fn update_access(
    db: &MongoDB,
    identity: &dyn IdentityProvider,
    uid: &str,
    mut changes: Document,
) -> Result<User, AppError> {
    let collection = users(db);
    let previous = get_by_uid(db, uid).await?;

    changes.insert("updated_at", BsonDateTime::now());
    let user = collection
        .find_one_and_update(doc! { "uid": uid }, doc! { "$set": changes })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Err(e) = identity.set_custom_claims(uid, user.role, user.verified).await {
        log::error!("❌ Claims not written for {}, restoring previous access: {}", uid, e);
        let restore = doc! {
            "$set": {
                "role": previous.role.as_str(),
                "verified": previous.verified,
                "updated_at": previous.updated_at,
            }
        };
        if let Err(cleanup) = collection.update_one(doc! { "uid": uid }, restore).await {
            log::error!("❌ Could not restore access for {}: {}", uid, cleanup);
        }
        return Err(e);
    }

    Ok(user)
}

/// Removes the profile and the provider account. Content the user created
/// (posts, events, registrations, messages) is left in place.
pub async fn delete_user(
    db: &MongoDB,
    identity: &dyn IdentityProvider,
    uid: &str,
) -> Result<(), AppError> {
    let result = users(db).delete_one(doc! { "uid": uid }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Err(e) = identity.delete_user(uid).await {
        log::warn!("⚠️  Profile {} deleted but provider account remains: {}", uid, e);
    }
    Ok(())
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: u64,
    pub students: u64,
    pub alumni: u64,
    pub club_members: u64,
    pub admins: u64,
    pub pending_verifications: u64,
    pub discussions: u64,
    pub jobs: u64,
    pub events: u64,
    pub registrations: u64,
    pub achievements: u64,
}

pub async fn stats(db: &MongoDB) -> Result<PlatformStats, AppError> {
    let count = |name: &'static str, filter: Document| async move {
        db.collection::<Document>(name).count_documents(filter).await
    };

    Ok(PlatformStats {
        users: count(collections::USERS, doc! {}).await?,
        students: count(collections::USERS, doc! { "role": Role::Student.as_str() }).await?,
        alumni: count(collections::USERS, doc! { "role": Role::Alumni.as_str() }).await?,
        club_members: count(collections::USERS, doc! { "role": Role::ClubMember.as_str() }).await?,
        admins: count(collections::USERS, doc! { "role": Role::Admin.as_str() }).await?,
        pending_verifications: count(
            collections::USERS,
            doc! { "role": Role::Alumni.as_str(), "verified": false },
        )
        .await?,
        discussions: count(collections::DISCUSSIONS, doc! {}).await?,
        jobs: count(collections::JOBS, doc! {}).await?,
        events: count(collections::EVENTS, doc! {}).await?,
        registrations: count(collections::REGISTRATIONS, doc! {}).await?,
        achievements: count(collections::ACHIEVEMENTS, doc! {}).await?,
    })
}
