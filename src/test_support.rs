//! Shared fixtures for handler and middleware tests.

use async_trait::async_trait;
use mongodb::bson::DateTime as BsonDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::config::AppConfig;
use crate::database::{collections, MongoDB};
use crate::middleware::Claims;
use crate::models::{Role, User};
use crate::services::identity_service::IdentityProvider;
use crate::utils::AppError;

pub const COLLEGE_DOMAIN: &str = "college.edu";

pub fn claims(uid: &str, email: &str, role: Option<Role>) -> Claims {
    Claims {
        uid: uid.to_string(),
        email: email.to_string(),
        role,
        verified: true,
    }
}

/// In-memory identity provider: fixed token -> claims table, records every
/// custom-claims write. Flip `fail_claims` to make claim writes error out.
#[derive(Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, Claims>,
    pub claim_updates: Mutex<Vec<(String, Role, bool)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_claims: AtomicBool,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, claims: Claims) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }

    async fn set_custom_claims(&self, uid: &str, role: Role, verified: bool) -> Result<(), AppError> {
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(AppError::IdentityError("accounts:update unavailable".to_string()));
        }
        self.claim_updates
            .lock()
            .unwrap()
            .push((uid.to_string(), role, verified));
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("mongodb://localhost:27017/alumni_connect_test".to_string()),
        "COLLEGE_DOMAIN" => Some(COLLEGE_DOMAIN.to_string()),
        "FIREBASE_PROJECT_ID" => Some("alumni-connect-test".to_string()),
        "ADMIN_EMAILS" => Some("dean@college.edu".to_string()),
        "UPLOAD_DIR" => Some(std::env::temp_dir().join("alumni-connect-uploads").display().to_string()),
        _ => None,
    })
    .unwrap()
}

/// Fresh database per test so ignored integration tests can run in parallel.
pub async fn test_db() -> MongoDB {
    let base = std::env::var("TEST_MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let name = format!("alumni_connect_test_{}", uuid::Uuid::new_v4().simple());
    MongoDB::new(&format!("{}/{}", base.trim_end_matches('/'), name))
        .await
        .expect("MongoDB must be running for integration tests")
}

pub async fn seed_user(db: &MongoDB, uid: &str, email: &str, role: Role) -> User {
    let now = BsonDateTime::now();
    let user = User {
        id: None,
        uid: uid.to_string(),
        email: email.to_string(),
        name: format!("User {}", uid),
        department: None,
        batch: None,
        role,
        verified: true,
        photo_url: None,
        bio: None,
        linkedin: None,
        company: None,
        designation: None,
        created_at: now,
        updated_at: now,
    };
    db.collection::<User>(collections::USERS)
        .insert_one(&user)
        .await
        .unwrap();
    user
}

/// Builds the full route table against the given database and identity
/// provider: `test_app!(db, identity)`.
macro_rules! test_app {
    ($db:expr, $identity:expr) => {{
        let identity: std::sync::Arc<dyn crate::services::identity_service::IdentityProvider> = $identity;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::from(identity))
                .app_data(actix_web::web::Data::new(crate::test_support::test_config()))
                .app_data(actix_web::web::Data::new(crate::realtime::SocketRegistry::default()))
                .configure(crate::api::configure)
                .default_service(actix_web::web::to(crate::api::not_found)),
        )
        .await
    }};
}

pub(crate) use test_app;
