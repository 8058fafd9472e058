use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

use crate::utils::AppError;

const DEFAULT_DATABASE: &str = "alumni_connect";
const DUPLICATE_KEY: i32 = 11000;

pub mod collections {
    pub const USERS: &str = "users";
    pub const DISCUSSIONS: &str = "discussions";
    pub const JOBS: &str = "jobs";
    pub const EVENTS: &str = "events";
    pub const REGISTRATIONS: &str = "registrations";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    pub const ACHIEVEMENTS: &str = "achievements";
}

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.app_name = Some("alumni-connect".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        // Database name comes from the connection string path, e.g. mongodb://host/alumni_connect
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Creates the schema-level constraints (uniqueness) and lookup indexes.
    async fn ensure_indexes(&self) {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: Vec<(&str, Document, Option<IndexOptions>)> = vec![
            (collections::USERS, doc! { "uid": 1 }, Some(unique())),
            (collections::USERS, doc! { "email": 1 }, Some(unique())),
            (collections::USERS, doc! { "role": 1, "verified": 1 }, None),
            (collections::DISCUSSIONS, doc! { "department": 1, "created_at": -1 }, None),
            (collections::JOBS, doc! { "created_at": -1 }, None),
            (collections::EVENTS, doc! { "status": 1, "date": 1 }, None),
            (collections::REGISTRATIONS, doc! { "event_id": 1, "user_uid": 1 }, Some(unique())),
            (collections::REGISTRATIONS, doc! { "user_uid": 1 }, None),
            (collections::CONVERSATIONS, doc! { "participant_key": 1 }, Some(unique())),
            (collections::CONVERSATIONS, doc! { "participants": 1 }, None),
            (collections::MESSAGES, doc! { "conversation_id": 1, "created_at": -1 }, None),
            (collections::ACHIEVEMENTS, doc! { "created_at": -1 }, None),
        ];

        for (collection, keys, options) in indexes {
            let description = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
            let model = IndexModel::builder().keys(keys).options(options).build();

            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", description),
                Err(e) => log::warn!("   ⚠️  Could not create index {}: {}", description, e),
            }
        }

        log::info!("✅ Database indexes ready");
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// True when a write failed on a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}
