pub mod achievement_service;
pub mod discussion_service;
pub mod event_service;
pub mod export_service;
pub mod identity_service;
pub mod job_service;
pub mod message_service;
pub mod upload_service;
pub mod user_service;

pub use identity_service::{FirebaseIdentity, IdentityProvider};
