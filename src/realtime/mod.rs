//! In-process message relay over websockets. Nothing is queued for users
//! without an open socket; they catch up through the history endpoint.

pub mod events;
pub mod registry;
pub mod socket;

pub use registry::ConnectionRegistry;
pub use socket::{connect, push_message, push_read};

pub type SocketRegistry = ConnectionRegistry<actix_ws::Session>;
