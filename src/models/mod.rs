pub mod achievement;
pub mod conversation;
pub mod department;
pub mod discussion;
pub mod event;
pub mod job;
pub mod registration;
pub mod user;

pub use achievement::*;
pub use conversation::*;
pub use department::*;
pub use discussion::*;
pub use event::*;
pub use job::*;
pub use registration::*;
pub use user::*;
