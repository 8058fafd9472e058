// Utility functions
pub mod error;
pub mod ids;
pub mod pagination;
pub mod text;
pub mod time;

pub use error::*;
pub use ids::*;
pub use pagination::*;
pub use text::*;
