pub mod auth;
pub mod roles;
pub mod security_headers;

pub use auth::{AuthMiddleware, Claims};
pub use roles::{ensure_owner_or_admin, ensure_role, RequireRole};
pub use security_headers::SecurityHeaders;
