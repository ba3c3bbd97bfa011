//! Authentication Module
//! Mission: Password hashing, bearer tokens, and role/ownership checks

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;

pub use guard::{authorize, require_admin, require_role, Principal};
pub use jwt::{IssuedToken, JwtHandler, TokenError};
pub use middleware::auth_middleware;
pub use models::{User, UserRole};
pub use user_store::UserStore;
