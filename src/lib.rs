//! Class Notes Backend Library
//!
//! Accounts with role-based access, bearer-token authentication and the
//! subject/topic/subtopic/note content tree, served over HTTP.

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod state;

pub use api::build_router;
pub use config::{Cli, Config};
pub use db::Database;
pub use error::{AppError, AppResult};
pub use state::AppState;
