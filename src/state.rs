//! Shared application state handed to every handler

use crate::auth::{JwtHandler, UserStore};
use crate::config::Config;
use crate::content::ContentStore;
use crate::db::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt_handler: Arc<JwtHandler>,
    pub user_store: Arc<UserStore>,
    pub content_store: Arc<ContentStore>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let jwt_handler = JwtHandler::new(config.jwt_secret.clone(), config.access_token_ttl);
        let user_store = UserStore::new(db.clone(), config.bcrypt_cost);
        let content_store = ContentStore::new(db);

        Self {
            config: Arc::new(config),
            jwt_handler: Arc::new(jwt_handler),
            user_store: Arc::new(user_store),
            content_store: Arc::new(content_store),
        }
    }
}
