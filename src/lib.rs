pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod maildir;
pub mod models;
pub mod routes;
pub mod services;
pub mod smtp;
pub mod store;

use std::sync::Arc;

use axum::extract::FromRef;

use auth::password::{DoveadmChecker, PasswordVerifier};
use auth::AuthKeys;
use config::Config;
use store::demo::DemoStore;
use store::maildir_store::MaildirStore;
use store::MailStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::MySqlPool,
    pub config: Arc<Config>,
    pub keys: AuthKeys,
    pub verifier: Arc<PasswordVerifier>,
    pub store: Arc<dyn MailStore>,
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl AppState {
    /// Wire the state from config: lazy vmail pool, signing keys, verifier
    /// with the doveadm fallback, and the data provider selected by the
    /// demo-mode flag.
    pub fn from_config(config: Config) -> Result<Self, sqlx::Error> {
        let pool = db::connect_lazy(&config.database_url())?;
        let keys = AuthKeys::new(&config.jwt_secret);
        let verifier = Arc::new(PasswordVerifier::new(Box::new(DoveadmChecker::new(
            config.doveadm_path.clone(),
            config.doveadm_timeout,
        ))));
        let store: Arc<dyn MailStore> = if config.demo_mode {
            Arc::new(DemoStore::new())
        } else {
            Arc::new(MaildirStore::new(pool.clone(), config.clone()))
        };
        Ok(AppState {
            pool,
            config: Arc::new(config),
            keys,
            verifier,
            store,
        })
    }
}
