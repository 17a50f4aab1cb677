use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup from the environment.
/// Defaults match a stock iRedMail install.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub storage_base: String,
    pub storage_node: String,
    pub jwt_secret: String,
    pub port: u16,
    pub demo_mode: bool,
    pub doveadm_path: String,
    pub doveadm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            db_port: env_u16("DB_PORT", 3306),
            db_user: env::var("DB_USER").unwrap_or_else(|_| "vmail".into()),
            db_password: env::var("DB_PASSWORD").unwrap_or_default(),
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "vmail".into()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_port: env_u16("SMTP_PORT", 587),
            storage_base: env::var("STORAGE_BASE").unwrap_or_else(|_| "/var/vmail".into()),
            storage_node: env::var("STORAGE_NODE").unwrap_or_else(|_| "vmail1".into()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "change-me".into()),
            port: env_u16("PORT", 3001),
            demo_mode: env::var("DEMO_MODE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            doveadm_path: env::var("DOVEADM_PATH").unwrap_or_else(|_| "doveadm".into()),
            doveadm_timeout: Duration::from_secs(u64::from(env_u16("DOVEADM_TIMEOUT_SECS", 5))),
        }
    }

    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
