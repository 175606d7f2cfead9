use std::env;
use secrecy::SecretString;

use crate::constants::test_policy::DEFAULT_FOCUS_LOSS_WINDOW_MS;

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub results_collection: String,
    pub mongo_max_pool_size: u32,
    pub mongo_min_pool_size: u32,
    pub mongo_timeout_secs: u64,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_origin: String,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub openai_model: String,
    pub notification_webhook_url: Option<String>,
    pub focus_loss_window_ms: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "mcq-proctor-local".to_string()),
            results_collection: env::var("RESULTS_COLLECTION")
                .unwrap_or_else(|_| "test_results".to_string()),
            mongo_max_pool_size: env::var("MONGO_MAX_POOL_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            mongo_min_pool_size: env::var("MONGO_MIN_POOL_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(2),
            mongo_timeout_secs: env::var("MONGO_TIMEOUT_SECS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(5),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            focus_loss_window_ms: env::var("FOCUS_LOSS_WINDOW_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .unwrap_or(DEFAULT_FOCUS_LOSS_WINDOW_MS),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if the question generator cannot authenticate
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        if self.openai_api_key.expose_secret().trim().is_empty() {
            panic!(
                "FATAL: OPENAI_API_KEY is not set! Tests cannot be generated without it."
            );
        }

        if self.mongo_max_pool_size == 0 {
            panic!("FATAL: MONGO_MAX_POOL_SIZE must be at least 1.");
        }

        if self.focus_loss_window_ms < 0 {
            panic!(
                "FATAL: FOCUS_LOSS_WINDOW_MS must not be negative (got {}).",
                self.focus_loss_window_ms
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "mcq-proctor-test".to_string(),
            results_collection: "test_results".to_string(),
            mongo_max_pool_size: 10,
            mongo_min_pool_size: 2,
            mongo_timeout_secs: 5,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cors_origin: "http://localhost:3000".to_string(),
            openai_api_key: SecretString::from("test_api_key".to_string()),
            openai_api_base: "http://localhost:11434/v1".to_string(),
            openai_model: "test-model".to_string(),
            notification_webhook_url: None,
            focus_loss_window_ms: DEFAULT_FOCUS_LOSS_WINDOW_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(!config.results_collection.is_empty());
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "mcq-proctor-test");
        assert_eq!(config.results_collection, "test_results");
        assert_eq!(config.focus_loss_window_ms, 1_000);
        assert_eq!(config.mongo_max_pool_size, 10);
        assert_eq!(config.mongo_min_pool_size, 2);
        assert!(config.notification_webhook_url.is_none());
    }

    #[test]
    fn test_validate_for_production_accepts_test_config() {
        Config::test_config().validate_for_production();
    }

    #[test]
    #[should_panic(expected = "OPENAI_API_KEY")]
    fn test_validate_for_production_rejects_empty_key() {
        let mut config = Config::test_config();
        config.openai_api_key = SecretString::from(String::new());
        config.validate_for_production();
    }

    #[test]
    #[should_panic(expected = "MONGO_MAX_POOL_SIZE")]
    fn test_validate_for_production_rejects_empty_pool() {
        let mut config = Config::test_config();
        config.mongo_max_pool_size = 0;
        config.validate_for_production();
    }
}
