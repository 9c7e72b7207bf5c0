pub mod domain;
pub mod error;
pub mod provider;
pub mod service;
pub mod storage;
pub mod store;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub openweather_api_key: Option<String>,
        pub openweather_base_url: Option<String>,
        pub geocoding_api_key: Option<String>,
        pub geocoding_base_url: Option<String>,
        pub data_service_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                openweather_api_key: std::env::var("OPENWEATHER_API_KEY").ok(),
                openweather_base_url: std::env::var("OPENWEATHER_BASE_URL").ok(),
                geocoding_api_key: std::env::var("GEOCODING_API_KEY").ok(),
                geocoding_base_url: std::env::var("GEOCODING_BASE_URL").ok(),
                data_service_url: std::env::var("DATA_SERVICE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn data_service_url(&self) -> String {
            self.data_service_url
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:8003".to_string())
        }
    }
}
