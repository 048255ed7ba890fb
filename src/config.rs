use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Secret used to verify identity tokens and to sign service tokens
    pub auth_jwt_secret: Option<String>,

    /// Base URL of the document metadata store
    pub document_store_url: Option<String>,

    /// Endpoint of the outbound mail API
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,

    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Public URL of the editor, used to build invitation links
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Directory of the built client; when set it is served for every path
    /// the API does not claim, with index.html as the fallback
    pub static_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::Env(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "dev" || env == "development"
    }

    /// Origins allowed by CORS. `None` means any origin.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let origins = self.cors_origins.as_deref()?.trim();
        if origins.is_empty() || origins == "*" {
            return None;
        }
        Some(
            origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            service_name: default_service_name(),
            auth_jwt_secret: None,
            document_store_url: None,
            mail_api_url: None,
            mail_api_key: None,
            mail_from: default_mail_from(),
            app_url: default_app_url(),
            static_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    Env(#[from] envy::Error),
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8002
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "doc-relay".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_mail_from() -> String {
    "Doc Clone Admin <admin@googledocclone.com>".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}
