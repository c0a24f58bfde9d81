use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, IdTokenExchange, OAuthFlowInitiator};
use crate::popup::types::{
    PopupOptions, DEFAULT_MESSAGE_SOURCE, DEFAULT_POLL_INTERVAL, DEFAULT_POPUP_HEIGHT,
    DEFAULT_POPUP_WIDTH, DEFAULT_TIMEOUT,
};
use crate::popup::PopupAuthBroker;
use crate::session::{
    FileSessionStorage, MemorySessionStorage, SessionStorage, SessionTokenStore, ACCESS_TOKEN_KEY,
};

/// Environment variables consulted for the API base, highest priority first
pub const API_BASE_ENV_VARS: [&str; 3] =
    ["NEXT_PUBLIC_API_BASE_URL", "NEXT_API_BASE_URL", "API_BASE_URL"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmartHireSettings {
    pub application: ApplicationSettings,
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiSettings {
    /// Upstream backend base URL. Empty means "not configured".
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Backend endpoint returning `{ "auth_url": ... }` for the LinkedIn flow
    pub start_path: String,
    /// Backend endpoint exchanging a Google ID token
    pub google_path: String,
    pub message_source: String,
    /// Comma separated origins allowed to post the auth result. Empty accepts any.
    pub allowed_origins: String,
    pub popup_window_name: String,
    pub popup_width: u32,
    pub popup_height: u32,
    pub popup_timeout_ms: u64,
    pub popup_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub storage_key: String,
    /// Directory holding per-session storage files. Empty keeps sessions in memory.
    pub storage_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            start_path: "/auth/linkedin".to_string(),
            google_path: "/auth/google".to_string(),
            message_source: DEFAULT_MESSAGE_SOURCE.to_string(),
            allowed_origins: String::new(),
            popup_window_name: "linkedin_oauth".to_string(),
            popup_width: DEFAULT_POPUP_WIDTH,
            popup_height: DEFAULT_POPUP_HEIGHT,
            popup_timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(120_000),
            popup_poll_interval_ms: u64::try_from(DEFAULT_POLL_INTERVAL.as_millis())
                .unwrap_or(500),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_key: ACCESS_TOKEN_KEY.to_string(),
            storage_dir: String::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Clean up an API base URL taken from the environment
///
/// Trims whitespace, strips one pair of matching surrounding quotes, one
/// trailing `;` and any trailing slashes.
#[must_use]
pub fn sanitize_api_base(raw: &str) -> String {
    let mut s = raw.trim();
    if s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')))
    {
        s = s[1..s.len() - 1].trim();
    }
    if let Some(stripped) = s.strip_suffix(';') {
        s = stripped.trim();
    }
    s.trim_end_matches('/').to_string()
}

impl SmartHireSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - A settings file cannot be read or parsed
    pub fn load() -> anyhow::Result<Self> {
        // Initialize environment and logging
        Self::initialize_environment()?;

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment and logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> anyhow::Result<()> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SMARTHIRE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("SMARTHIRE_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ SMARTHIRE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_auth_env_overrides(&mut settings.auth);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for the API base
    ///
    /// The first non-empty variable of [`API_BASE_ENV_VARS`] wins. The value
    /// (from the environment or the settings file) is always sanitized.
    pub fn apply_api_env_overrides(api_settings: &mut ApiSettings) {
        if let Some(base_url) = API_BASE_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
        {
            api_settings.base_url = base_url;
        }
        api_settings.base_url = sanitize_api_base(&api_settings.base_url);
    }

    fn apply_auth_env_overrides(auth_settings: &mut AuthSettings) {
        if let Ok(origins) = std::env::var("AUTH_ALLOWED_ORIGINS") {
            auth_settings.allowed_origins = origins;
        }
        if let Ok(source) = std::env::var("AUTH_MESSAGE_SOURCE") {
            auth_settings.message_source = source;
        }
        Self::apply_numeric_env_override("AUTH_POPUP_TIMEOUT_MS", &mut auth_settings.popup_timeout_ms);
    }

    fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(dir) = std::env::var("SESSION_STORAGE_DIR") {
            session_settings.storage_dir = dir;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        split_list(&self.application.cors_origins)
    }

    /// Popup options for the LinkedIn flow
    #[must_use]
    pub fn popup_options(&self) -> PopupOptions {
        PopupOptions::default()
            .with_window_name(&self.auth.popup_window_name)
            .with_size(self.auth.popup_width, self.auth.popup_height)
            .with_timeout(Duration::from_millis(self.auth.popup_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.auth.popup_poll_interval_ms))
            .with_message_source(&self.auth.message_source)
            .with_allowed_origins(split_list(&self.auth.allowed_origins))
    }

    /// Token store for one browser session
    ///
    /// File-backed under `session.storage_dir` when set, in memory otherwise.
    #[must_use]
    pub fn token_store(&self, session_id: &str) -> SessionTokenStore {
        let storage: Arc<dyn SessionStorage> = if self.session.storage_dir.is_empty() {
            Arc::new(MemorySessionStorage::new())
        } else {
            Arc::new(FileSessionStorage::for_session(
                Path::new(&self.session.storage_dir),
                session_id,
            ))
        };
        SessionTokenStore::with_key(storage, &self.session.storage_key)
    }

    /// API client for the configured backend
    #[must_use]
    pub fn api_client(&self, tokens: SessionTokenStore) -> ApiClient {
        ApiClient::new(&self.api.base_url, tokens)
    }

    /// LinkedIn flow initiator using the configured endpoint and popup options
    #[must_use]
    pub fn linkedin_flow(&self, client: ApiClient, broker: PopupAuthBroker) -> OAuthFlowInitiator {
        OAuthFlowInitiator::linkedin(client, broker)
            .with_start_path(&self.auth.start_path)
            .with_popup_options(self.popup_options())
    }

    /// Google ID-token exchange using the configured endpoint
    #[must_use]
    pub fn google_exchange(&self, client: ApiClient) -> IdTokenExchange {
        IdTokenExchange::with_path(client, &self.auth.google_path)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
