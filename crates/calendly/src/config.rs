//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `calendly.toml` in the working directory
//! 3. Defaults
//!
//! `${VAR_NAME}` references inside the TOML file are expanded from the
//! environment before parsing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalendlyError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.calendly.com/";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.calendly.com/";
pub const DEFAULT_CONFIG_FILE: &str = "calendly.toml";

/// Calendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendlyConfig {
    /// Bearer token (personal access token or OAuth access token)
    #[serde(default)]
    pub access_token: Option<String>,
    /// OAuth application client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth application client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OAuth redirect URI registered for the application
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// REST API host
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// OAuth host
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CalendlyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            api_base_url: default_api_base_url(),
            auth_base_url: default_auth_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_auth_base_url() -> String {
    DEFAULT_AUTH_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl CalendlyConfig {
    /// Config holding only an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    /// Set OAuth application credentials
    pub fn with_oauth(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Point the client at different hosts (tests, proxies)
    pub fn with_base_urls(mut self, api_base_url: impl Into<String>, auth_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self.auth_base_url = auth_base_url.into();
        self
    }

    /// Replace `${VAR_NAME}` with the value of the environment variable.
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// Environment variables take precedence over the file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| CalendlyError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&toml_content)?;
        config.apply_env_overrides();

        Ok(config)
    }

    fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);

        let toml: TomlConfig = toml::from_str(&expanded)
            .map_err(|e| CalendlyError::Config(format!("Failed to parse TOML: {}", e)))?;

        let auth = toml.auth.unwrap_or_default();
        let api = toml.api.unwrap_or_default();

        Ok(Self {
            access_token: non_empty(auth.access_token),
            client_id: non_empty(auth.client_id),
            client_secret: non_empty(auth.client_secret),
            redirect_uri: non_empty(auth.redirect_uri),
            api_base_url: api.base_url.unwrap_or_else(default_api_base_url),
            auth_base_url: auth.base_url.unwrap_or_else(default_auth_base_url),
            timeout_secs: api.timeout_secs.unwrap_or_else(default_timeout_secs),
        })
    }

    /// Load `./calendly.toml` when present, otherwise the environment.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(token) = env_var("CALENDLY_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(client_id) = env_var("CALENDLY_CLIENT_ID") {
            self.client_id = Some(client_id);
        }
        if let Some(client_secret) = env_var("CALENDLY_CLIENT_SECRET") {
            self.client_secret = Some(client_secret);
        }
        if let Some(redirect_uri) = env_var("CALENDLY_REDIRECT_URI") {
            self.redirect_uri = Some(redirect_uri);
        }
        if let Some(base_url) = env_var("CALENDLY_API_BASE_URL") {
            self.api_base_url = base_url;
        }
        if let Some(base_url) = env_var("CALENDLY_AUTH_BASE_URL") {
            self.auth_base_url = base_url;
        }
        if let Some(timeout) = env_var("CALENDLY_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.timeout_secs = secs;
            }
        }
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    auth: Option<TomlAuthConfig>,
    api: Option<TomlApiConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlAuthConfig {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
    /// OAuth host
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}
