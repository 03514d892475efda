use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::env_vars::{SUPABASE_ANON_KEY_VAR, SUPABASE_URL_VAR};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// --- Supabase Config ---
// Both values come from SUPABASE_URL / SUPABASE_ANON_KEY or CALSHARE__SUPABASE__*.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Base address of the backend, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,
    /// Public anonymous-tier API key
    #[serde(default)]
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Checks that both values are present and the URL looks like an http(s) endpoint.
    ///
    /// Full URL parsing happens when the client is built; this only rejects
    /// configurations that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Message(format!(
                "supabase.url is not set (set {SUPABASE_URL_VAR})"
            )));
        }
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "supabase.url must start with http:// or https://, got {url:?}"
                ))
            })?;
        if rest.trim_matches('/').is_empty() {
            return Err(ConfigError::Message(format!(
                "supabase.url has no host: {url:?}"
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Message(format!(
                "supabase.anon_key is not set (set {SUPABASE_ANON_KEY_VAR})"
            )));
        }
        Ok(())
    }
}

// The key is public-tier but still a credential; keep it out of logs.
impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub supabase: SupabaseConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supabase.validate()
    }
}
