//! Environment variable handling for the Calshare application.
//!
//! Two naming patterns are recognised:
//!
//! * prefixed configuration paths, e.g. `CALSHARE__SUPABASE__URL`
//! * plain service variables, e.g. `SUPABASE_URL` and `SUPABASE_ANON_KEY`
//!
//! The plain names are the ones hosted-backend dashboards hand out, so they are
//! accepted as a baseline that prefixed variables can override.

use std::collections::HashMap;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "CALSHARE";

/// The separator for prefixed configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for plain service environment variables
pub const PLAIN_SEPARATOR: &str = "_";

/// Plain variable holding the backend endpoint URL
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";

/// Plain variable holding the anonymous-tier API key
pub const SUPABASE_ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Configuration paths that may be supplied through plain variables
pub const PLAIN_PATHS: [&str; 2] = ["supabase.url", "supabase.anon_key"];

/// Get the prefix for configuration environment variables
pub fn get_config_prefix(vars: &HashMap<String, String>) -> String {
    vars.get("PREFIX")
        .cloned()
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to a prefixed environment variable name
///
/// # Arguments
///
/// * `prefix` - The variable prefix (e.g., "CALSHARE")
/// * `path` - The configuration path (e.g., "server.host")
///
/// # Returns
///
/// The environment variable name (e.g., "CALSHARE__SERVER__HOST")
pub fn config_path_to_env_var(prefix: &str, path: &str) -> String {
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a configuration path to its plain environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "supabase.anon_key")
///
/// # Returns
///
/// The environment variable name (e.g., "SUPABASE_ANON_KEY")
pub fn plain_path_to_env_var(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 2 {
        return path.to_uppercase();
    }

    let service = parts[0];
    let key = parts[1..].join(PLAIN_SEPARATOR);
    format!("{}_{}", service, key).to_uppercase()
}

/// Check if a path holds a credential
///
/// Paths containing "secret", "key", "password" or "token" are considered secret
/// and their values are never logged.
pub fn is_secret_path(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    path_lower.contains("secret")
        || path_lower.contains("key")
        || path_lower.contains("password")
        || path_lower.contains("token")
}

/// Re-key the plain service variables found in `vars` under their prefixed names.
///
/// The result is fed to the config builder as a lower-priority environment
/// source, so `CALSHARE__SUPABASE__URL` still wins over `SUPABASE_URL`.
pub fn plain_vars_as_prefixed(
    vars: &HashMap<String, String>,
    prefix: &str,
) -> HashMap<String, String> {
    let mut mapped = HashMap::new();
    for path in PLAIN_PATHS {
        let plain = plain_path_to_env_var(path);
        if let Some(value) = vars.get(&plain) {
            if is_secret_path(path) {
                tracing::debug!("Using {} from environment", plain);
            } else {
                tracing::debug!("Using {}={} from environment", plain, value);
            }
            mapped.insert(config_path_to_env_var(prefix, path), value.clone());
        }
    }
    mapped
}
