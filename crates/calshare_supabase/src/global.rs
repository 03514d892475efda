//! Process-wide client handle
//!
//! The handle is bound once, at startup, and shared read-only afterwards.
//! Prefer passing an [`AppContext`](crate::context::AppContext) around; this
//! module exists for code that has no context to hand.

use calshare_common::logging::log_result;
use calshare_config::SupabaseConfig;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::warn;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

static CLIENT: OnceCell<Arc<SupabaseClient>> = OnceCell::new();

/// Builds the process-wide client on first call.
///
/// Later calls return the same instance and ignore `config`; a warning is
/// logged when it points somewhere else. Concurrent first calls race safely,
/// exactly one client is kept.
pub fn init(config: &SupabaseConfig) -> Result<Arc<SupabaseClient>, SupabaseError> {
    if let Some(existing) = CLIENT.get() {
        if !existing.same_target(config) {
            warn!(
                "Supabase client already initialized for {}; ignoring new configuration",
                existing.url()
            );
        }
        return Ok(existing.clone());
    }
    let client = CLIENT.get_or_try_init(|| {
        log_result(
            SupabaseClient::new(config).map(Arc::new),
            "Process-wide Supabase client initialized",
            "Supabase client initialization failed",
        )
    })?;
    Ok(client.clone())
}

/// Loads the configuration from the environment and builds the process-wide client.
pub fn init_from_env() -> Result<Arc<SupabaseClient>, SupabaseError> {
    if let Some(existing) = CLIENT.get() {
        return Ok(existing.clone());
    }
    let config =
        calshare_config::load_config().map_err(|e| SupabaseError::ConfigError(e.to_string()))?;
    init(&config.supabase)
}

/// The process-wide client, if `init` has run.
pub fn client() -> Result<Arc<SupabaseClient>, SupabaseError> {
    CLIENT.get().cloned().ok_or(SupabaseError::NotInitialized)
}
