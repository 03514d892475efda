use calshare_config::AppConfig;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use std::sync::Arc;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use crate::global;

/// Application context built once at startup and handed to every consumer.
///
/// Cloning shares the same configuration and client.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub supabase: Arc<SupabaseClient>,
}

impl AppContext {
    /// Builds a context with its own client.
    pub fn new(config: AppConfig) -> Result<Self, SupabaseError> {
        let supabase = Arc::new(SupabaseClient::new(&config.supabase)?);
        Ok(Self::with_client(Arc::new(config), supabase))
    }

    /// Builds a context around the process-wide client, initializing it if needed.
    pub fn from_global(config: Arc<AppConfig>) -> Result<Self, SupabaseError> {
        let supabase = global::init(&config.supabase)?;
        Ok(Self::with_client(config, supabase))
    }

    /// Builds a context from parts, e.g. a client pointed at a test server.
    pub fn with_client(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Self {
        Self { config, supabase }
    }

    /// Client for one incoming request.
    ///
    /// A `Bearer` token on the request is forwarded so the backend applies the
    /// caller's row level security; otherwise the anonymous role is used.
    pub fn client_for(&self, headers: &HeaderMap) -> SupabaseClient {
        match bearer_token(headers) {
            Some(token) => self.supabase.with_access_token(token),
            None => self.supabase.as_ref().clone(),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calshare_config::SupabaseConfig;
    use reqwest::header::HeaderValue;

    fn config() -> AppConfig {
        AppConfig {
            supabase: SupabaseConfig::new("https://example.test", "public-key-123"),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(AppContext::new(AppConfig::default()).is_err());
    }

    #[test]
    fn test_clones_share_one_client() {
        let ctx = AppContext::new(config()).unwrap();
        let copy = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.supabase, &copy.supabase));
        assert!(Arc::ptr_eq(&ctx.config, &copy.config));
    }

    #[test]
    fn test_client_for_forwards_bearer_token() {
        let ctx = AppContext::new(config()).unwrap();

        let mut headers = HeaderMap::new();
        assert!(!ctx.client_for(&headers).has_access_token());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer user-jwt"));
        assert!(ctx.client_for(&headers).has_access_token());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(!ctx.client_for(&headers).has_access_token());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  tok "));
        assert_eq!(bearer_token(&headers), Some("tok"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
