//! Supabase client handle
//!
//! `SupabaseClient` holds the endpoint, the anonymous-tier key and a pooled
//! HTTP client. Building one validates the configuration but never touches
//! the network; connections are opened lazily by the first request.
//!
//! Every request carries two credentials, the way the hosted backend expects:
//!
//! * `apikey: <anon key>` identifies the project
//! * `Authorization: Bearer <token>` selects the database role, where the
//!   token is the anon key itself or a signed-in user's access token

use calshare_common::HTTP_CLIENT;
use calshare_config::SupabaseConfig;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Url};
use std::fmt;
use tracing::{debug, info};

use crate::error::SupabaseError;
use crate::query::QueryBuilder;
use crate::repository::{BookingRepository, CalendarRepository, CalendarShareRepository};

/// Path under which the backend serves its tables
pub const REST_PATH: &str = "rest/v1";

const CLIENT_INFO: &str = concat!("calshare-supabase/", env!("CARGO_PKG_VERSION"));

/// Handle for issuing requests against the Supabase backend.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    /// Creates a client that shares the process-wide HTTP connection pool.
    ///
    /// # Errors
    ///
    /// * `ConfigError` if the URL or key is missing
    /// * `InvalidUrl` if the URL is not an absolute http(s) address
    ///
    /// # Example
    ///
    /// ```rust
    /// use calshare_config::SupabaseConfig;
    /// use calshare_supabase::SupabaseClient;
    ///
    /// let config = SupabaseConfig::new("https://example.test", "public-key-123");
    /// let client = SupabaseClient::new(&config).unwrap();
    /// assert_eq!(client.rest_url("bookings"), "https://example.test/rest/v1/bookings");
    /// ```
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        Self::with_http_client(config, HTTP_CLIENT.clone())
    }

    /// Creates a client on top of a caller-supplied HTTP client.
    pub fn with_http_client(config: &SupabaseConfig, http: Client) -> Result<Self, SupabaseError> {
        config
            .validate()
            .map_err(|e| SupabaseError::ConfigError(e.to_string()))?;

        let url = config.url.trim();
        let base_url =
            Url::parse(url).map_err(|e| SupabaseError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(SupabaseError::InvalidUrl(url.to_string()));
        }
        // Table paths are appended to the URL text.
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(SupabaseError::InvalidUrl(format!(
                "{url}: query strings and fragments are not allowed"
            )));
        }
        // Header values are checked here so request building can't fail later.
        HeaderValue::from_str(config.anon_key.trim())
            .map_err(|_| SupabaseError::ConfigError("anon key is not a valid header value".into()))?;

        info!("Supabase client created for {}", base_url);

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.trim().to_string(),
            access_token: None,
        })
    }

    /// Returns a copy of this client that authenticates as a signed-in user.
    ///
    /// The anon key is still sent as `apikey`; only the bearer token changes.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// The configured endpoint
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// Whether requests run as a signed-in user rather than the anonymous role
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Full address of a table endpoint, e.g. `https://x.supabase.co/rest/v1/bookings`
    pub fn rest_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            REST_PATH,
            table
        )
    }

    /// Starts a request against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, table)
    }

    pub fn calendars(&self) -> CalendarRepository<'_> {
        CalendarRepository::new(self)
    }

    pub fn bookings(&self) -> BookingRepository<'_> {
        BookingRepository::new(self)
    }

    pub fn calendar_shares(&self) -> CalendarShareRepository<'_> {
        CalendarShareRepository::new(self)
    }

    /// Whether two handles talk to the same project with the same key.
    pub fn same_target(&self, config: &SupabaseConfig) -> bool {
        self.anon_key == config.anon_key.trim()
            && Url::parse(config.url.trim()).is_ok_and(|url| url == self.base_url)
    }

    pub(crate) fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        debug!("{} {}", method, self.rest_url(table));
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .header("X-Client-Info", CLIENT_INFO)
    }
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.base_url.as_str())
            .field("has_access_token", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}
