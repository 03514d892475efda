use calshare_common::{external_service_error, CalshareError};
use thiserror::Error;

/// Errors that can occur when talking to the Supabase backend
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// Missing or invalid endpoint/key configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// The endpoint URL could not be used as a base address
    #[error("Invalid Supabase URL: {0}")]
    InvalidUrl(String),

    /// The process-wide client was requested before `global::init`
    #[error("Supabase client has not been initialized")]
    NotInitialized,

    /// Error during HTTP request to the backend
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the backend
    #[error("Supabase API error (status {status}): {message}")]
    ApiError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to parse Supabase response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// No row matched
    #[error("Not found: {0}")]
    NotFound(String),

    /// A payload was rejected before being sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Update or delete issued without any filter
    #[error("Refusing to {action} every row of {table}; add a filter")]
    UnfilteredMutation { action: &'static str, table: String },

    /// The backend accepted a write but returned no row
    #[error("Backend returned no row for {0}")]
    EmptyResponse(String),

    /// Any other shared error, passed through unchanged
    #[error(transparent)]
    Common(CalshareError),
}

impl From<CalshareError> for SupabaseError {
    fn from(err: CalshareError) -> Self {
        match err {
            CalshareError::ValidationError(message) => SupabaseError::Validation(message),
            CalshareError::ConfigError(message) => SupabaseError::ConfigError(message),
            other => SupabaseError::Common(other),
        }
    }
}

/// Convert SupabaseError to CalshareError
impl From<SupabaseError> for CalshareError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::ConfigError(msg) => CalshareError::ConfigError(msg),
            SupabaseError::InvalidUrl(msg) => {
                CalshareError::ConfigError(format!("invalid Supabase URL: {}", msg))
            }
            SupabaseError::NotInitialized => {
                CalshareError::ConfigError("Supabase client has not been initialized".to_string())
            }
            SupabaseError::RequestError(e) => e.into(),
            SupabaseError::ApiError {
                status, message, ..
            } => match status {
                401 | 403 => CalshareError::AuthError(message),
                404 => CalshareError::NotFoundError(message),
                409 => CalshareError::ConflictError(message),
                429 => CalshareError::RateLimitError(message),
                400 | 422 => CalshareError::ValidationError(message),
                _ => external_service_error(
                    "Supabase",
                    format!("Status: {}, Message: {}", status, message),
                ),
            },
            SupabaseError::ParseError(e) => {
                CalshareError::ParseError(format!("Supabase response parse error: {}", e))
            }
            SupabaseError::NotFound(msg) => CalshareError::NotFoundError(msg),
            SupabaseError::Validation(msg) => CalshareError::ValidationError(msg),
            err @ SupabaseError::UnfilteredMutation { .. } => {
                CalshareError::ValidationError(err.to_string())
            }
            err @ SupabaseError::EmptyResponse(_) => {
                external_service_error("Supabase", err.to_string())
            }
            SupabaseError::Common(err) => err,
        }
    }
}
