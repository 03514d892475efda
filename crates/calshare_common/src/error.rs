use std::fmt;
use thiserror::Error;

/// The base error type for all Calshare errors.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>` for
/// `CalshareError`, so handlers and binaries only deal with this one type.
#[derive(Error, Debug)]
pub enum CalshareError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The backend rejected the credentials
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error reported by the remote backend
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., resource already exists)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to rate limiting
    #[error("Rate limited: {0}")]
    RateLimitError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for CalshareError {
    fn status_code(&self) -> u16 {
        match self {
            CalshareError::HttpError(_) => 502,
            CalshareError::ParseError(_) => 502,
            CalshareError::ConfigError(_) => 500,
            CalshareError::AuthError(_) => 401,
            CalshareError::ValidationError(_) => 400,
            CalshareError::ExternalServiceError { .. } => 502,
            CalshareError::ConflictError(_) => 409,
            CalshareError::NotFoundError(_) => 404,
            CalshareError::TimeoutError(_) => 504,
            CalshareError::RateLimitError(_) => 429,
            CalshareError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, CalshareError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, CalshareError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, CalshareError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| CalshareError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, CalshareError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| CalshareError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for CalshareError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CalshareError::TimeoutError(err.to_string())
        } else {
            CalshareError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CalshareError {
    fn from(err: serde_json::Error) -> Self {
        CalshareError::ParseError(err.to_string())
    }
}

impl From<chrono::ParseError> for CalshareError {
    fn from(err: chrono::ParseError) -> Self {
        CalshareError::ValidationError(format!("invalid timestamp: {}", err))
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> CalshareError {
    CalshareError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> CalshareError {
    CalshareError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> CalshareError {
    CalshareError::NotFoundError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> CalshareError {
    CalshareError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
