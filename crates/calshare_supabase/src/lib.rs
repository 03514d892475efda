//! Supabase integration for Calshare
//!
//! This crate owns the connection to the hosted backend:
//!
//! - [`SupabaseClient`]: the handle, built from the endpoint URL and the
//!   anonymous-tier key without any network I/O
//! - [`global`]: the process-wide handle, bound once at startup
//! - [`AppContext`]: configuration plus handle, for dependency injection
//! - [`query`]: a PostgREST request builder
//! - [`repository`]: typed access to `calendars`, `bookings` and `calendar_shares`
//! - [`routes`]: read-only HTTP endpoints over the repositories
//!
//! # Example
//!
//! ```rust,no_run
//! use calshare_supabase::{global, Repository};
//!
//! async fn first_calendar() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = global::init_from_env()?;
//!     let calendar = client.calendars().read("c1").await?;
//!     println!("{:?}", calendar);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod context;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod global;
pub mod handlers;
pub mod query;
pub mod repository;
pub mod routes;

pub use client::SupabaseClient;
pub use context::AppContext;
pub use error::SupabaseError;
pub use repository::{
    BookingRepository, CalendarRepository, CalendarShareRepository, Repository,
};
pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::CalshareApiDoc;
}
