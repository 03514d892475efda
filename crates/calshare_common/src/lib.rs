//! Shared building blocks for the Calshare crates: the backend records,
//! the common error type, logging setup and HTTP helpers.

pub mod error;
pub mod http;
pub mod logging;
pub mod models;

pub use error::{
    config_error, external_service_error, not_found, validation_error, CalshareError, Context,
    HttpStatusCode,
};
pub use http::client::{create_client, HTTP_CLIENT};
pub use models::{
    Booking, BookingPatch, Calendar, CalendarPatch, CalendarShare, CalendarSharePatch,
    NewBooking, NewCalendar, NewCalendarShare, Record,
};
