use axum::{routing::get, Router};
use tracing::info;

use crate::context::AppContext;
use crate::handlers::{
    get_calendar_handler, list_bookings_handler, list_calendar_shares_handler,
    list_calendars_handler, list_shared_with_handler,
};

/// Create the calendar routes.
///
/// The router is meant to be nested under the service's API prefix.
pub fn routes(ctx: AppContext) -> Router {
    info!("Calendar routes initialized for {}", ctx.supabase.url());

    Router::new()
        .route("/calendars", get(list_calendars_handler))
        .route("/calendars/{id}", get(get_calendar_handler))
        .route("/calendars/{id}/bookings", get(list_bookings_handler))
        .route("/calendars/{id}/shares", get(list_calendar_shares_handler))
        .route("/shares", get(list_shared_with_handler))
        .with_state(ctx)
}
