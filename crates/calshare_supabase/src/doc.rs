use utoipa::OpenApi;

use crate::handlers;
use calshare_common::{Booking, Calendar, CalendarShare};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_calendars_handler,
        handlers::get_calendar_handler,
        handlers::list_bookings_handler,
        handlers::list_calendar_shares_handler,
        handlers::list_shared_with_handler,
    ),
    components(
        schemas(Calendar, Booking, CalendarShare)
    ),
    tags(
        (name = "Calendars", description = "Calendars stored in Supabase"),
        (name = "Bookings", description = "Bookings on a calendar"),
        (name = "Shares", description = "Calendar access grants")
    ),
    servers(
        (url = "/api", description = "Calshare API")
    )
)]
pub struct CalshareApiDoc;
