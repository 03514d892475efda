//! HTTP handlers exposing the calendar tables
//!
//! Each handler builds a per-request client (forwarding the caller's bearer
//! token, if any) and delegates to the repositories. Errors are rendered by
//! `CalshareError`'s `IntoResponse` implementation.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use calshare_common::models::parse_timestamp;
use calshare_common::{not_found, validation_error, Booking, Calendar, CalendarShare, CalshareError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::context::AppContext;

/// Query for `GET /calendars`
#[derive(Debug, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CalendarsQuery {
    /// Owner whose calendars to list; public calendars are listed when absent
    pub user_id: Option<String>,
}

/// Query for `GET /calendars/{id}/bookings`
#[derive(Debug, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct BookingsQuery {
    /// Window start, RFC 3339
    pub from: Option<String>,
    /// Window end (exclusive), RFC 3339
    pub to: Option<String>,
}

/// Query for `GET /shares`
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SharesQuery {
    /// Grantee address
    pub email: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendars",
    params(CalendarsQuery),
    responses(
        (status = 200, description = "Calendars of the user, or public calendars", body = [Calendar]),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Backend error")
    ),
    tag = "Calendars"
))]
pub async fn list_calendars_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<CalendarsQuery>,
) -> Result<Json<Vec<Calendar>>, CalshareError> {
    let client = ctx.client_for(&headers);
    let calendars = match query.user_id.as_deref() {
        Some(user_id) => client.calendars().list_for_user(user_id).await?,
        None => client.calendars().list_public().await?,
    };
    debug!("Returning {} calendars", calendars.len());
    Ok(Json(calendars))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendars/{id}",
    params(("id" = String, Path, description = "Calendar id")),
    responses(
        (status = 200, description = "The calendar", body = Calendar),
        (status = 404, description = "No such calendar")
    ),
    tag = "Calendars"
))]
pub async fn get_calendar_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Calendar>, CalshareError> {
    let client = ctx.client_for(&headers);
    client
        .calendars()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("calendar {}", id)))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendars/{id}/bookings",
    params(("id" = String, Path, description = "Calendar id"), BookingsQuery),
    responses(
        (status = 200, description = "Bookings ordered by start time", body = [Booking]),
        (status = 400, description = "Invalid time window")
    ),
    tag = "Bookings"
))]
pub async fn list_bookings_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, CalshareError> {
    let client = ctx.client_for(&headers);
    let bookings = match parse_window(query.from.as_deref(), query.to.as_deref())? {
        Some((from, to)) => client.bookings().list_in_range(&id, from, to).await?,
        None => client.bookings().list_for_calendar(&id).await?,
    };
    Ok(Json(bookings))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendars/{id}/shares",
    params(("id" = String, Path, description = "Calendar id")),
    responses(
        (status = 200, description = "Shares of the calendar", body = [CalendarShare])
    ),
    tag = "Shares"
))]
pub async fn list_calendar_shares_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<CalendarShare>>, CalshareError> {
    let client = ctx.client_for(&headers);
    Ok(Json(client.calendar_shares().list_for_calendar(&id).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/shares",
    params(SharesQuery),
    responses(
        (status = 200, description = "Shares granted to the address", body = [CalendarShare])
    ),
    tag = "Shares"
))]
pub async fn list_shared_with_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<SharesQuery>,
) -> Result<Json<Vec<CalendarShare>>, CalshareError> {
    if query.email.trim().is_empty() {
        return Err(validation_error("email must not be empty"));
    }
    let client = ctx.client_for(&headers);
    Ok(Json(
        client
            .calendar_shares()
            .list_shared_with(&query.email)
            .await?,
    ))
}

/// Parses an optional `[from, to)` window; both ends or neither must be given.
fn parse_window(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, CalshareError> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => Ok(Some((parse_timestamp(from)?, parse_timestamp(to)?))),
        _ => Err(validation_error(
            "both `from` and `to` are required for a time window",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert!(parse_window(None, None).unwrap().is_none());

        let (from, to) = parse_window(
            Some("2024-01-01T00:00:00Z"),
            Some("2024-01-02T00:00:00+00:00"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(to - from, chrono::Duration::days(1));

        assert!(parse_window(Some("2024-01-01T00:00:00Z"), None).is_err());
        assert!(parse_window(Some("monday"), Some("tuesday")).is_err());
    }
}
