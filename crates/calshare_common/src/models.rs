//! Records stored in the hosted backend.
//!
//! Field names match the backend's column names so records decode straight
//! from PostgREST responses. Identifiers and timestamps stay as the strings
//! the backend sends; use the helper methods when you need them parsed.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Debug;

use crate::error::{validation_error, CalshareError};

/// A row type living in one backend table.
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Name of the backing table
    const TABLE: &'static str;

    /// Primary key of this row
    fn id(&self) -> &str;
}

/// A named, ownable scheduling calendar.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    /// Owner of the calendar
    pub user_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Presentational tag, e.g. `#3b82f6`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub color: String,
    /// Visibility flag. `None` means the backend did not send it, which is
    /// not the same as an explicit `Some(false)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

impl Calendar {
    /// True only when the calendar is explicitly marked public.
    pub fn is_visible_to_everyone(&self) -> bool {
        self.is_public == Some(true)
    }

    /// Whether `updated_at >= created_at`.
    pub fn timestamps_are_ordered(&self) -> Result<bool, CalshareError> {
        Ok(parse_timestamp(&self.updated_at)? >= parse_timestamp(&self.created_at)?)
    }
}

impl Record for Calendar {
    const TABLE: &'static str = "calendars";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A scheduled time interval on a calendar.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub calendar_id: String,
    /// Creator of the booking
    pub user_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Booking {
    /// Parses `start_time` and `end_time`.
    pub fn time_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), CalshareError> {
        Ok((
            parse_timestamp(&self.start_time)?,
            parse_timestamp(&self.end_time)?,
        ))
    }

    /// Whether the booking starts strictly before it ends.
    ///
    /// Rows are never rejected on decode for this; callers decide what to do.
    pub fn is_well_ordered(&self) -> bool {
        matches!(self.time_range(), Ok((start, end)) if start < end)
    }

    /// Length of the booking, `None` when the times are unparsable or out of order.
    pub fn duration(&self) -> Option<Duration> {
        match self.time_range() {
            Ok((start, end)) if start < end => Some(end - start),
            _ => None,
        }
    }

    /// Whether the booking overlaps the half-open window `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        matches!(self.time_range(), Ok((start, end)) if start < to && end > from)
    }
}

impl Record for Booking {
    const TABLE: &'static str = "bookings";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Access to a calendar granted to someone other than its owner.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarShare {
    pub id: String,
    pub calendar_id: String,
    /// Owner who granted the share
    pub owner_id: String,
    pub shared_with_email: String,
    pub can_edit: bool,
    pub created_at: String,
}

impl CalendarShare {
    /// Whether this share belongs to `calendar` and was granted by its owner.
    pub fn is_granted_by_owner_of(&self, calendar: &Calendar) -> bool {
        self.calendar_id == calendar.id && self.owner_id == calendar.user_id
    }

    /// Case-insensitive match against the grantee address.
    pub fn is_shared_with(&self, email: &str) -> bool {
        normalize_email(&self.shared_with_email) == normalize_email(email)
    }
}

impl Record for CalendarShare {
    const TABLE: &'static str = "calendar_shares";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Insert payloads: server assigns ids and timestamps ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendar {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl NewCalendar {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: String::new(),
            color: String::new(),
            is_public: None,
        }
    }

    pub fn validate(&self) -> Result<(), CalshareError> {
        if self.user_id.trim().is_empty() {
            return Err(validation_error("calendar needs an owner user_id"));
        }
        if self.name.trim().is_empty() {
            return Err(validation_error("calendar name must not be empty"));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub calendar_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
}

impl NewBooking {
    /// Builds a booking payload, formatting times as RFC 3339 in UTC.
    pub fn new(
        calendar_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            description: String::new(),
            start_time: format_timestamp(start),
            end_time: format_timestamp(end),
        }
    }

    pub fn validate(&self) -> Result<(), CalshareError> {
        if self.calendar_id.trim().is_empty() {
            return Err(validation_error("booking needs a calendar_id"));
        }
        let start = parse_timestamp(&self.start_time)?;
        let end = parse_timestamp(&self.end_time)?;
        if start >= end {
            return Err(validation_error(format!(
                "booking must start before it ends ({} >= {})",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendarShare {
    pub calendar_id: String,
    pub owner_id: String,
    pub shared_with_email: String,
    #[serde(default)]
    pub can_edit: bool,
}

impl NewCalendarShare {
    /// Builds a share for `calendar`, granted by its owner. The address is normalized.
    pub fn for_calendar(calendar: &Calendar, email: &str, can_edit: bool) -> Self {
        Self {
            calendar_id: calendar.id.clone(),
            owner_id: calendar.user_id.clone(),
            shared_with_email: normalize_email(email),
            can_edit,
        }
    }

    pub fn validate(&self) -> Result<(), CalshareError> {
        let email = self.shared_with_email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(validation_error(format!(
                "invalid share address {:?}",
                self.shared_with_email
            ))),
        }
    }
}

// --- Patch payloads: only present fields are sent ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl BookingPatch {
    /// Rejects a patch whose own start/end pair is out of order.
    ///
    /// A patch touching only one side can't be checked without the stored row.
    pub fn validate(&self) -> Result<(), CalshareError> {
        if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
            if parse_timestamp(start)? >= parse_timestamp(end)? {
                return Err(validation_error("booking must start before it ends"));
            }
        }
        Ok(())
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSharePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,
}

/// Parses an RFC 3339 timestamp as sent by the backend.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CalshareError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Formats a timestamp the way payloads send it, e.g. `2024-01-01T10:00:00Z`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
