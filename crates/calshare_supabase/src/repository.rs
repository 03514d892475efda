//! Typed access to the `calendars`, `bookings` and `calendar_shares` tables
//!
//! The repositories borrow a [`SupabaseClient`], so they are cheap to create
//! per request. Which rows are visible or writable is decided by the
//! backend's row level security, not here.

use calshare_common::models::{format_timestamp, normalize_email};
use calshare_common::{
    Booking, BookingPatch, Calendar, CalendarPatch, CalendarShare, CalendarSharePatch, NewBooking,
    NewCalendar, NewCalendarShare, Record,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use tracing::{debug, info};

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use crate::query::escape_like;

/// Basic row operations shared by all tables.
pub trait Repository<T: Record> {
    /// Payload accepted by `create`
    type New: Serialize + Send + Sync;
    /// Payload accepted by `update`
    type Patch: Serialize + Send + Sync;

    /// Insert a row and return it as stored
    fn create(&self, new: Self::New) -> impl Future<Output = Result<T, SupabaseError>> + Send;

    /// Fetch a row by id
    fn read(&self, id: &str) -> impl Future<Output = Result<Option<T>, SupabaseError>> + Send;

    /// Patch a row by id and return it as stored
    fn update(
        &self,
        id: &str,
        patch: Self::Patch,
    ) -> impl Future<Output = Result<T, SupabaseError>> + Send;

    /// Delete a row by id; `false` when nothing matched
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, SupabaseError>> + Send;
}

/// Row operations keyed by `id`, shared by the table repositories.
#[derive(Debug)]
struct Rows<'a, T> {
    client: &'a SupabaseClient,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Rows<'a, T> {
    fn new(client: &'a SupabaseClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    async fn insert<N: Serialize + Sync>(&self, new: &N) -> Result<T, SupabaseError> {
        let mut stored: Vec<T> = self.client.from(T::TABLE).insert(new).await?;
        let row = stored
            .pop()
            .ok_or_else(|| SupabaseError::EmptyResponse(format!("insert into {}", T::TABLE)))?;
        info!("Created {} row {}", T::TABLE, row.id());
        Ok(row)
    }

    async fn read(&self, id: &str) -> Result<Option<T>, SupabaseError> {
        self.client.from(T::TABLE).eq("id", id).maybe_single().await
    }

    async fn update<P: Serialize + Sync>(&self, id: &str, patch: &P) -> Result<T, SupabaseError> {
        let mut updated: Vec<T> = self.client.from(T::TABLE).eq("id", id).update(patch).await?;
        let row = updated
            .pop()
            .ok_or_else(|| SupabaseError::NotFound(format!("{} row {}", T::TABLE, id)))?;
        debug!("Updated {} row {}", T::TABLE, id);
        Ok(row)
    }

    async fn delete(&self, id: &str) -> Result<bool, SupabaseError> {
        let deleted: Vec<T> = self.client.from(T::TABLE).eq("id", id).delete().await?;
        if !deleted.is_empty() {
            info!("Deleted {} row {}", T::TABLE, id);
        }
        Ok(!deleted.is_empty())
    }
}

/// Calendars, owned by one user each.
#[derive(Debug)]
pub struct CalendarRepository<'a> {
    rows: Rows<'a, Calendar>,
}

impl<'a> CalendarRepository<'a> {
    pub fn new(client: &'a SupabaseClient) -> Self {
        Self {
            rows: Rows::new(client),
        }
    }

    /// Calendars owned by `user_id`, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Calendar>, SupabaseError> {
        self.rows
            .client
            .from(Calendar::TABLE)
            .eq("user_id", user_id)
            .order("created_at", true)
            .execute()
            .await
    }

    /// Calendars explicitly marked public. Rows without the flag are not included.
    pub async fn list_public(&self) -> Result<Vec<Calendar>, SupabaseError> {
        self.rows
            .client
            .from(Calendar::TABLE)
            .eq("is_public", true)
            .order("name", true)
            .execute()
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Calendar>, SupabaseError> {
        self.rows.read(id).await
    }
}

impl Repository<Calendar> for CalendarRepository<'_> {
    type New = NewCalendar;
    type Patch = CalendarPatch;

    async fn create(&self, new: NewCalendar) -> Result<Calendar, SupabaseError> {
        new.validate()?;
        self.rows.insert(&new).await
    }

    async fn read(&self, id: &str) -> Result<Option<Calendar>, SupabaseError> {
        self.rows.read(id).await
    }

    async fn update(&self, id: &str, patch: CalendarPatch) -> Result<Calendar, SupabaseError> {
        self.rows.update(id, &patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool, SupabaseError> {
        self.rows.delete(id).await
    }
}

/// Bookings, each on exactly one calendar.
#[derive(Debug)]
pub struct BookingRepository<'a> {
    rows: Rows<'a, Booking>,
}

impl<'a> BookingRepository<'a> {
    pub fn new(client: &'a SupabaseClient) -> Self {
        Self {
            rows: Rows::new(client),
        }
    }

    /// Every booking on a calendar, by start time.
    pub async fn list_for_calendar(&self, calendar_id: &str) -> Result<Vec<Booking>, SupabaseError> {
        self.rows
            .client
            .from(Booking::TABLE)
            .eq("calendar_id", calendar_id)
            .order("start_time", true)
            .execute()
            .await
    }

    /// Bookings on a calendar that overlap the half-open window `[from, to)`, by start time.
    pub async fn list_in_range(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, SupabaseError> {
        if from >= to {
            return Err(SupabaseError::Validation(format!(
                "window start {} is not before its end {}",
                from, to
            )));
        }
        self.rows
            .client
            .from(Booking::TABLE)
            .eq("calendar_id", calendar_id)
            .lt("start_time", format_timestamp(to))
            .gt("end_time", format_timestamp(from))
            .order("start_time", true)
            .execute()
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Booking>, SupabaseError> {
        self.rows.read(id).await
    }
}

impl Repository<Booking> for BookingRepository<'_> {
    type New = NewBooking;
    type Patch = BookingPatch;

    /// Rejects `start_time >= end_time` before anything is sent.
    async fn create(&self, new: NewBooking) -> Result<Booking, SupabaseError> {
        new.validate()?;
        self.rows.insert(&new).await
    }

    async fn read(&self, id: &str) -> Result<Option<Booking>, SupabaseError> {
        self.rows.read(id).await
    }

    async fn update(&self, id: &str, patch: BookingPatch) -> Result<Booking, SupabaseError> {
        patch.validate()?;
        self.rows.update(id, &patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool, SupabaseError> {
        self.rows.delete(id).await
    }
}

/// Shares granting non-owners access to a calendar.
#[derive(Debug)]
pub struct CalendarShareRepository<'a> {
    rows: Rows<'a, CalendarShare>,
}

impl<'a> CalendarShareRepository<'a> {
    pub fn new(client: &'a SupabaseClient) -> Self {
        Self {
            rows: Rows::new(client),
        }
    }

    pub async fn list_for_calendar(
        &self,
        calendar_id: &str,
    ) -> Result<Vec<CalendarShare>, SupabaseError> {
        self.rows
            .client
            .from(CalendarShare::TABLE)
            .eq("calendar_id", calendar_id)
            .order("created_at", true)
            .execute()
            .await
    }

    /// Shares granted to `email`, compared case-insensitively.
    ///
    /// Rows written by other clients may keep the address as typed, so the
    /// lookup is an `ilike` on the escaped address rather than `eq`.
    pub async fn list_shared_with(&self, email: &str) -> Result<Vec<CalendarShare>, SupabaseError> {
        let mut shares: Vec<CalendarShare> = self
            .rows
            .client
            .from(CalendarShare::TABLE)
            .ilike("shared_with_email", &escape_like(&normalize_email(email)))
            .order("created_at", true)
            .execute()
            .await?;
        // `*` can only be sent as a wildcard.
        shares.retain(|share| share.is_shared_with(email));
        Ok(shares)
    }

    /// Grant or revoke edit permission on an existing share.
    pub async fn set_can_edit(&self, id: &str, can_edit: bool) -> Result<CalendarShare, SupabaseError> {
        let patch = CalendarSharePatch {
            can_edit: Some(can_edit),
        };
        self.rows.update(id, &patch).await
    }
}

impl Repository<CalendarShare> for CalendarShareRepository<'_> {
    type New = NewCalendarShare;
    type Patch = CalendarSharePatch;

    async fn create(&self, new: NewCalendarShare) -> Result<CalendarShare, SupabaseError> {
        new.validate()?;
        let new = NewCalendarShare {
            shared_with_email: normalize_email(&new.shared_with_email),
            ..new
        };
        self.rows.insert(&new).await
    }

    async fn read(&self, id: &str) -> Result<Option<CalendarShare>, SupabaseError> {
        self.rows.read(id).await
    }

    async fn update(
        &self,
        id: &str,
        patch: CalendarSharePatch,
    ) -> Result<CalendarShare, SupabaseError> {
        self.rows.update(id, &patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool, SupabaseError> {
        self.rows.delete(id).await
    }
}
