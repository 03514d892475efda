//! PostgREST request builder
//!
//! Filters become query parameters of the form `column=op.value`, e.g.
//! `calendar_id=eq.c1`. Terminal methods consume the builder and send the
//! request.

use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Error body PostgREST sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// A request against one table, built up filter by filter.
#[derive(Debug)]
#[must_use = "a query does nothing until a terminal method is awaited"]
pub struct QueryBuilder<'a> {
    client: &'a SupabaseClient,
    table: String,
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(client: &'a SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns, e.g. `"id,name"`. Defaults to `*`.
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive pattern match; `%` and `*` are wildcards.
    ///
    /// Use [`escape_like`] to match a user-supplied value literally.
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// Add a raw PostgREST filter, `column=operator.value`.
    pub fn filter(mut self, column: &str, operator: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", operator, value.to_string())));
        self
    }

    /// Sort by `column`. Repeated calls add secondary sort keys.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Query parameters in the order they are sent
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        params.push((
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        ));
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Fetch every matching row.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        let request = self.build(Method::GET);
        rows(send(request).await?).await
    }

    /// Fetch exactly one row; zero or several rows is an error.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T, SupabaseError> {
        let table = self.table.clone();
        let request = self.build(Method::GET).header(ACCEPT, SINGLE_OBJECT);
        let response = send(request).await?;
        // PostgREST answers 406 when the row count is not exactly one.
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(SupabaseError::NotFound(format!(
                "expected exactly one row in {}",
                table
            )));
        }
        let body = checked_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch zero or one row; several rows is an error.
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, SupabaseError> {
        let table = self.table.clone();
        let mut found: Vec<T> = self.limit(2).execute().await?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(SupabaseError::ApiError {
                status: StatusCode::NOT_ACCEPTABLE.as_u16(),
                code: None,
                message: format!("expected at most one row in {}, got {}", table, n),
            }),
        }
    }

    /// Insert `body` (a record or a slice of records) and return the stored rows.
    pub async fn insert<B, T>(self, body: &B) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .request(Method::POST, &self.table)
            .query(&[("select", self.columns.as_deref().unwrap_or("*"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        rows(send(request).await?).await
    }

    /// Apply `patch` to every filtered row and return the updated rows.
    pub async fn update<B, T>(self, patch: &B) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.ensure_filtered("update")?;
        let request = self
            .build(Method::PATCH)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(patch);
        rows(send(request).await?).await
    }

    /// Delete every filtered row and return what was deleted.
    pub async fn delete<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        self.ensure_filtered("delete")?;
        let request = self
            .build(Method::DELETE)
            .header("Prefer", RETURN_REPRESENTATION);
        rows(send(request).await?).await
    }

    fn ensure_filtered(&self, action: &'static str) -> Result<(), SupabaseError> {
        if self.filters.is_empty() {
            warn!("Rejected unfiltered {} on {}", action, self.table);
            return Err(SupabaseError::UnfilteredMutation {
                action,
                table: self.table.clone(),
            });
        }
        Ok(())
    }

    fn build(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.table)
            .query(&self.params())
    }
}

/// Escapes `value` for use as a `like`/`ilike` pattern that matches it literally.
///
/// `\`, `%` and `_` are backslash-escaped. PostgREST rewrites every `*` to `%`
/// with no way to escape it, so `*` becomes the one-character wildcard `_`;
/// callers that need an exact match re-check the returned rows.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

async fn send(request: RequestBuilder) -> Result<Response, SupabaseError> {
    Ok(request.send().await?)
}

async fn checked_body(response: Response) -> Result<String, SupabaseError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    Ok(body)
}

async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, SupabaseError> {
    let body = checked_body(response).await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&body)?)
}

fn api_error(status: StatusCode, body: &str) -> SupabaseError {
    let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();
    let (message, code) = match parsed {
        Some(err) => {
            let mut message = err
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            if let Some(hint) = err.hint.filter(|h| !h.is_empty()) {
                debug!("Supabase hint: {}", hint);
            }
            (message, err.code)
        }
        None if body.trim().is_empty() => (
            status.canonical_reason().unwrap_or("error").to_string(),
            None,
        ),
        None => (body.trim().to_string(), None),
    };
    if status.is_server_error() {
        warn!("Supabase returned {}: {}", status, message);
    } else {
        debug!("Supabase returned {}: {}", status, message);
    }
    SupabaseError::ApiError {
        status: status.as_u16(),
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calshare_config::SupabaseConfig;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig::new("https://example.test", "k")).unwrap()
    }

    #[test]
    fn test_params_order_and_defaults() {
        let client = client();
        let query = client
            .from("bookings")
            .eq("calendar_id", "c1")
            .lt("start_time", "2024-01-02T00:00:00Z")
            .order("start_time", true)
            .order("id", false)
            .limit(10);

        assert_eq!(query.table(), "bookings");
        assert_eq!(
            query.params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("calendar_id".to_string(), "eq.c1".to_string()),
                ("start_time".to_string(), "lt.2024-01-02T00:00:00Z".to_string()),
                ("order".to_string(), "start_time.asc,id.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_and_bool_filter() {
        let client = client();
        let params = client
            .from("calendars")
            .select("id,name")
            .eq("is_public", true)
            .params();
        assert_eq!(params[0], ("select".to_string(), "id,name".to_string()));
        assert_eq!(params[1], ("is_public".to_string(), "eq.true".to_string()));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("guest@example.test"), "guest@example.test");
        assert_eq!(escape_like("first_last@example.test"), "first\\_last@example.test");
        assert_eq!(escape_like("100%\\a*b"), "100\\%\\\\a_b");

        let params = client()
            .from("calendar_shares")
            .ilike("shared_with_email", &escape_like("a_b@x.test"))
            .params();
        assert_eq!(
            params[1],
            ("shared_with_email".to_string(), "ilike.a\\_b@x.test".to_string())
        );
    }

    #[test]
    fn test_api_error_uses_postgrest_message() {
        let err = api_error(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value","details":"Key (id)=(c1) already exists.","hint":null}"#,
        );
        match err {
            SupabaseError::ApiError {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(
                    message,
                    "duplicate key value (Key (id)=(c1) already exists.)"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_plain_and_empty_body() {
        match api_error(StatusCode::BAD_GATEWAY, "upstream down") {
            SupabaseError::ApiError { message, .. } => assert_eq!(message, "upstream down"),
            other => panic!("unexpected error: {other:?}"),
        }
        match api_error(StatusCode::UNAUTHORIZED, "") {
            SupabaseError::ApiError { message, .. } => assert_eq!(message, "Unauthorized"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unfiltered_mutations_are_rejected_locally() {
        let client = client();

        let deleted = client.from("bookings").delete::<serde_json::Value>().await;
        assert!(matches!(
            deleted,
            Err(SupabaseError::UnfilteredMutation { action: "delete", .. })
        ));

        let updated = client
            .from("bookings")
            .update::<_, serde_json::Value>(&serde_json::json!({"title": "x"}))
            .await;
        assert!(matches!(
            updated,
            Err(SupabaseError::UnfilteredMutation { action: "update", .. })
        ));
    }
}
