//! Backend contract tests against a mock Supabase server.

use calshare_common::{
    Booking, Calendar, CalendarPatch, CalendarShare, CalshareError, HttpStatusCode, NewBooking,
    NewCalendar,
};
use calshare_config::SupabaseConfig;
use calshare_supabase::{Repository, SupabaseClient, SupabaseError};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "public-key-123";

fn client_for(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&SupabaseConfig::new(server.uri(), KEY)).unwrap()
}

fn calendar_row(id: &str, is_public: Option<bool>) -> Value {
    let mut row = json!({
        "id": id,
        "user_id": "u1",
        "name": "Team",
        "description": "",
        "color": "#3b82f6",
        "created_at": "2024-01-01T09:00:00+00:00",
        "updated_at": "2024-01-01T09:00:00+00:00"
    });
    if let Some(flag) = is_public {
        row["is_public"] = json!(flag);
    }
    row
}

fn booking_row() -> Value {
    json!({
        "id": "b1",
        "calendar_id": "c1",
        "user_id": "u1",
        "title": "Sync",
        "description": "",
        "start_time": "2024-01-01T10:00:00Z",
        "end_time": "2024-01-01T11:00:00Z",
        "created_at": "2023-12-31T08:00:00Z",
        "updated_at": "2023-12-31T08:00:00Z"
    })
}

fn share_row(can_edit: bool) -> Value {
    json!({
        "id": "s1",
        "calendar_id": "c1",
        "owner_id": "u1",
        "shared_with_email": "guest@example.test",
        "can_edit": can_edit,
        "created_at": "2024-01-02T00:00:00Z"
    })
}

#[tokio::test]
async fn test_construction_makes_no_request() {
    let server = MockServer::start().await;

    let _client = client_for(&server);

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "unexpected requests: {received:?}");
}

#[tokio::test]
async fn test_requests_carry_anon_key_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendars"))
        .and(query_param("user_id", "eq.u1"))
        .and(query_param("order", "created_at.asc"))
        .and(query_param("select", "*"))
        .and(header("apikey", KEY))
        .and(header("authorization", "Bearer public-key-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([calendar_row("c1", None), calendar_row("c2", Some(false))])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let calendars: Vec<Calendar> = client_for(&server)
        .calendars()
        .list_for_user("u1")
        .await
        .unwrap();

    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].is_public, None);
    assert_eq!(calendars[1].is_public, Some(false));
    assert_eq!(calendars[0].created_at, "2024-01-01T09:00:00+00:00");
}

#[tokio::test]
async fn test_access_token_replaces_bearer_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendar_shares"))
        .and(query_param("shared_with_email", "ilike.guest@example.test"))
        .and(header("apikey", KEY))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([share_row(true)])))
        .expect(1)
        .mount(&server)
        .await;

    let user_client = client_for(&server).with_access_token("user-jwt");
    let shares = user_client
        .calendar_shares()
        .list_shared_with("Guest@Example.test")
        .await
        .unwrap();

    assert_eq!(shares.len(), 1);
    assert!(shares[0].can_edit);
}

#[tokio::test]
async fn test_shared_with_lookup_ignores_stored_case() {
    let server = MockServer::start().await;
    let mut stored = share_row(false);
    stored["shared_with_email"] = json!("First_Last@Example.test");
    let mut lookalike = share_row(false);
    lookalike["id"] = json!("s2");
    lookalike["shared_with_email"] = json!("first.last@example.test");
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendar_shares"))
        .and(query_param("shared_with_email", "ilike.first\\_last@example.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored, lookalike])))
        .expect(1)
        .mount(&server)
        .await;

    let shares = client_for(&server)
        .calendar_shares()
        .list_shared_with("first_last@example.test")
        .await
        .unwrap();

    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].id, "s1");
    assert_eq!(shares[0].shared_with_email, "First_Last@Example.test");
}

#[tokio::test]
async fn test_read_missing_row_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendars"))
        .and(query_param("id", "eq.missing"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = client_for(&server).calendars().read("missing").await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_create_booking_posts_payload_and_returns_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "calendar_id": "c1",
            "user_id": "u1",
            "title": "Sync",
            "description": "",
            "start_time": "2024-01-01T10:00:00Z",
            "end_time": "2024-01-01T11:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([booking_row()])))
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
    let stored: Booking = client_for(&server)
        .bookings()
        .create(NewBooking::new("c1", "u1", "Sync", start, end))
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&stored).unwrap(), booking_row());
}

#[tokio::test]
async fn test_bookings_in_window_use_overlap_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("calendar_id", "eq.c1"))
        .and(query_param("start_time", "lt.2024-01-02T00:00:00Z"))
        .and(query_param("end_time", "gt.2024-01-01T00:00:00Z"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking_row()])))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bookings = client_for(&server)
        .bookings()
        .list_in_range("c1", from, to)
        .await
        .unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].title, "Sync");
}

#[tokio::test]
async fn test_set_can_edit_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/calendar_shares"))
        .and(query_param("id", "eq.s1"))
        .and(body_json(json!({"can_edit": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([share_row(false)])))
        .expect(1)
        .mount(&server)
        .await;

    let share: CalendarShare = client_for(&server)
        .calendar_shares()
        .set_can_edit("s1", false)
        .await
        .unwrap();

    assert!(!share.can_edit);
}

#[tokio::test]
async fn test_delete_reports_whether_a_row_matched() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking_row()])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.bookings().delete("b1").await.unwrap());
    assert!(!client.bookings().delete("gone").await.unwrap());
}

#[tokio::test]
async fn test_single_without_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendars"))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": "The result contains 0 rows",
            "hint": null
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .from("calendars")
        .eq("id", "nope")
        .single::<Calendar>()
        .await;

    assert!(matches!(result, Err(SupabaseError::NotFound(_))));
}

#[tokio::test]
async fn test_api_errors_keep_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendars"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .calendars()
        .list_public()
        .await
        .unwrap_err();

    match &err {
        SupabaseError::ApiError {
            status,
            code,
            message,
        } => {
            assert_eq!(*status, 401);
            assert_eq!(code.as_deref(), Some("PGRST301"));
            assert_eq!(message, "JWT expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let common: CalshareError = err.into();
    assert_eq!(common.status_code(), 401);
}

#[tokio::test]
async fn test_unreachable_backend_fails_on_first_use() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = SupabaseClient::new(&SupabaseConfig::new(uri, KEY)).unwrap();
    let result = client.calendars().list_public().await;

    assert!(matches!(result, Err(SupabaseError::RequestError(_))));
}

#[tokio::test]
async fn test_read_with_duplicate_rows_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/calendars"))
        .and(query_param("id", "eq.dup"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([calendar_row("dup", None), calendar_row("dup", None)])),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .calendars()
        .read("dup")
        .await
        .unwrap_err();

    assert!(
        matches!(err, SupabaseError::ApiError { status: 406, .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(CalshareError::from(err).status_code(), 502);
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/calendars"))
        .and(query_param("id", "eq.gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let patch = CalendarPatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let result = client_for(&server).calendars().update("gone", patch).await;

    assert!(matches!(result, Err(SupabaseError::NotFound(_))));
}

#[tokio::test]
async fn test_create_without_returned_row_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/calendars"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .calendars()
        .create(NewCalendar::new("u1", "Team"))
        .await;

    assert!(matches!(result, Err(SupabaseError::EmptyResponse(_))));
}
