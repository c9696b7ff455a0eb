#![allow(clippy::unwrap_used)]
// End-to-end tests for `Reporter` against a wiremock PMS.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use innkeep_api::{SecretString, TokenPair};
use innkeep_core::{
    CoreError, DateRange, Decimal, DetailOptions, FetchOptions, MemoryCredentialStore,
    OAuthConfig, ProgressChannel, Reporter, ServiceConfig, SourceMatcher, TlsMode,
};

// ── Helpers ─────────────────────────────────────────────────────────

const LIST_PATH: &str = "/api/v1.1/getReservations";
const DETAIL_PATH: &str = "/api/v1.1/getReservation";

fn service_config(server: &MockServer) -> ServiceConfig {
    let base = Url::parse(&server.uri()).unwrap();
    ServiceConfig {
        api_url: base.join("/api/v1.1").unwrap(),
        property_id: None,
        oauth: OAuthConfig {
            client_id: "client-1".into(),
            client_secret: SecretString::from("secret-1".to_owned()),
            redirect_uri: "https://example.test/callback".into(),
            authorize_url: base.join("/api/v1.1/oauth").unwrap(),
            token_url: base.join("/api/v1.1/access_token").unwrap(),
            scopes: vec!["read:reservation".into()],
        },
        tls: TlsMode::System,
        timeout: Duration::from_secs(5),
        fetch: FetchOptions {
            page_size: 2,
            batch_size: 5,
            inter_batch_delay: Duration::from_millis(10),
        },
        details: DetailOptions {
            batch_size: 3,
            inter_batch_delay: Duration::from_millis(10),
        },
        sources: SourceMatcher::default(),
    }
}

fn logged_in() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_pair(TokenPair::new(
        SecretString::from("token".to_owned()),
        Some(SecretString::from("refresh".to_owned())),
    )))
}

fn reservation(id: &str, source: &str) -> serde_json::Value {
    json!({
        "reservationID": id,
        "guestName": format!("Guest {id}"),
        "startDate": "2024-11-02",
        "endDate": "2024-11-06",
        "sourceName": source,
        "total": 0
    })
}

async fn mount_page(server: &MockServer, page: u32, total: u64, rows: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": rows,
            "total": total
        })))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("reservationID", id))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data })),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_monthly_report_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("checkout_from", "2024-11-01"))
        .and(query_param("checkout_to", "2024-11-30"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [reservation("R1", "Google ADS"), reservation("R2", "Direct")],
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 2, 3, vec![reservation("R3", "Website/Booking Engine")]).await;

    mount_detail(&server, "R1", json!({ "total": "150.00", "subTotal": "130.00" })).await;
    mount_detail(
        &server,
        "R3",
        json!({ "rooms": [{ "total": "50" }, { "total": "25" }] }),
    )
    .await;

    let progress = ProgressChannel::new();
    let mut rx = progress.subscribe();
    let reporter = Reporter::new(service_config(&server), logged_in(), progress).unwrap();

    let report = reporter.monthly_report(2024, 11).await.unwrap();

    assert_eq!(report.period(), "November 2024");
    let ids: Vec<&str> = report.items().iter().map(|i| i.reservation_id.as_str()).collect();
    assert_eq!(ids, ["R1", "R3"]);
    assert_eq!(report.items()[0].subtotal, dec("130.00"));
    assert_eq!(report.items()[0].commission, dec("7.50"));
    assert_eq!(report.items()[1].commission, dec("3.75"));
    assert_eq!(report.total_sales(), dec("225"));
    assert_eq!(report.total_commission(), dec("11.25"));
    assert!(report.is_complete());

    let first = rx.recv().await.unwrap();
    assert!(first.starts_with("Fetching checked-out reservations"), "{first}");
}

#[tokio::test]
async fn test_listing_reports_skipped_pages() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        6,
        vec![reservation("R1", "Direct"), reservation("R2", "Direct")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        3,
        6,
        vec![reservation("R5", "Direct"), reservation("R6", "Direct")],
    )
    .await;

    let reporter =
        Reporter::new(service_config(&server), logged_in(), ProgressChannel::new()).unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
    );

    let listing = reporter.list_reservations(range).await.unwrap();

    assert!(listing.success);
    assert_eq!(listing.total_reported, 6);
    assert_eq!(listing.skipped_pages, vec![2]);
    let ids: Vec<&str> = listing.data.iter().map(|r| r.reservation_id.as_str()).collect();
    assert_eq!(ids, ["R1", "R2", "R5", "R6"]);
}

#[tokio::test]
async fn test_report_without_credentials_is_not_authenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let reporter = Reporter::new(
        service_config(&server),
        Arc::new(MemoryCredentialStore::new()),
        ProgressChannel::new(),
    )
    .unwrap();

    let err = reporter.monthly_report(2024, 11).await.unwrap_err();
    assert!(matches!(err, CoreError::NotAuthenticated), "got: {err:?}");
    assert!(err.needs_reauthorization());
}

#[tokio::test]
async fn test_reversed_range_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let reporter =
        Reporter::new(service_config(&server), logged_in(), ProgressChannel::new()).unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
    );

    let err = reporter.build_report(range, "backwards").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPeriod { .. }), "got: {err:?}");
}
