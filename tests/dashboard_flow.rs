//! End-to-end dashboard flow against a mock analysis endpoint.

use chrono::Utc;
use shoplens::contract::check_ordering;
use shoplens::report::{self, Dashboard, DashboardMetadata, RenderOptions};
use shoplens::{
    build_views, AnalysisClient, PayloadSource, Session, SessionState, View, FAILURE_MESSAGE,
};
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/analysis.json")
}

fn fixture_body() -> serde_json::Value {
    let raw = std::fs::read_to_string(fixture_path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn session_for(server: &MockServer) -> Session {
    let client = tokio_test::assert_ok!(AnalysisClient::new(
        format!("{}/api/analysis", server.uri()),
        Duration::from_secs(5),
    ));
    Session::new(PayloadSource::Http(client))
}

fn render(source: &str, state: &SessionState) -> String {
    let payload = state.payload().unwrap();
    let dashboard = Dashboard {
        metadata: DashboardMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            warnings: check_ordering(payload)
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
        views: build_views(payload),
    };
    report::generate_markdown_report(&dashboard, &RenderOptions::default())
}

#[tokio::test]
async fn test_fetch_to_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_body()))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    assert!(session.start());
    let state = session.settled().await;
    assert_eq!(state.label(), "loaded");

    let markdown = render(&server.uri(), &state);
    assert!(markdown.contains("## PostgreSQL Analysis"));
    assert!(markdown.contains("## MongoDB Analysis"));
    assert!(markdown.contains("- Average Events per Session: 3.46"));
    assert!(markdown.contains("- Purchase Conversion Rate: 12.35%"));
    assert!(markdown.contains("| 42 |"));
    assert!(!markdown.contains("**Warning:**"));
}

#[tokio::test]
async fn test_server_error_surfaces_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.start();
    let state = session.settled().await;

    match &state {
        SessionState::Failed { message, cause } => {
            assert_eq!(message, FAILURE_MESSAGE);
            assert!(cause.contains("500"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        report::generate_status_text(&state).as_deref(),
        Some("Error: Failed to fetch analysis data")
    );
}

#[tokio::test]
async fn test_file_source_matches_http_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_body()))
        .mount(&server)
        .await;

    let http = session_for(&server);
    http.start();
    let from_http = http.settled().await;

    let file = Session::new(PayloadSource::File(fixture_path()));
    file.start();
    let from_file = file.settled().await;

    assert_eq!(from_http, from_file);

    let views = build_views(from_file.payload().unwrap());
    assert_eq!(views.len(), 6);
    match &views[5] {
        View::BarChart(chart) => {
            assert_eq!(chart.categories, vec!["09:00", "10:00"]);
            assert_eq!(chart.series.len(), 6);
        }
        other => panic!("expected hourly chart, got {:?}", other),
    }
}
