//! Behavior-driven tests for fetch failures
//!
//! These tests verify HOW transport and server failures are classified,
//! which banner text they produce, and that a failed refresh never wipes
//! data already on screen.

use std::sync::Arc;

use sectorscope_core::{
    Applied, ClassifierController, ClientConfig, FetchError, HttpError, MarketApi, RestApi,
    ScreenerController, ScriptedHttpClient, ScriptedReply,
};

fn api(client: &ScriptedHttpClient) -> RestApi {
    RestApi::with_http_client(ClientConfig::default(), Arc::new(client.clone()))
}

const ONE_ROW: &str = r#"{"count": 1, "results": [{"id": 1, "ticker": "TEVA"}]}"#;

// =============================================================================
// Failure Classification
// =============================================================================

#[tokio::test]
async fn when_backend_is_unreachable_system_asks_to_start_the_service() {
    // Given: A backend that refuses connections
    let client = ScriptedHttpClient::new().route(
        "/stats/",
        ScriptedReply::error(HttpError::connect("connection refused")),
    );

    // When: Any request is made
    let error = api(&client)
        .database_stats()
        .await
        .expect_err("connection refused");

    // Then: It is reported as unreachable with the service hint
    assert!(matches!(error, FetchError::NetworkUnreachable { .. }));
    assert_eq!(
        error.banner_message(),
        "Cannot connect to server. Please ensure the backend service is running."
    );
}

#[tokio::test]
async fn when_request_times_out_system_treats_backend_as_unreachable() {
    let client = ScriptedHttpClient::new().route(
        "/stats/",
        ScriptedReply::error(HttpError::timeout("deadline elapsed")),
    );

    let error = api(&client).database_stats().await.expect_err("timed out");

    assert_eq!(error.code(), "fetch.network_unreachable");
}

#[tokio::test]
async fn when_server_answers_500_system_reports_a_server_error() {
    // Given: A backend that fails internally
    let client = ScriptedHttpClient::new().route(
        "/filtered-stats/",
        ScriptedReply::json(500, "<html>Internal Server Error</html>"),
    );

    // When: Statistics are requested
    let error = api(&client)
        .filtered_stats(Default::default())
        .await
        .expect_err("status 500");

    // Then: The status is kept and the banner names it
    assert_eq!(
        error,
        FetchError::ServerError {
            status: 500,
            detail: None
        }
    );
    assert!(error.banner_message().contains("status 500"));
}

#[tokio::test]
async fn when_sector_is_unknown_system_surfaces_the_backend_detail() {
    let client = ScriptedHttpClient::new().route(
        "/industries/",
        ScriptedReply::json(404, r#"{"error": "Sector not found"}"#),
    );

    let error = api(&client)
        .sector_industries(String::from("Nope"))
        .await
        .expect_err("unknown sector");

    match &error {
        FetchError::ServerError { status, detail } => {
            assert_eq!(*status, 404);
            assert_eq!(detail.as_deref(), Some("Sector not found"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(error.banner_message().ends_with("Sector not found"));
}

#[tokio::test]
async fn when_body_is_not_json_system_reports_an_unexpected_error() {
    let client =
        ScriptedHttpClient::new().route("/stocks/", ScriptedReply::json(200, "definitely not json"));

    let error = api(&client)
        .list_stocks(Default::default())
        .await
        .expect_err("undecodable body");

    assert!(matches!(error, FetchError::UnexpectedError { .. }));
    assert!(error.banner_message().starts_with("Unexpected error:"));
}

// =============================================================================
// Failure Recovery
// =============================================================================

#[tokio::test]
async fn when_a_refresh_fails_system_keeps_the_rows_already_shown() {
    // Given: A listing that loaded once
    let client = ScriptedHttpClient::new().route("/filtered-stats/", ScriptedReply::json(200, "{}"));
    client.enqueue("/stocks/", ScriptedReply::json(200, ONE_ROW));
    client.enqueue(
        "/stocks/",
        ScriptedReply::error(HttpError::connect("connection reset")),
    );
    let mut screener = ScreenerController::new(api(&client));
    screener.refresh().await;
    assert_eq!(screener.records().len(), 1);

    // When: The next refresh fails
    let (listing, _) = screener.refresh().await;

    // Then: The old rows stay, the error is exposed and loading has stopped
    assert_eq!(listing, Applied::Failed);
    assert_eq!(screener.records()[0].ticker, "TEVA");
    assert!(matches!(
        screener.listing().error(),
        Some(FetchError::NetworkUnreachable { .. })
    ));
    assert!(!screener.listing().loading());
}

#[tokio::test]
async fn when_a_later_refresh_succeeds_system_clears_the_error() {
    let client = ScriptedHttpClient::new()
        .route("/filtered-stats/", ScriptedReply::json(200, "{}"))
        .route("/stocks/", ScriptedReply::json(200, ONE_ROW));
    client.enqueue("/stocks/", ScriptedReply::json(503, "{}"));
    let mut screener = ScreenerController::new(api(&client));

    screener.refresh().await;
    assert!(screener.listing().error().is_some());
    assert!(screener.records().is_empty());

    screener.refresh().await;
    assert!(screener.listing().error().is_none());
    assert_eq!(screener.records().len(), 1);
}

#[tokio::test]
async fn when_sector_load_fails_system_still_enters_the_view() {
    // Given: The classifier backend is down
    let client = ScriptedHttpClient::new()
        .route(
            "/filtered-stats/",
            ScriptedReply::error(HttpError::connect("refused")),
        )
        .route("/industries/", ScriptedReply::error(HttpError::connect("refused")));
    let mut classifier = ClassifierController::new(api(&client));

    // When: A sector is selected
    classifier.select_sector("Energy").await;

    // Then: The view changes and each slot carries its own error
    assert_eq!(classifier.state().sector(), Some("Energy"));
    assert!(classifier.sector_detail().error().is_some());
    assert!(classifier.sector_industries().error().is_some());
    assert!(classifier.sector_summary().is_none());
}
