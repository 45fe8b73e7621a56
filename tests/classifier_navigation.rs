//! Behavior-driven tests for the classifier drill-down
//!
//! These tests verify HOW the classifier moves between views, which data
//! survives each move, and how the strategy selection is bounded.

use std::sync::Arc;

use sectorscope_core::{
    ClassifierController, ClientConfig, DrillDownState, FundStrategy, RestApi, ScopeFilterKey,
    ScriptedHttpClient, ScriptedReply, StrategySelection, Transition, MAX_STRATEGIES,
};

const INDUSTRY_STATS: &str = r#"{
    "total_companies": 2,
    "country_breakdown": [{"country": "Israel", "count": 2}],
    "companies": [
        {"ticker": "ESLT", "company_name": "Elbit Systems", "exchange_name": "TASE"},
        {"ticker": "NXSN", "company_name": "Next Vision", "exchange_name": "TASE"}
    ]
}"#;

fn classifier(client: &ScriptedHttpClient) -> ClassifierController<RestApi> {
    ClassifierController::new(RestApi::with_http_client(
        ClientConfig::default(),
        Arc::new(client.clone()),
    ))
}

fn backend() -> ScriptedHttpClient {
    ScriptedHttpClient::new()
        .route("/filtered-stats/", ScriptedReply::json(200, INDUSTRY_STATS))
        .route(
            "/industries/",
            ScriptedReply::json(
                200,
                r#"{"sector": "Industrials", "industries": [{"id": 7, "name": "Aerospace & Defense"}]}"#,
            ),
        )
        .route(
            "/stocks/sector-industry-counts/",
            ScriptedReply::json(
                200,
                r#"[{"name": "Industrials", "total_companies": 40,
                    "industries": [{"name": "Aerospace & Defense", "count": 12}]}]"#,
            ),
        )
}

// =============================================================================
// Drill-Down: Entering and Leaving Views
// =============================================================================

#[tokio::test]
async fn when_leaving_an_industry_system_drops_its_companies_but_keeps_scope() {
    // Given: An industry view on TASE with its company list loaded
    let client = backend();
    let mut classifier = classifier(&client);
    classifier.set_exchange("TASE");
    classifier.select_sector("Industrials").await;
    classifier.select_industry("Aerospace & Defense").await;
    assert!(classifier.show_industry_companies());
    assert_eq!(classifier.visible_companies().len(), 2);

    // When: The user steps back
    let transition = classifier.back();

    // Then: The sector view shows, industry data is gone and the scope stays
    assert_eq!(transition, Transition::Moved);
    assert_eq!(
        classifier.state(),
        &DrillDownState::SectorDetail {
            sector: String::from("Industrials")
        }
    );
    assert!(classifier.industry_companies().data().is_none());
    assert!(classifier.industry_detail().data().is_none());
    assert!(!classifier.show_industry_companies());
    assert_eq!(classifier.scope().exchange, "TASE");
    assert!(classifier.sector_detail().data().is_some());
}

#[tokio::test]
async fn when_leaving_a_sector_system_returns_to_sectors_with_cleared_scope() {
    let client = backend();
    let mut classifier = classifier(&client);
    classifier.set_exchange("NASDAQ");
    classifier.select_sector("Industrials").await;
    classifier.set_scope_filter(ScopeFilterKey::MarketCapMin, "100");

    classifier.back();

    assert_eq!(classifier.state(), &DrillDownState::Sectors);
    assert!(classifier.scope().market_cap_min.is_empty());
    assert!(classifier.sector_detail().data().is_none());
    assert_eq!(classifier.exchange(), "NASDAQ");
}

#[test]
fn when_a_transition_is_not_allowed_system_stays_put() {
    // Given: The classifier on the sectors list
    let mut classifier = classifier(&ScriptedHttpClient::new());

    // When: Transitions that need a deeper view are requested
    // Then: Each is ignored
    assert_eq!(classifier.enter_industry("Software"), Transition::Ignored);
    assert_eq!(classifier.build_funds(), Transition::Ignored);
    assert_eq!(classifier.continue_to_parameters(), Transition::Ignored);
    assert_eq!(classifier.back(), Transition::Ignored);
    assert_eq!(classifier.enter_sector("  "), Transition::Ignored);
    assert_eq!(classifier.state(), &DrillDownState::Sectors);
}

#[test]
fn when_building_funds_from_an_industry_system_returns_to_that_industry() {
    let mut classifier = classifier(&ScriptedHttpClient::new());
    classifier.enter_sector("Technology");
    classifier.enter_industry("Semiconductors");

    assert!(classifier.build_funds().moved());
    classifier.toggle_strategy(FundStrategy::FactorBased);
    assert!(classifier.continue_to_parameters().moved());

    classifier.back();
    assert!(matches!(
        classifier.state(),
        DrillDownState::FundConstruction { industry: Some(industry), .. } if industry == "Semiconductors"
    ));
    assert!(classifier.strategies().contains(FundStrategy::FactorBased));

    classifier.back();
    assert_eq!(
        classifier.state(),
        &DrillDownState::IndustryDetail {
            sector: String::from("Technology"),
            industry: String::from("Semiconductors"),
        }
    );
}

// =============================================================================
// Strategy Selection: Capacity
// =============================================================================

#[test]
fn when_full_catalog_is_selected_system_reports_full() {
    // Given: Every strategy in the catalog
    let selection: StrategySelection = FundStrategy::ALL.into_iter().collect();

    // Then: The selection sits exactly at the cap
    assert_eq!(selection.len(), MAX_STRATEGIES);
    assert!(selection.is_full());
}

#[test]
fn when_selection_is_at_capacity_system_refuses_a_new_strategy_without_failing() {
    // Given: A selection capped at two and filled with two strategies
    let mut selection = StrategySelection::with_limit(2);
    assert!(selection.insert(FundStrategy::MarketCapWeighted));
    assert!(selection.insert(FundStrategy::EqualWeighted));
    assert!(selection.is_full());

    // When: A strategy that is not yet selected is inserted
    let before = selection.clone();
    let accepted = selection.insert(FundStrategy::FactorBased);

    // Then: The insert is refused and nothing changes
    assert!(!accepted);
    assert!(!selection.contains(FundStrategy::FactorBased));
    assert_eq!(selection, before);
}

#[test]
fn when_a_smaller_limit_is_reached_system_ignores_new_strategies() {
    // Given: A selection capped at four and already full
    let mut selection = StrategySelection::with_limit(4);
    for strategy in &FundStrategy::ALL[..4] {
        assert!(selection.toggle(*strategy));
    }

    // When: The remaining unselected strategy is toggled
    let toggled = selection.toggle(FundStrategy::ClusterBased);

    // Then: The toggle is refused and the selection keeps its four members
    assert!(!toggled);
    assert_eq!(selection.len(), 4);
    assert!(!selection.contains(FundStrategy::ClusterBased));

    // Deselecting still works at capacity
    assert!(selection.toggle(FundStrategy::MarketCapWeighted));
    assert_eq!(selection.len(), 3);
}

#[test]
fn when_strategies_change_on_parameters_view_system_keeps_state_in_sync() {
    let mut classifier = classifier(&ScriptedHttpClient::new());
    classifier.enter_sector("Energy");
    classifier.build_funds();
    for strategy in FundStrategy::ALL {
        classifier.toggle_strategy(strategy);
    }
    classifier.continue_to_parameters();

    classifier.toggle_strategy(FundStrategy::RiskOptimized);

    let DrillDownState::FundParameters { strategies, .. } = classifier.state() else {
        panic!("expected the parameters view");
    };
    assert_eq!(strategies.len(), 4);
    assert_eq!(strategies, classifier.strategies());
}

// =============================================================================
// Exchange Scope
// =============================================================================

#[tokio::test]
async fn when_exchange_changes_inside_a_sector_system_reloads_scoped_data() {
    // Given: A sector view
    let client = backend();
    let mut classifier = classifier(&client);
    classifier.select_sector("Industrials").await;
    let before = client.request_count("/filtered-stats/");

    // When: The top-level exchange changes
    classifier.change_exchange("TASE").await;

    // Then: The sector list and the sector data reload with the new scope
    assert_eq!(classifier.scope().exchange, "TASE");
    assert_eq!(client.request_count("/stocks/sector-industry-counts/"), 1);
    assert_eq!(client.request_count("/filtered-stats/"), before + 1);
    let last = client
        .requests()
        .into_iter()
        .filter(|r| r.path().ends_with("/filtered-stats/"))
        .last()
        .map(|r| r.url)
        .unwrap_or_default();
    assert!(last.contains("exchange=TASE"), "{last}");
}
