//! Aggregation orchestrator: partial failure, per-kind fetches, stale discard

use std::sync::atomic::Ordering;

use atlasfield_core::{AnalysisKind, ApiError, SiteKind, TrendDirection, TrendReport};
use atlasfield_dashboard::services::aggregation::AggregationOrchestrator;
use atlasfield_dashboard::{AggregationState, AppError, SiteTarget};
use serde_json::json;

use crate::support::{biomass, record, yield_prediction, MockSiteApi};

fn stable_trend() -> TrendReport {
    serde_json::from_value(json!({
        "analyses": [],
        "overall_trend": "stable",
        "has_sufficient_data": true
    }))
    .unwrap()
}

#[tokio::test]
async fn optional_failures_do_not_block_the_bundle() {
    let api = MockSiteApi::new();
    api.set_history(1, Ok(Vec::new()));
    api.set_yield(1, Err(ApiError::status(500, "model unavailable")));
    api.set_biomass(1, Err(ApiError::network("connection reset")));
    let orchestrator = AggregationOrchestrator::new(api.clone());

    let bundle = orchestrator
        .load(SiteTarget::new(1, SiteKind::Field))
        .await
        .unwrap()
        .unwrap();

    assert!(bundle.history.is_empty());
    assert!(bundle.yield_prediction.is_none());
    assert!(bundle.biomass.is_none());
    assert!(matches!(orchestrator.state(), AggregationState::Ready(ref b) if b.site_id == 1));
}

#[tokio::test]
async fn field_bundle_carries_every_source() {
    let api = MockSiteApi::new();
    api.set_history(
        1,
        Ok(vec![record(11, 1, AnalysisKind::Ndvi, 0.6, "2025-05-02T10:00:00", json!({}))]),
    );
    api.set_yield(1, Ok(Some(yield_prediction(4.2))));
    api.set_biomass(1, Ok(Some(biomass(8.0))));
    api.set_field_trends(1, Ok(Some(stable_trend())));
    let orchestrator = AggregationOrchestrator::new(api.clone());

    let bundle = orchestrator
        .load(SiteTarget::new(1, SiteKind::Field))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(bundle.history.len(), 1);
    assert_eq!(bundle.yield_prediction.map(|y| y.yield_per_ha), Some(4.2));
    assert_eq!(bundle.biomass.map(|b| b.total_carbon_t_ha), Some(8.0));
    assert_eq!(bundle.trends.map(|t| t.overall_trend), Some(TrendDirection::Stable));
    assert_eq!(api.field_trend_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.forest_trend_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn forest_skips_yield_and_uses_forest_trends() {
    let api = MockSiteApi::new();
    api.set_forest_trends(2, Ok(Some(stable_trend())));
    let orchestrator = AggregationOrchestrator::new(api.clone());

    let bundle = orchestrator
        .load(SiteTarget::new(2, SiteKind::Forest))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(bundle.site_kind, SiteKind::Forest);
    assert!(bundle.trends.is_some());
    assert_eq!(api.yield_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.biomass_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.forest_trend_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.field_trend_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn history_failure_fails_the_cycle() {
    let api = MockSiteApi::new();
    api.set_history(3, Err(ApiError::status(502, "upstream down")));
    let orchestrator = AggregationOrchestrator::new(api);

    let err = orchestrator
        .load(SiteTarget::new(3, SiteKind::Field))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AggregationFailed { site_id: 3, .. }));
    match orchestrator.state() {
        AggregationState::Failed { site_id, .. } => assert_eq!(site_id, 3),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn begin_publishes_loading_for_the_target() {
    let api = MockSiteApi::new();
    let orchestrator = AggregationOrchestrator::new(api);

    let token = orchestrator.begin(SiteTarget::new(4, SiteKind::Field));
    assert!(orchestrator.state().is_loading());
    assert_eq!(orchestrator.state().site_id(), Some(4));
    assert!(orchestrator.is_current(4));

    orchestrator.fetch(token).await.unwrap();
    assert!(!orchestrator.state().is_loading());
}

#[tokio::test]
async fn superseded_cycle_is_discarded() {
    let api = MockSiteApi::new();
    api.set_history(
        1,
        Ok(vec![record(1, 1, AnalysisKind::Ndvi, 0.3, "2025-05-01T10:00:00", json!({}))]),
    );
    api.set_history(
        2,
        Ok(vec![record(2, 2, AnalysisKind::Ndvi, 0.7, "2025-05-01T10:00:00", json!({}))]),
    );
    let gate = api.gate_history(1);
    let orchestrator = AggregationOrchestrator::new(api);

    let first = orchestrator.begin(SiteTarget::new(1, SiteKind::Field));
    let (stale, fresh) = tokio::join!(orchestrator.fetch(first), async {
        // Site 1 is parked on its gate; switch to site 2, then let site 1 finish
        let fresh = orchestrator.load(SiteTarget::new(2, SiteKind::Field)).await;
        gate.notify_one();
        fresh
    });

    assert!(stale.unwrap().is_none());
    assert_eq!(fresh.unwrap().map(|b| b.site_id), Some(2));
    match orchestrator.state() {
        AggregationState::Ready(bundle) => {
            assert_eq!(bundle.site_id, 2);
            assert_eq!(bundle.history[0].id, 2);
        }
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn refresh_predictions_updates_only_the_current_bundle() {
    let api = MockSiteApi::new();
    api.set_yield(1, Ok(Some(yield_prediction(3.0))));
    let orchestrator = AggregationOrchestrator::new(api.clone());
    let target = SiteTarget::new(1, SiteKind::Field);
    orchestrator.load(target).await.unwrap();

    api.set_yield(1, Ok(Some(yield_prediction(5.5))));
    assert!(orchestrator.refresh_predictions(target).await);
    let yield_per_ha = orchestrator
        .state()
        .bundle()
        .and_then(|b| b.yield_prediction.as_ref().map(|y| y.yield_per_ha));
    assert_eq!(yield_per_ha, Some(5.5));

    assert!(!orchestrator.refresh_predictions(SiteTarget::new(9, SiteKind::Field)).await);
}

#[tokio::test]
async fn clear_returns_to_idle() {
    let api = MockSiteApi::new();
    let orchestrator = AggregationOrchestrator::new(api);
    orchestrator.load(SiteTarget::new(1, SiteKind::Field)).await.unwrap();

    orchestrator.clear();
    assert_eq!(orchestrator.state(), AggregationState::Idle);
    assert!(orchestrator.current_target().is_none());
}
