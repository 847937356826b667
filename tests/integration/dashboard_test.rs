//! End-to-end wiring of the dashboard state and its view model

use std::sync::atomic::Ordering;
use std::sync::Arc;

use atlasfield_core::{AnalysisKind, ApiError, TrendReport};
use atlasfield_dashboard::models::metrics::{HeadlineMetrics, MetricSource, TrendSummary};
use atlasfield_dashboard::services::selection::{MemoryNavigator, Navigator};
use atlasfield_dashboard::storage::{KeyValueStore, MemoryKeyValueStore, ACTIVE_SITE_KEY};
use atlasfield_dashboard::{AggregationState, AppError, ExecutionStatus};
use serde_json::json;

use crate::support::{field_site, forest_site, harness, harness_with, record, thread, yield_prediction, MockSiteApi};

fn two_fields() -> Arc<MockSiteApi> {
    let api = MockSiteApi::new();
    api.set_sites(vec![field_site(1, "North parcel"), field_site(2, "South parcel")]);
    api
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[tokio::test]
async fn initialize_prefers_navigation_and_aggregates_it() {
    let api = two_fields();
    let backend = Arc::new(MemoryKeyValueStore::new());
    backend.set(ACTIVE_SITE_KEY, "1").unwrap();
    let h = harness_with(api.clone(), backend, Arc::new(MemoryNavigator::with_param("2")));

    assert_eq!(h.dashboard.initialize().await.unwrap(), Some(2));

    let view = h.dashboard.view_model().await;
    assert_eq!(view.active_site.map(|s| s.id), Some(2));
    assert_eq!(view.aggregation.site_id(), Some(2));
    assert_eq!(view.conversation.context, Some(2));
    assert!(view.metrics.is_some());
}

#[tokio::test]
async fn initialize_falls_back_to_first_site() {
    let h = harness(two_fields());

    assert_eq!(h.dashboard.initialize().await.unwrap(), Some(1));
    assert_eq!(h.navigator.site_param().as_deref(), Some("1"));
    assert_eq!(h.backend.get(ACTIVE_SITE_KEY).unwrap().as_deref(), Some("1"));
}

#[tokio::test]
async fn selection_survives_a_new_session() {
    let api = two_fields();
    let backend = Arc::new(MemoryKeyValueStore::new());

    let first = harness_with(api.clone(), backend.clone(), Arc::new(MemoryNavigator::new()));
    first.dashboard.initialize().await.unwrap();
    first.dashboard.select_site(2).await.unwrap();

    let second = harness_with(api, backend, Arc::new(MemoryNavigator::new()));
    assert_eq!(second.dashboard.initialize().await.unwrap(), Some(2));
}

#[tokio::test]
async fn no_sites_gives_an_empty_view() {
    let h = harness(MockSiteApi::new());

    assert_eq!(h.dashboard.initialize().await.unwrap(), None);

    let view = h.dashboard.view_model().await;
    assert!(view.sites.is_empty());
    assert!(view.active_site.is_none());
    assert_eq!(view.aggregation, AggregationState::Idle);
    assert!(view.metrics.is_none());
    assert_eq!(view.execution, ExecutionStatus::Idle);
    assert!(view.conversation.context.is_none());
}

#[tokio::test]
async fn history_failure_surfaces_in_the_view() {
    let api = MockSiteApi::new();
    let h = harness(api);
    // Sites are listed fine but the history of the fallback site fails
    h.api.set_sites(vec![field_site(1, "North parcel")]);
    h.api.set_history(1, Err(ApiError::status(500, "database locked")));

    assert_eq!(h.dashboard.initialize().await.unwrap(), Some(1));
    let view = h.dashboard.view_model().await;
    assert!(matches!(view.aggregation, AggregationState::Failed { site_id: 1, .. }));
    assert!(view.metrics.is_none());
}

#[tokio::test]
async fn switching_sites_mid_flight_shows_only_the_latest() {
    let api = two_fields();
    api.set_history(
        1,
        Ok(vec![record(101, 1, AnalysisKind::Ndvi, 0.3, "2025-05-01T10:00:00", json!({}))]),
    );
    api.set_history(
        2,
        Ok(vec![record(201, 2, AnalysisKind::Ndvi, 0.8, "2025-05-01T10:00:00", json!({}))]),
    );
    let h = harness(api.clone());

    // Initialization resolves to site 1; hold its second aggregation on a gate
    h.dashboard.initialize().await.unwrap();
    h.dashboard.select_site(2).await.unwrap();
    let gate = api.gate_history(1);

    let (first, second) = tokio::join!(h.dashboard.select_site(1), async {
        let switched = h.dashboard.select_site(2).await;
        gate.notify_one();
        switched
    });
    first.unwrap();
    second.unwrap();

    let view = h.dashboard.view_model().await;
    assert_eq!(view.active_site.map(|s| s.id), Some(2));
    let bundle = view.aggregation.bundle().unwrap();
    assert_eq!(bundle.site_id, 2);
    assert_eq!(bundle.history.iter().map(|r| r.id).collect::<Vec<_>>(), vec![201]);
    assert_eq!(view.conversation.context, Some(2));
}

#[tokio::test]
async fn view_model_series_is_chronological_percent() {
    let api = MockSiteApi::new();
    api.set_sites(vec![field_site(1, "North parcel")]);
    api.set_history(
        1,
        Ok(vec![
            record(3, 1, AnalysisKind::Ndvi, 0.6, "2025-05-03T10:00:00", json!({})),
            record(9, 1, AnalysisKind::Moisture, 0.9, "2025-05-02T12:00:00", json!({})),
            record(2, 1, AnalysisKind::Ndvi, 0.4, "2025-05-02T10:00:00", json!({})),
            record(1, 1, AnalysisKind::Ndvi, 0.2, "2025-05-01T10:00:00", json!({})),
        ]),
    );
    let h = harness(api);
    h.dashboard.initialize().await.unwrap();

    let metrics = h.dashboard.view_model().await.metrics.unwrap();
    let values: Vec<f64> = metrics.history_series.iter().map(|p| p.value).collect();
    assert_eq!(values.len(), 3);
    for (actual, expected) in values.iter().zip([20.0, 40.0, 60.0]) {
        assert!(close(*actual, expected), "{} != {}", actual, expected);
    }
}

#[tokio::test]
async fn insufficient_trend_exposes_the_sentinel_message() {
    let api = MockSiteApi::new();
    api.set_sites(vec![field_site(1, "North parcel")]);
    api.set_field_trends(
        1,
        Ok(Some(TrendReport::insufficient(
            "Insufficient data: At least 2 analyses are required for trend comparison.",
        ))),
    );
    let h = harness(api);
    h.dashboard.initialize().await.unwrap();

    let metrics = h.dashboard.view_model().await.metrics.unwrap();
    match metrics.trend {
        TrendSummary::Insufficient { message } => {
            assert_eq!(message, TrendReport::default_insufficient_message())
        }
        other => panic!("expected insufficient trend, got {:?}", other),
    }
}

#[tokio::test]
async fn composite_yield_is_used_without_a_standalone_record() {
    let api = MockSiteApi::new();
    api.set_sites(vec![field_site(1, "North parcel")]);
    api.set_history(
        1,
        Ok(vec![record(
            7,
            1,
            AnalysisKind::Complete,
            0.55,
            "2025-05-04T10:00:00",
            json!({
                "detailed_report": {
                    "yield_prediction": {"predicted_yield_per_ha": 3.8},
                    "recommendations": [
                        {"priority": "high", "category": "irrigation", "title": "Irrigate within 3 days"},
                        {"title": "missing priority"}
                    ],
                    "problems": []
                }
            }),
        )]),
    );
    api.set_yield(1, Ok(Some(yield_prediction(2.0))));
    let h = harness(api);
    h.dashboard.initialize().await.unwrap();

    let metrics = h.dashboard.view_model().await.metrics.unwrap();
    let HeadlineMetrics::Field(field) = metrics.headline else {
        panic!("expected field headline");
    };
    let yield_per_ha = field.yield_per_ha.unwrap();
    assert!(close(yield_per_ha.value, 3.8));
    assert_eq!(yield_per_ha.source, MetricSource::CompositeReport);
    assert_eq!(yield_per_ha.analysis_id, Some(7));

    assert_eq!(metrics.findings.source_analysis_id, Some(7));
    assert_eq!(metrics.findings.recommendations.len(), 1);
    assert_eq!(metrics.findings.recommendations[0].title, "Irrigate within 3 days");
}

#[tokio::test]
async fn forest_run_defaults_to_the_forest_composite() {
    let api = MockSiteApi::new();
    api.set_sites(vec![forest_site(5, "Maamora")]);
    api.push_run(Ok(record(
        50,
        5,
        AnalysisKind::Forest,
        0.62,
        "2025-06-01T09:00:00",
        json!({"forest_data": {"fire_risk_level": "high", "carbon_estimate_tonnes_ha": 41.5}}),
    )));
    let h = harness(api.clone());
    h.dashboard.initialize().await.unwrap();
    let listings = api.list_sites_calls.load(Ordering::SeqCst);

    let produced = h.dashboard.run_analysis(None).await.unwrap();

    assert_eq!(*api.run_requests.lock().unwrap(), vec![(5, AnalysisKind::Forest)]);
    assert_eq!(api.list_sites_calls.load(Ordering::SeqCst), listings + 1);

    let view = h.dashboard.view_model().await;
    assert_eq!(view.detail.map(|r| r.id), Some(produced.id));
    assert_eq!(view.execution, ExecutionStatus::Idle);
    let HeadlineMetrics::Forest(forest) = view.metrics.unwrap().headline else {
        panic!("expected forest headline");
    };
    assert_eq!(forest.fire_risk_level.map(|v| v.value).as_deref(), Some("high"));
    assert!(close(forest.carbon_stock_t_ha.unwrap().value, 41.5));
}

#[tokio::test]
async fn run_without_selection_is_rejected() {
    let h = harness(MockSiteApi::new());
    h.dashboard.initialize().await.unwrap();

    let err = h.dashboard.run_analysis(None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.api.run_count(), 0);
}

#[tokio::test]
async fn external_navigation_re_aggregates() {
    let api = two_fields();
    let h = harness(api.clone());
    h.dashboard.initialize().await.unwrap();
    let fetches = api.history_calls.load(Ordering::SeqCst);

    h.dashboard.on_navigation_changed(Some("2")).await;
    h.dashboard.on_navigation_changed(Some("2")).await;

    assert_eq!(h.dashboard.selection().active(), Some(2));
    assert_eq!(api.history_calls.load(Ordering::SeqCst), fetches + 1);
}

#[tokio::test]
async fn site_switch_moves_the_conversation() {
    let api = two_fields();
    api.set_threads(vec![
        thread(1, Some(1), "2025-05-01T08:00:00", &["Hello", "Hi"]),
        thread(2, Some(2), "2025-05-02T08:00:00", &["Rain?", "Tomorrow."]),
    ]);
    let h = harness(api);
    h.dashboard.initialize().await.unwrap();
    h.dashboard.select_thread(1).unwrap();
    assert_eq!(h.dashboard.view_model().await.conversation.transcript.len(), 2);

    h.dashboard.select_site(2).await.unwrap();

    let conversation = h.dashboard.view_model().await.conversation;
    assert_eq!(conversation.context, Some(2));
    assert!(conversation.transcript.is_empty());
    assert_eq!(conversation.threads.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn opening_an_analysis_of_the_displayed_history() {
    let api = two_fields();
    api.set_history(
        1,
        Ok(vec![
            record(101, 1, AnalysisKind::Ndvi, 0.6, "2025-05-02T10:00:00", json!({})),
            record(100, 1, AnalysisKind::Ndvi, 0.5, "2025-05-01T10:00:00", json!({})),
        ]),
    );
    let h = harness(api);
    h.dashboard.initialize().await.unwrap();

    assert_eq!(h.dashboard.open_analysis(100).unwrap().id, 100);
    assert_eq!(h.dashboard.view_model().await.detail.map(|r| r.id), Some(100));

    let err = h.dashboard.open_analysis(999).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.dashboard.view_model().await.detail.map(|r| r.id), Some(100));

    h.dashboard.select_site(2).await.unwrap();
    assert!(h.dashboard.view_model().await.detail.is_none());
    assert!(matches!(h.dashboard.open_analysis(100), Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn view_model_frames_and_labels_the_active_site() {
    let h = harness(two_fields());
    h.dashboard.initialize().await.unwrap();

    let view = h.dashboard.view_model().await;
    assert_eq!(view.map_bounds, Some((-7.6, 33.5, -7.5, 33.6)));
    let HeadlineMetrics::Field(field) = view.metrics.unwrap().headline else {
        panic!("expected field headline");
    };
    assert_eq!(field.crop_type.as_deref(), Some("wheat"));
    // Empty history falls back to the cached site summary
    assert_eq!(field.ndvi.map(|v| v.source), Some(MetricSource::SiteSummary));
    assert_eq!(field.health_label.as_deref(), Some("50%"));
}
