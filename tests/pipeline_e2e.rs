//! End-to-end pipeline scenarios against artifact files on disk, exercising
//! the same construction path the server binary uses.

use std::path::Path;
use std::sync::Arc;

use wifi_locate::{AppConfig, Direction, LocatePipeline, PositionRegister};

/// The example reading used throughout: eight APs, one strength each, in
/// vocabulary order AP1..AP8.
const READING: [i32; 8] = [-69, -73, -60, -90, -70, -80, -58, -92];

fn write_artifacts(dir: &Path) {
    let runtime = serde_json::json!({
        "ap_names": ["AP1", "AP2", "AP3", "AP4", "AP5", "AP6", "AP7", "AP8"],
        "sentinel_dbm": -100,
        "grid": { "rows": 9, "cols": 9, "min_col": 11 },
        "top_k": 3,
        "history_capacity": 20
    });
    // The scaler centers the example reading at the origin of normalized
    // space, where the A11 centroid sits. The other centroids are offset by
    // increasing amounts so the ranking is unambiguous.
    let scaler = serde_json::json!({
        "mean": READING.map(f64::from),
        "scale": [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]
    });
    let model = serde_json::json!({
        "labels": ["A11", "B12", "C13", "D14"],
        "centroids": [
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            [2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
            [3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0]
        ],
        "bandwidth": 4.0
    });

    for (name, value) in [
        ("runtime.json", &runtime),
        ("scaler.json", &scaler),
        ("model.json", &model),
    ] {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }
}

fn build(dir: &Path) -> (Arc<LocatePipeline>, Arc<PositionRegister>) {
    let config = Arc::new(AppConfig::load(dir).unwrap());
    let register = Arc::new(PositionRegister::new(
        config.estimator(),
        config.runtime.history_capacity,
    ));
    let pipeline = Arc::new(LocatePipeline::new(
        config.normalizer(),
        config.classifier(),
        config.model.labels.clone(),
        config.runtime.top_k,
        config.runtime.tie_epsilon,
        register.clone(),
    ));
    (pipeline, register)
}

#[test]
fn test_reading_yields_ordered_top3_from_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let (pipeline, register) = build(dir.path());

    let ranked = pipeline.process(&READING).unwrap();
    let entries = ranked.entries();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].label, "A11");
    for pair in entries.windows(2) {
        assert!(
            pair[0].probability >= pair[1].probability,
            "ranking must be non-increasing"
        );
    }

    let vocabulary = ["A11", "B12", "C13", "D14"];
    let total: f64 = entries.iter().map(|e| e.probability).sum();
    assert!(total <= 1.0 + 1e-9, "top-3 mass {total} exceeds 1.0");
    for entry in entries {
        assert!(vocabulary.contains(&entry.label.as_str()));
        assert!(entry.probability > 0.0 && entry.probability <= 1.0);
    }

    assert_eq!(register.version(), 1);
    assert_eq!(register.history_snapshot().len(), 1);
}

#[test]
fn test_smoothed_position_feeds_route_planning() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let (pipeline, register) = build(dir.path());

    // Several consistent readings settle the filter on A11.
    for _ in 0..5 {
        pipeline.process(&READING).unwrap();
    }

    let config = AppConfig::load(dir.path()).unwrap();
    let current = register.smoothed_cell().expect("filter has an estimate");
    let destination = config.runtime.grid.decode("C13").unwrap();

    let route = wifi_locate::plan(current, destination, &config.runtime.grid).unwrap();
    assert_eq!(
        route,
        vec![
            Direction::Down,
            Direction::Down,
            Direction::Right,
            Direction::Right
        ]
    );
}

#[test]
fn test_wrong_length_reading_is_rejected_without_publishing() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let (pipeline, register) = build(dir.path());

    assert!(pipeline.process(&[-60, -70]).is_err());
    assert_eq!(register.version(), 0);
    assert!(register.smoothed_cell().is_none());
}

#[tokio::test]
async fn test_observer_sees_each_accepted_reading() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let (pipeline, register) = build(dir.path());

    let mut rx = register.subscribe();

    pipeline.process(&READING).unwrap();
    rx.changed().await.unwrap();
    {
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.estimates.top().unwrap().label, "A11");
    }

    pipeline.process(&READING).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().version, 2);
}
