use etanalyst::estimation::load_model_from_path;
use etanalyst::estimation::model::{EtaModel, ModelKind};
use etanalyst::features::{DayOfWeek, FeatureVector, TrafficLevel, TripInputs, get_traffic_level};
use etanalyst::regressor::RegressorSpec;
use etanalyst::regressor::boosting::BoostingParams;
use etanalyst::regressor::forest::ForestParams;
use etanalyst::training::{Candidate, TrainingError, TrainingOptions, run_training};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(label: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let dir = std::env::temp_dir().join(format!("etanalyst-{label}-{unique}"));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Deterministic trips whose ETA follows the traffic multiplier, with a few
/// blank numeric cells.
fn write_dataset(path: &Path, rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut csv = String::from(
        "HomeLat,HomeLon,OfficeLat,OfficeLon,DistanceKM,HourOfDay,IsWeekday,TrafficLevel,ETA_Minutes\n",
    );
    for i in 0..rows {
        let hour = ((i * 7) % 24) as u8;
        let day = DayOfWeek::ALL[i % 7];
        let level = get_traffic_level(hour, day);
        let distance = 2.0 + (i % 15) as f64;
        let factor = match level {
            TrafficLevel::Low => 1.5,
            TrafficLevel::Medium => 2.0,
            TrafficLevel::High => 3.0,
        };
        let eta = distance * factor;
        let distance_cell = if i % 23 == 5 {
            String::new()
        } else {
            distance.to_string()
        };
        let eta_cell = if i % 31 == 3 { String::new() } else { eta.to_string() };
        writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{}",
            12.90 + (i % 10) as f64 * 0.01,
            77.55 + (i % 9) as f64 * 0.01,
            12.93,
            77.61,
            distance_cell,
            hour,
            u8::from(day.is_weekday()),
            level,
            eta_cell
        )?;
    }
    fs::write(path, csv)?;
    Ok(())
}

fn quick_options() -> TrainingOptions {
    TrainingOptions {
        candidates: vec![
            Candidate::new(
                "Random Forest",
                RegressorSpec::RandomForest(ForestParams {
                    n_trees: 15,
                    max_depth: Some(6),
                    ..ForestParams::default()
                }),
            ),
            Candidate::new(
                "Gradient Boosting",
                RegressorSpec::GradientBoosting(BoostingParams {
                    iterations: 40,
                    learning_rate: 0.1,
                    max_depth: 4,
                    min_leaf_size: 1,
                }),
            ),
        ],
        ..TrainingOptions::default()
    }
}

#[test]
fn trained_artifact_serves_predictions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_dir("training")?;
    let data = dir.join("trips.csv");
    let output = dir.join("models").join("best.json");
    write_dataset(&data, 200)?;

    let outcome = run_training(&data, &output, &quick_options())?;
    let model = load_model_from_path(&output)?;
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(outcome.scores.len(), 2);
    assert_eq!(
        serde_json::to_value(model.artifact())?,
        serde_json::to_value(&outcome.artifact)?
    );
    assert_eq!(model.kind(), ModelKind::Persisted);

    let features = FeatureVector::from_inputs(&TripInputs {
        home_lat: 12.95,
        home_lon: 77.58,
        office_lat: 12.93,
        office_lon: 77.61,
        distance_km: 10.0,
        hour_of_day: 9,
        is_weekday: true,
        traffic_level: TrafficLevel::High,
    })?;
    let minutes = model.predict(&features)?;
    assert!(minutes.is_finite() && minutes > 0.0, "got {minutes}");
    Ok(())
}

#[test]
fn same_seed_selects_same_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_dir("determinism")?;
    let data = dir.join("trips.csv");
    write_dataset(&data, 120)?;

    let first = run_training(&data, &dir.join("a.json"), &quick_options())?;
    let second = run_training(&data, &dir.join("b.json"), &quick_options())?;
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(first.scores, second.scores);
    assert_eq!(first.artifact.model_name, second.artifact.model_name);
    assert_eq!(
        serde_json::to_value(&first.artifact.regressor)?,
        serde_json::to_value(&second.artifact.regressor)?
    );
    Ok(())
}

#[test]
fn missing_dataset_is_a_dataset_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_dir("missing")?;

    let result = run_training(&dir.join("absent.csv"), &dir.join("out.json"), &quick_options());
    let _ = fs::remove_dir_all(&dir);

    assert!(matches!(result, Err(TrainingError::Dataset(_))));
    Ok(())
}
