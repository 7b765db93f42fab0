use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use capability_forecast::app::pipeline::{run_batch, write_outputs};
use capability_forecast::domain::{ForecasterConfig, Observation, RunConfig, ThresholdPrediction};
use capability_forecast::error::ForecastError;
use capability_forecast::forecast::{CapabilityForecaster, CapabilityState};
use capability_forecast::io::read_results_json;
use capability_forecast::models::predict;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn series(points: &[(&str, f64)]) -> Vec<Observation> {
    points.iter().map(|&(d, s)| Observation::new(date(d), s)).collect()
}

fn code_generation() -> Vec<Observation> {
    series(&[
        ("2022-01-01", 45.0),
        ("2022-06-01", 52.0),
        ("2023-01-01", 61.0),
        ("2023-06-01", 68.0),
        ("2024-01-01", 75.0),
        ("2024-06-01", 82.0),
    ])
}

fn forecaster() -> CapabilityForecaster {
    CapabilityForecaster::new(ForecasterConfig {
        as_of: date("2024-06-01"),
        ..ForecasterConfig::default()
    })
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("capfc-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn six_point_series_forecasts_all_key_thresholds() {
    let mut f = forecaster();
    let summary = f.fit("code_generation", &code_generation(), 100.0).unwrap();
    assert!(summary.r_squared > 0.9, "R² = {}", summary.r_squared);
    assert!(summary.params.growth_rate > 0.0);
    assert_eq!(summary.params.ceiling, 100.0);
    assert_eq!(summary.std_errors.ceiling, 0.0);
    assert_eq!(summary.n_observations, 6);

    let pred = f.predict_threshold("code_generation", 90.0, 0.95).unwrap();
    let forecast = pred.as_forecast().expect("90 is not yet observed");
    assert!(forecast.predicted_date > date("2024-06-01"));
    assert!(forecast.confidence_interval.lower < forecast.confidence_interval.upper);
    assert!(forecast.confidence_interval.lower <= forecast.predicted_date);
    assert!(forecast.predicted_date <= forecast.confidence_interval.upper);

    let nodes = f.export_nodes("code_generation", &[85.0, 90.0, 95.0]).unwrap();
    let thresholds: Vec<f64> = nodes.iter().map(|n| n.threshold).collect();
    assert_eq!(thresholds, vec![85.0, 90.0, 95.0]);
    assert!(nodes.iter().all(|n| n.days_until > 0));
    assert!(nodes.windows(2).all(|w| w[0].predicted_date <= w[1].predicted_date));
}

#[test]
fn fitted_curve_is_non_decreasing_and_reproduces_r_squared() {
    let mut f = forecaster();
    f.fit("code_generation", &code_generation(), 100.0).unwrap();
    let model = f.fitted("code_generation").unwrap();

    let curve = f.forecast_curve("code_generation", 730).unwrap();
    assert_eq!(curve.historical_cutoff_index, 6);
    assert!(curve.predictions.windows(2).all(|w| w[1] >= w[0] - 1e-12));
    assert_eq!(curve, f.forecast_curve("code_generation", 730).unwrap());

    let fitted: Vec<f64> = model.elapsed.iter().map(|&t| predict(t, &model.params)).collect();
    let mean = model.scores.iter().sum::<f64>() / model.scores.len() as f64;
    let ss_res: f64 = model.scores.iter().zip(&fitted).map(|(y, p)| (y - p).powi(2)).sum();
    let ss_tot: f64 = model.scores.iter().map(|y| (y - mean).powi(2)).sum();
    assert!(((1.0 - ss_res / ss_tot) - model.r_squared).abs() < 1e-9);
}

#[test]
fn observed_threshold_is_already_achieved() {
    let mut f = forecaster();
    let obs = series(&[
        ("2022-01-01", 45.0),
        ("2022-06-01", 52.0),
        ("2023-01-01", 61.0),
        ("2023-06-01", 68.0),
    ]);
    f.fit("code_generation", &obs, 100.0).unwrap();

    match f.predict_threshold("code_generation", 50.0, 0.95).unwrap() {
        ThresholdPrediction::AlreadyAchieved(a) => assert_eq!(a.date_achieved, date("2022-06-01")),
        other => panic!("expected already achieved, got {other:?}"),
    }
    assert!(f.export_nodes("code_generation", &[50.0]).unwrap().is_empty());
}

#[test]
fn threshold_above_ceiling_is_rejected() {
    let mut f = forecaster();
    f.fit("code_generation", &code_generation(), 100.0).unwrap();
    assert!(matches!(
        f.predict_threshold("code_generation", 101.0, 0.95),
        Err(ForecastError::ThresholdExceedsCeiling { .. })
    ));
}

#[test]
fn two_point_series_fails_deterministically() {
    let obs = series(&[("2023-01-01", 30.0), ("2024-01-01", 60.0)]);
    let mut a = forecaster();
    let mut b = forecaster();
    let ra = a.fit("pair", &obs, 100.0);
    let rb = b.fit("pair", &obs, 100.0);
    assert_eq!(ra, rb);
    match ra {
        Ok(summary) => {
            assert!(summary.params.growth_rate.is_finite());
            assert!(summary.params.midpoint.is_finite());
        }
        Err(err) => assert!(matches!(a.state("pair"), CapabilityState::FitFailed(e) if e == err)),
    }
}

#[test]
fn batch_run_from_csv_continues_past_failures() {
    let dir = scratch_dir("batch");
    let csv = dir.join("scores.csv");
    fs::write(
        &csv,
        "date,benchmark,score,capability\n\
         2022-01-01,HumanEval,45,code_generation\n\
         2022-06-01,HumanEval,50,code_generation\n\
         2022-06-01,HumanEval,52,code_generation\n\
         2023-01-01,HumanEval,61,code_generation\n\
         2023-06-01,HumanEval,68,code_generation\n\
         2024-01-01,HumanEval,75,code_generation\n\
         2024-06-01,HumanEval,82,code_generation\n\
         2024-01-01,MMMU,40,vision\n\
         2024-02-01,MMMU,41,vision\n\
         not-a-date,MMMU,41,vision\n\
         2023-01-01,GSM8K,20,math\n\
         2023-01-01,GSM8K,20,math\n\
         2023-06-01,GSM8K,20,math\n\
         2024-01-01,GSM8K,20,math\n\
         2024-06-01,GSM8K,20,math\n",
    )
    .unwrap();

    let config = RunConfig {
        data_path: csv.clone(),
        output_dir: Some(dir.join("out")),
        thresholds: vec![85.0, 90.0, 95.0],
        min_points: 4,
        days_ahead: 365,
        key_threshold: 90.0,
        forecaster: ForecasterConfig {
            as_of: date("2024-06-01"),
            mc_samples: 2000,
            ..ForecasterConfig::default()
        },
    };

    let output = run_batch(&config).unwrap();
    assert_eq!(output.rows_read, 15);
    assert_eq!(output.row_errors.len(), 1);
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].capability, "vision");

    let code = &output.reports["code_generation"];
    assert!(code.success);
    assert_eq!(code.fit_quality.as_ref().unwrap().n_observations, 6);
    assert_eq!(code.forecast_nodes.len(), 3);
    assert!(output.reports.contains_key("math"));

    let written = write_outputs(&output, config.output_dir.as_ref().unwrap()).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|p| p.exists()));

    let results = read_results_json(&written[0]).unwrap();
    assert_eq!(results.metadata.model, "logistic_growth");
    assert_eq!(
        results.capabilities.keys().collect::<Vec<_>>(),
        output.reports.keys().collect::<Vec<_>>()
    );
    assert!(results.capabilities["code_generation"].success);
    assert_eq!(results.capabilities["code_generation"].forecast_nodes.len(), 3);

    let summary = fs::read_to_string(&written[2]).unwrap();
    assert!(summary.starts_with("capability,threshold,predicted_date"));
    assert_eq!(summary.lines().filter(|l| l.starts_with("code_generation,")).count(), 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn batch_with_only_short_series_is_a_data_error() {
    let dir = scratch_dir("short");
    let csv = dir.join("scores.csv");
    fs::write(&csv, "date,score,capability\n2024-01-01,10,x\n2024-02-01,12,x\n").unwrap();

    let config = RunConfig {
        data_path: csv,
        output_dir: None,
        thresholds: vec![90.0],
        min_points: 4,
        days_ahead: 365,
        key_threshold: 90.0,
        forecaster: ForecasterConfig::default(),
    };
    assert_eq!(run_batch(&config).unwrap_err().exit_code(), 3);

    let mut missing = config.clone();
    missing.data_path = dir.join("missing.csv");
    assert_eq!(run_batch(&missing).unwrap_err().exit_code(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sessions_fit_many_capabilities_in_parallel() {
    let mut all = BTreeMap::new();
    all.insert("code_generation".to_string(), code_generation());
    all.insert(
        "reasoning".to_string(),
        series(&[
            ("2022-01-01", 20.0),
            ("2022-07-01", 26.0),
            ("2023-01-01", 33.0),
            ("2023-07-01", 41.0),
            ("2024-01-01", 50.0),
        ]),
    );

    let mut f = forecaster();
    let results = f.fit_many(&all);
    assert!(results.values().all(Result::is_ok));
    assert_eq!(f.fitted_capabilities(), vec!["code_generation", "reasoning"]);
}
