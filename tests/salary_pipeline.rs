mod common;

use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wagecast::{ErrorCategory, Predictor, RawInput, RunnerState, WagecastError};

use common::{model_config, write_linear_model};

fn full_input(state: &str) -> RawInput {
    RawInput::new("3.6189", 46.5916, state)
        .with_flag("python_yn", 1.0)
        .with_flag("R_yn", 0.0)
        .with_flag("spark_yn", "0")
        .with_flag("aws_yn", false)
        .with_flag("excel_yn", true)
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn known_state_and_flags_drive_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(
        dir.path(),
        &cfg,
        100.0,
        &[("job_state_NY", 10.0), ("job_state_Others", 2.0), ("python_yn", 5.0)],
        "output",
    );

    let predictor = Predictor::from_config(&cfg).unwrap();
    assert_ok!(predictor.load().await);
    assert_eq!(predictor.runner().state(), RunnerState::Ready);

    let result = predictor.predict(&full_input("NY")).await.unwrap();
    assert_close(result.value, 115.0);
    assert_eq!(result.output, "output");
    assert!(!result.used_fallback);
}

#[tokio::test]
async fn unknown_state_uses_overflow_slot() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(
        dir.path(),
        &cfg,
        100.0,
        &[("job_state_NY", 10.0), ("job_state_Others", 2.0)],
        "output",
    );

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    let result = predictor.predict(&full_input("PR")).await.unwrap();
    assert_close(result.value, 102.0);
}

#[tokio::test]
async fn scaled_numerics_reach_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(
        dir.path(),
        &cfg,
        0.0,
        &[("rating_scaled", 1.0), ("age_scaled", 1.0)],
        "output",
    );

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    // Means encode to 0.
    let at_mean = predictor.predict(&full_input("CA")).await.unwrap();
    assert_close(at_mean.value, 0.0);

    // One standard deviation above the mean on each attribute.
    let mut above = full_input("CA");
    above.rating = (3.6189 + 0.8012).into();
    above.age = (46.5916 + 53.7788).into();
    let result = predictor.predict(&above).await.unwrap();
    assert_close(result.value, 2.0);
}

#[tokio::test]
async fn renamed_output_falls_back_to_first_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(dir.path(), &cfg, 88.0, &[], "variable");

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    let result = predictor.predict(&full_input("TX")).await.unwrap();
    assert_close(result.value, 88.0);
    assert_eq!(result.output, "variable");
    assert!(result.used_fallback);
}

#[tokio::test]
async fn renamed_output_without_fallback_is_backend_fault() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.allow_output_fallback = false;
    cfg.model.path = write_linear_model(dir.path(), &cfg, 88.0, &[], "variable");

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    let err = predictor.predict(&full_input("TX")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::BackendFault);
}

#[tokio::test]
async fn invalid_input_is_rejected_and_runner_stays_ready() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(dir.path(), &cfg, 1.0, &[], "output");

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    let mut bad_rating = full_input("NY");
    bad_rating.rating = "four stars".into();
    let err = predictor.predict(&bad_rating).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidInput);

    let mut missing_flag = full_input("NY");
    missing_flag.skill_flags.remove("aws_yn");
    assert_err!(predictor.predict(&missing_flag).await);

    assert_eq!(predictor.runner().state(), RunnerState::Ready);
    assert_ok!(predictor.predict(&full_input("NY")).await);
}

#[tokio::test]
async fn missing_model_fails_and_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = dir.path().join("salary_model.json").to_string_lossy().into_owned();

    let predictor = Predictor::from_config(&cfg).unwrap();
    let err = predictor.load().await.unwrap_err();
    assert!(matches!(err, WagecastError::Load(_)));
    assert_eq!(predictor.runner().state(), RunnerState::Failed);

    let err = predictor.predict(&full_input("NY")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotReady);

    write_linear_model(dir.path(), &cfg, 50.0, &[], "output");
    assert_ok!(predictor.load().await);
    assert_close(predictor.predict(&full_input("NY")).await.unwrap().value, 50.0);
}

#[tokio::test]
async fn drifted_feature_count_never_reaches_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(dir.path(), &cfg, 1.0, &[], "output");
    // A state added without retraining the model.
    cfg.features.states.push("PR".to_string());

    let predictor = Predictor::from_config(&cfg).unwrap();
    predictor.load().await.unwrap();

    let err = predictor.predict(&full_input("NY")).await.unwrap_err();
    assert!(matches!(
        err,
        WagecastError::FeatureCountMismatch {
            expected: 45,
            actual: 46
        }
    ));
    assert!(err.is_fatal());
    assert!(cfg.validate().is_err());
}

#[tokio::test]
async fn concurrent_predictions_share_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = model_config("");
    cfg.model.path = write_linear_model(
        dir.path(),
        &cfg,
        100.0,
        &[("job_state_NY", 10.0)],
        "output",
    );

    let predictor = Arc::new(Predictor::from_config(&cfg).unwrap());
    predictor.load().await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let predictor = Arc::clone(&predictor);
            let state = if i % 2 == 0 { "NY" } else { "WA" };
            tokio::spawn(async move { predictor.predict(&full_input(state)).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let value = handle.await.unwrap().unwrap().value;
        assert_close(value, if i % 2 == 0 { 110.0 } else { 100.0 });
    }
}
