//! End-to-end detection through the remote backends against a mock service.

use image::{DynamicImage, RgbImage};
use mood_detect::{build_orchestrator, run_batch, AppConfig, BatchSummary, DetectionOutput};
use mood_ml_client::EmotionClientConfig;
use mood_models::{DetectionMethod, MoodLabel};
use mood_vision::{DetectionConfig, SourceImage};
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_config(server: &MockServer, scratch: &TempDir) -> AppConfig {
    AppConfig {
        service: EmotionClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 0,
        },
        detection: DetectionConfig::default().with_scratch_dir(scratch.path()),
        ..AppConfig::default()
    }
}

fn source_image(dir: &TempDir) -> SourceImage {
    let path = dir.path().join("selfie.png");
    DynamicImage::ImageRgb8(RgbImage::new(64, 48)).save(&path).unwrap();
    SourceImage::open(&path).unwrap()
}

fn with_region(mut body: serde_json::Value) -> serde_json::Value {
    body["region"] = json!({"x": 12, "y": 8, "w": 30, "h": 30});
    body["dominant_emotion"] = json!("happy");
    body
}

fn image_paths(dir: &TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("face-{}.png", i));
            DynamicImage::ImageRgb8(RgbImage::new(32, 32)).save(&path).unwrap();
            path
        })
        .collect()
}

fn scores(happy: f64, sad: f64, neutral: f64) -> serde_json::Value {
    json!({
        "emotion": {
            "angry": 0.0, "disgust": 0.0, "fear": 0.0, "happy": happy,
            "sad": sad, "surprise": 0.0, "neutral": neutral
        }
    })
}

#[tokio::test]
async fn test_primary_detector_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_partial_json(json!({"detector_backend": "retinaface"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(with_region(scores(91.0, 2.0, 5.0))))
        .expect(1)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();

    let result = orchestrator.detect(&source_image(&images)).await.unwrap();
    assert_eq!(result.mood.label, MoodLabel::Happy);
    assert_eq!(result.method, DetectionMethod::Backend("retinaface".into()));
    assert!(result.face_detected);

    let output = DetectionOutput::new("selfie.png", result);
    assert_eq!(output.reply, MoodLabel::Happy.reply());
}

#[tokio::test]
async fn test_service_error_falls_back_to_secondary_detector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_partial_json(json!({"detector_backend": "retinaface"})))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_partial_json(json!({"detector_backend": "opencv"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([scores(0.0, 72.0, 10.0)])))
        .expect(1)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();

    let result = orchestrator.detect(&source_image(&images)).await.unwrap();
    assert_eq!(result.mood.label, MoodLabel::Sad);
    assert_eq!(result.method.as_str(), "opencv");
}

#[tokio::test]
async fn test_unreachable_service_yields_neutral_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();

    let result = orchestrator.detect(&source_image(&images)).await.unwrap();
    assert_eq!(result.mood.label, MoodLabel::Neutral);
    assert_eq!(result.mood.confidence, 0.4);
    assert_eq!(result.method, DetectionMethod::None);
    assert!(!result.face_detected);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_disabled_secondary_is_not_called() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let config = AppConfig {
        secondary_detector: None,
        ..app_config(&server, &scratch)
    };
    let orchestrator = build_orchestrator(&config).unwrap();
    assert_eq!(orchestrator.tiers().len(), 1);

    let result = orchestrator.detect(&source_image(&images)).await.unwrap();
    assert_eq!(result.method, DetectionMethod::None);
}

#[tokio::test]
async fn test_batch_reports_every_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scores(80.0, 0.0, 10.0)))
        .expect(2)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();
    let mut paths = image_paths(&images, 2);
    paths.insert(1, images.path().join("missing.png"));
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let mut outputs = Vec::new();
    let summary = run_batch(&orchestrator, &paths, true, cancel_rx, |output| {
        outputs.push(output);
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();

    assert_eq!(summary, BatchSummary { emitted: 2, failures: 1, skipped: 0 });
    assert!(!summary.interrupted());
    assert!(outputs.iter().all(|o| o.result.mood.label == MoodLabel::Happy));
    assert!(outputs.iter().all(|o| o.attempts.is_some()));
}

#[tokio::test]
async fn test_cancelled_batch_sends_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scores(80.0, 0.0, 10.0)))
        .expect(0)
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let mut emitted = 0;
    let summary = run_batch(&orchestrator, &image_paths(&images, 3), false, cancel_rx, |_| {
        emitted += 1;
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();

    assert_eq!(emitted, 0);
    assert_eq!(summary.skipped, 3);
    assert!(summary.interrupted());
}

#[tokio::test]
async fn test_interrupt_drops_in_flight_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(scores(80.0, 0.0, 10.0))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let orchestrator = build_orchestrator(&app_config(&server, &scratch)).unwrap();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = cancel_tx.send(true);
    });

    let mut outputs = Vec::new();
    let summary = run_batch(&orchestrator, &image_paths(&images, 2), false, cancel_rx, |output| {
        outputs.push(output);
        Ok::<_, Infallible>(())
    })
    .await
    .unwrap();

    assert!(outputs.is_empty());
    assert_eq!(summary.skipped, 2);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
