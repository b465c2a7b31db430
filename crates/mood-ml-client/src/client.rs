//! ML service HTTP client.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::types::{AnalyzeRequest, AnalyzeResponse, FaceAnalysis, HealthResponse};

/// Configuration for the emotion service client.
#[derive(Debug, Clone)]
pub struct EmotionClientConfig {
    /// Base URL of the emotion service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for EmotionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8004".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl EmotionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("EMOTION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8004".to_string()),
            timeout: Duration::from_secs(
                std::env::var("EMOTION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("EMOTION_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the facial-expression classification service.
pub struct EmotionClient {
    http: Client,
    config: EmotionClientConfig,
}

impl EmotionClient {
    /// Create a new client.
    pub fn new(config: EmotionClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(EmotionClientConfig::from_env())
    }

    pub fn config(&self) -> &EmotionClientConfig {
        &self.config
    }

    /// Check if the service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Emotion service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Emotion service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Analyze image bytes with the given face detector backend.
    ///
    /// Returns the analysis of the first face in the response.
    pub async fn analyze_image(
        &self,
        image: &[u8],
        detector_backend: &str,
    ) -> MlResult<FaceAnalysis> {
        let request = AnalyzeRequest::emotion(BASE64.encode(image), detector_backend);
        self.analyze(&request).await
    }

    /// Send a prepared analysis request.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> MlResult<FaceAnalysis> {
        let url = format!("{}/analyze", self.config.base_url);

        debug!(
            detector_backend = %request.detector_backend,
            "Sending emotion analysis request to {}", url
        );

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            MlError::Timeout(self.config.timeout.as_secs())
                        } else {
                            MlError::Network(e)
                        }
                    })?;

                if response.status().is_server_error()
                    || response.status() == StatusCode::TOO_MANY_REQUESTS
                {
                    return Err(MlError::ServiceUnavailable(format!(
                        "emotion service returned {}",
                        response.status()
                    )));
                }

                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::RequestFailed(format!(
                "emotion service returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let parsed: AnalyzeResponse = serde_json::from_str(&body)?;

        parsed
            .into_first()
            .ok_or_else(|| MlError::InvalidResponse("no face analysis in response".to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Emotion request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Exponential backoff (500 ms, 1 s, 2 s, ...) capped at 30 s.
fn backoff_delay(attempt: u32) -> Duration {
    let millis = BACKOFF_BASE_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis).min(BACKOFF_MAX)
}
