//! Client for the facial-expression classification service.
//!
//! The service wraps a DeepFace-style `analyze` call: it takes an image and
//! a face `detector_backend` name and returns raw per-class emotion scores.
//! Face detection enforcement is always disabled so the service returns a
//! best-effort reading even when no face is localized.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EmotionClient, EmotionClientConfig};
pub use error::{MlError, MlResult};
pub use types::{AnalyzeRequest, AnalyzeResponse, FaceAnalysis, ServiceRegion};
