use std::path::Path;

use mood_detect::{build_orchestrator, AppConfig};
use mood_ml_client::EmotionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    println!(
        "mood-selfcheck: starting with service={} primary={} secondary={}",
        config.service.base_url,
        config.primary_detector,
        config.secondary_detector.as_deref().unwrap_or("-")
    );

    ensure_scratch_dir(&config.detection.scratch_dir()).await?;
    ensure_service(&config).await?;
    ensure_pipeline(&config)?;

    println!("mood-selfcheck: ok");
    Ok(())
}

async fn ensure_scratch_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    tempfile::Builder::new()
        .prefix("mood-selfcheck-")
        .tempfile_in(path)
        .map_err(|e| anyhow::anyhow!("scratch dir {} not writable: {}", path.display(), e))?;
    Ok(())
}

async fn ensure_service(config: &AppConfig) -> anyhow::Result<()> {
    let client = EmotionClient::new(config.service.clone())?;
    if !client.health_check().await? {
        return Err(anyhow::anyhow!(
            "emotion service at {} is not healthy",
            config.service.base_url
        ));
    }
    Ok(())
}

/// Detector names and the optional cascade must all load.
fn ensure_pipeline(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)
        .map_err(|e| anyhow::anyhow!("detection pipeline unusable: {}", e))?;
    println!("mood-selfcheck: tiers {:?}", orchestrator.tiers());
    Ok(())
}
