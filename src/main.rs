mod config;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

use config::AppConfig;
use handlers::{presenter, AnalysisJob};
use services::{CameraSource, FileCamera, OpenRouterTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🍲 Starting UlamLens...");

    let config = Arc::new(AppConfig::from_env());
    if config.api_key.is_none() {
        log::warn!("🔑 OPENROUTER_API_KEY not set; analysis will report a configuration failure");
    }

    let picture_path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: ulamlens <picture-of-ulam>"))?;

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let transport = Arc::new(OpenRouterTransport::new(client, &config));

    // Wired once: the job delivers results back through this channel.
    let (job, mut outcomes) = AnalysisJob::new(transport, config.clone());
    log::info!("✅ Analysis job initialized");

    let mut camera = FileCamera::new(picture_path);
    let frame = camera.read_frame();
    camera.release();

    job.start(frame)?;

    println!("🔎 Analyzing your ulam... press Ctrl+C to cancel\n");

    // The interactive side: drain the one result, with Ctrl+C mapped to
    // cooperative cancellation (an in-flight attempt may still finish,
    // but its result is discarded).
    tokio::select! {
        outcome = outcomes.recv() => {
            if let Some(result) = outcome {
                println!("{}", presenter::format_analysis(&result));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            job.cancel();
            if let Some(result) = outcomes.recv().await {
                println!("{}", presenter::format_analysis(&result));
            }
        }
    }

    Ok(())
}
