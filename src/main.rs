use std::error::Error;

use ai_llm_service::telemetry;
use tracing::{Level, warn};
use tracing_subscriber::{Layer, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal outside local development.
    let dotenv = dotenvy::dotenv();

    let general = fmt::layer()
        .with_target(true)
        .with_filter(filter_fn(|meta| !telemetry::is_library_target(meta.target())));

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(general)
        .with(telemetry::layer())
        .init();

    if let Err(e) = dotenv {
        warn!(error = %e, "no .env loaded, using process environment");
    }

    api::start().await?;

    Ok(())
}
