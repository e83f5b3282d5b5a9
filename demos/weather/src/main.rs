use anyhow::Context;
use hermes::prelude::*;
use std::sync::Arc;
use weather_demo::{application, default_config, InMemoryMeasureService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_defaults(default_config())
        .with_optional_file("weather.toml")?
        .with_env()
        .load()
        .context("loading configuration")?;

    init_logging(&config.logging)?;

    let app = application(config, Arc::new(InMemoryMeasureService::new()))?;
    tracing::info!(addr = %app.config().http_addr(), "weather service starting");
    app.run().await?;
    Ok(())
}
