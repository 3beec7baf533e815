use std::sync::Arc;

use anyhow::Context;

use curator_app::{AppConfig, Curator};
use curator_events::{DomainEvent, EventEnvelope, InMemoryEventBus};

/// Prepare the configured store and permission cache, then exit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    curator_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(store = config.store.name(), redis = config.redis_url.is_some(), "starting curator");

    let bus = Arc::new(InMemoryEventBus::<EventEnvelope<DomainEvent>>::new());
    let _curator = Curator::from_config(&config, bus)
        .await
        .context("failed to initialize the store")?;

    tracing::info!("store ready");
    Ok(())
}
