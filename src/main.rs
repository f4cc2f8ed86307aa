use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use deliveryfee::api::AppState;
use deliveryfee::{
    BaseFeeTable, DeliveryFeeConfig, DeliveryFeeService, FeeEngine, FeedClient, Ingestor, store,
    telemetry, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DeliveryFeeConfig::load_from_path(config_path)?;
    telemetry::init(&config.logging)?;

    let base_fees = BaseFeeTable::standard()?;
    let store = store::open(&config.store)?;
    tracing::info!("Using {} observation store", config.store.backend);

    let feed = FeedClient::new(&config.feed)?;
    let ingestion = Ingestor::new(Arc::new(feed), store.clone())
        .spawn(config.feed.initial_delay(), config.feed.interval());

    let state = AppState {
        service: Arc::new(DeliveryFeeService::new(FeeEngine::new(base_fees), store)),
        time_zone: config.server.tz()?,
    };

    let served = web::run(&config.server, web::app(state)).await;
    ingestion.abort();
    served
}
