//! Periodic ingestion of weather observations
//!
//! One cycle fetches the feed, normalizes it and stores the result. Cycles
//! run with a fixed delay between them, so two never overlap.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::client::FeedSource;
use super::feed;
use crate::store::ObservationStore;

pub struct Ingestor {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn ObservationStore>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn FeedSource>, store: Arc<dyn ObservationStore>) -> Self {
        Self { source, store }
    }

    /// Run a single ingestion cycle, returning the number of stored observations
    #[instrument(name = "ingest_observations", skip(self))]
    pub async fn run_once(&self) -> Result<usize> {
        let document = self.source.fetch_document().await?;
        let observations = feed::normalize(&document).context("Observations feed is unreadable")?;

        if observations.is_empty() {
            warn!("Observations feed contained no tracked stations");
            return Ok(0);
        }

        let saved = self.store.save_all(observations).await?;
        info!("Stored {} observations", saved.len());
        Ok(saved.len())
    }

    /// Run cycles forever; failures are logged and retried on the next tick
    pub async fn run(self, initial_delay: Duration, interval: Duration) {
        tokio::time::sleep(initial_delay).await;
        loop {
            if let Err(e) = self.run_once().await {
                error!("Weather ingestion failed: {e:#}");
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Start the ingestion loop on the tokio runtime
    pub fn spawn(self, initial_delay: Duration, interval: Duration) -> JoinHandle<()> {
        info!(
            "Scheduling weather ingestion every {} minutes",
            interval.as_secs() / 60
        );
        tokio::spawn(self.run(initial_delay, interval))
    }
}
