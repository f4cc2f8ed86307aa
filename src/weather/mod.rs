//! Weather observation ingestion
//!
//! - `feed`: normalization of the XML observations document
//! - `client`: HTTP retrieval of the document
//! - `ingest`: scheduled fetch, normalize and store cycle

pub mod client;
pub mod feed;
pub mod ingest;

pub use client::{FeedClient, FeedSource};
pub use feed::normalize;
pub use ingest::Ingestor;
