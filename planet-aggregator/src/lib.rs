pub mod aggregator;
pub mod aggregators;
pub mod api;
pub mod archive;
pub mod dedup;
pub mod fetcher;
pub mod jsonfeed;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod priority;
pub mod traits;
pub mod types;
pub mod utils;

pub use aggregator::{AggregateOutcome, Aggregator, FetchProgress};
pub use api::{ApiConfig, Materializer};
pub use fetcher::Fetcher;
pub use jsonfeed::JsonFeed;
pub use output::OutputTree;
pub use parser::FeedParser;
pub use pipeline::{ArchiveConfig, Pipeline, PipelineOptions, PipelineReport};
pub use traits::FetchFeed;
pub use types::*;
