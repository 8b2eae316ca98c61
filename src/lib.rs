pub mod cli;
pub mod client;
pub mod collection;
pub mod config;
mod db;
pub mod embedding;
pub mod error;
mod metrics;
pub mod server;
pub mod similarity;

pub use client::{Client, ClientBuilder};
pub use collection::{Collection, Match, Metadata, SearchQuery, SearchResult};
pub use config::Opts;
pub use embedding::{EmbeddingModel, GridEmbedding};
pub use error::Error;
