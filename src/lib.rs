//! Merge JSON feed documents into a feed collection.
//!
//! The library backs the `import_feed` binary and exposes the merge logic,
//! storage helpers and configuration loading for integration tests.

pub mod cli_args;
pub mod commands;
pub mod config;
pub mod error;
pub mod merge;
pub mod models;
pub mod store;
pub mod summary;

pub use cli_args::ImportArgs;
pub use commands::run_import;
pub use config::{ImportConfig, load_config};
pub use error::ImportError;
pub use merge::{MergeEvent, MergeMode, MergeReport, merge_collections};
pub use models::{Feed, FeedCollection, Track};
