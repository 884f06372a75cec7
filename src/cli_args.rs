//! Command-line argument structures.
//!
//! Isolates clap derivations so `main.rs` stays focused on runtime logic.
//! The struct also serialises into the top configuration layer, so flags left
//! at their defaults are skipped and do not mask file or environment values.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

/// Arguments accepted by `import_feed`.
#[derive(Parser, Serialize, Default, Debug, Clone)]
#[command(
    name = "import_feed",
    about = "Import feeds from JSON files into the main feed collection",
    version
)]
pub struct ImportArgs {
    /// JSON files containing feeds to import, merged in the order given
    #[arg(required = true, value_name = "SOURCE_FILE")]
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
    /// Target feed collection (default: data/feed.json)
    #[arg(long, value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    /// Replace existing feeds instead of merging their tracks
    #[arg(long)]
    // A false CLI default must not override env or config precedence.
    #[serde(skip_serializing_if = "is_false")]
    pub replace: bool,
    /// Show what would change without writing the target
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde passes skip_serializing_if predicates by reference"
)]
fn is_false(value: &bool) -> bool {
    !*value
}
