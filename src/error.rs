//! Error type shared by the importer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("source file {} does not exist", .0.display())]
    MissingSource(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed feed document {} at `{location}`: {source}", .path.display())]
    Shape {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} is missing the 'feeds' key", .0.display())]
    MissingFeeds(PathBuf),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise feeds: {0}")]
    Serialise(#[source] serde_json::Error),
    #[error("configuration file {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ImportError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
