//! Reading and writing feed collections on disk.
//!
//! Documents are read wholesale and rewritten wholesale. Saving goes through
//! a temporary file in the target directory that is renamed into place, so a
//! failed save leaves the previous file intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::ImportError;
use crate::models::{Feed, FeedCollection};

/// Top-level shape before the `feeds` key is checked.
#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    feeds: Option<Vec<Feed>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Parse a feed document held in memory.
///
/// `path` is only used to label errors.
///
/// # Errors
///
/// Returns [`ImportError::Syntax`] for invalid JSON, [`ImportError::Shape`]
/// when the JSON does not describe feeds (with the offending path), and
/// [`ImportError::MissingFeeds`] when the `feeds` key is absent or `null`.
pub fn parse_collection(text: &str, path: &Path) -> Result<FeedCollection, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ImportError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawCollection = serde_path_to_error::deserialize(value).map_err(|e| {
        let location = e.path().to_string();
        ImportError::Shape {
            path: path.to_path_buf(),
            location,
            source: e.into_inner(),
        }
    })?;
    let feeds = raw
        .feeds
        .ok_or_else(|| ImportError::MissingFeeds(path.to_path_buf()))?;
    Ok(FeedCollection {
        feeds,
        extra: raw.extra,
    })
}

/// Load a feed document from `path`.
///
/// # Errors
///
/// Returns [`ImportError::Read`] when the file cannot be read, otherwise the
/// errors of [`parse_collection`].
pub fn load_collection(path: &Path) -> Result<FeedCollection, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", text.len(), path.display());
    parse_collection(&text, path)
}

/// Render a collection as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`ImportError::Serialise`] if serialisation fails.
pub fn render_collection(collection: &FeedCollection) -> Result<String, ImportError> {
    let mut text = serde_json::to_string_pretty(collection).map_err(ImportError::Serialise)?;
    text.push('\n');
    Ok(text)
}

/// Resolve the file a save should replace, following a symlinked target.
fn save_destination(path: &Path) -> std::io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}

/// Create the temporary file a save is staged in.
///
/// A replaced file keeps its permissions. A new file gets the mode a plain
/// create would give it rather than the private mode of a temporary file.
fn staging_file(dir: &Path, dest: &Path) -> std::io::Result<NamedTempFile> {
    let existing = fs::metadata(dest).ok().map(|meta| meta.permissions());
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if existing.is_none() {
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
    }
    let tmp = builder.tempfile_in(dir)?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms)?;
    }
    Ok(tmp)
}

/// Write `collection` to `path`, creating parent directories as needed.
///
/// When `path` is a symlink the file it points at is replaced and the link
/// is left in place.
///
/// # Errors
///
/// Returns [`ImportError::Write`] if the directory, temporary file or rename
/// fails, or [`ImportError::Serialise`] if rendering fails. The file at
/// `path` is untouched in either case.
pub fn save_collection(path: &Path, collection: &FeedCollection) -> Result<(), ImportError> {
    let text = render_collection(collection)?;
    let write_err = |source| ImportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dest = save_destination(path).map_err(write_err)?;
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = staging_file(dir, &dest).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&dest).map_err(|e| write_err(e.error))?;
    debug!("wrote {} feeds to {}", collection.feeds.len(), dest.display());
    Ok(())
}
