//! The import flow behind `import_feed`.
//!
//! Loads every source before touching the target, merges them in order, then
//! saves the target unless this is a dry run. Any error aborts before the
//! target is written.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::merge::{MergeReport, merge_collections, sanitize_collection};
use crate::models::FeedCollection;
use crate::store::{load_collection, save_collection};
use crate::summary::{Output, write_events, write_summary};

/// Load every source, failing on the first missing or malformed one.
fn load_sources(sources: &[PathBuf]) -> Result<Vec<(PathBuf, FeedCollection)>, ImportError> {
    sources
        .iter()
        .map(|path| {
            if !path.exists() {
                return Err(ImportError::MissingSource(path.clone()));
            }
            load_collection(path).map(|coll| (path.clone(), coll))
        })
        .collect()
}

/// Load the target, or start an empty collection when it does not exist yet.
fn load_target<W: Write>(
    path: &Path,
    out: &mut Output<W>,
) -> Result<FeedCollection, ImportError> {
    if !path.exists() {
        out.line(&format!(
                "Target file {} doesn't exist. Creating new feed file.",
            path.display()
        ));
        return Ok(FeedCollection::default());
    }
    load_collection(path)
}

/// Merge `sources` into the configured target and report progress to `out`.
///
/// Output is best effort: once `out` reports a broken pipe no further lines
/// are written, but the import itself still completes.
///
/// # Errors
///
/// Returns the first [`ImportError`] met while loading sources, loading the
/// target or saving it. The target file is unchanged when an error is
/// returned.
pub fn run_import<W: Write>(
    config: &ImportConfig,
    sources: &[PathBuf],
    out: W,
) -> Result<MergeReport, ImportError> {
    let mut out = Output::new(out);
    let loaded = load_sources(sources)?;
    let mut target = load_target(&config.target, &mut out)?;

    let mut report = sanitize_collection(&mut target);
    out.emit("target check", |w| write_events(w, &report));

    for (path, source) in loaded {
        info!("merging {} into {}", path.display(), config.target.display());
        let step = merge_collections(&mut target, source, config.mode());
        out.emit("progress", |w| write_events(w, &step));
        report.extend(step);
    }

    if config.dry_run {
        out.line(&format!(
            "Dry run: {} was not modified",
            config.target.display()
        ));
    } else {
        save_collection(&config.target, &target)?;
        out.line(&format!(
            "Successfully saved data to {}",
            config.target.display()
        ));
        let names: Vec<_> = sources.iter().map(|p| p.display().to_string()).collect();
        out.line(&format!(
            "Successfully imported feeds from {} to {}",
            names.join(", "),
            config.target.display()
        ));
    }

    let counts = report.counts();
    out.emit("summary", |w| write_summary(w, &counts));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeEvent;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn write(&self, name: &str, value: &Value) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, value.to_string()).expect("write fixture");
            path
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn config(&self, replace: bool) -> ImportConfig {
            ImportConfig {
                target: self.path("data/feed.json"),
                replace,
                dry_run: false,
            }
        }
    }

    #[fixture]
    fn workspace() -> Workspace {
        Workspace {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
    }

    #[rstest]
    fn creates_missing_target(workspace: Workspace) {
        let src = workspace.write("src.json", &json!({"feeds": [{"id": "a", "tracks": []}]}));
        let config = workspace.config(false);
        let mut out = Vec::new();

        let report = run_import(&config, &[src], &mut out).expect("import");

        assert_eq!(read_json(&config.target), json!({"feeds": [{"id": "a", "tracks": []}]}));
        assert_eq!(report.counts().feeds_added, 1);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("doesn't exist. Creating new feed file."));
        assert!(text.contains("Adding new feed: a"));
        assert!(text.contains("Successfully imported feeds from"));
    }

    #[rstest]
    fn merges_several_sources_in_order(workspace: Workspace) {
        let first = workspace.write(
            "one.json",
            &json!({"feeds": [{"id": "a", "tracks": [{"id": "1"}]}]}),
        );
        let second = workspace.write(
            "two.json",
            &json!({"feeds": [{"id": "a", "tracks": [{"id": "2"}, {"id": "1"}]}, {"id": "b"}]}),
        );
        let config = workspace.config(false);

        run_import(&config, &[first, second], Vec::new()).expect("import");

        assert_eq!(
            read_json(&config.target),
            json!({"feeds": [
                {"id": "a", "tracks": [{"id": "1"}, {"id": "2"}]},
                {"id": "b", "tracks": []}
            ]})
        );
    }

    #[rstest]
    fn replace_mode_overwrites_shared_feed(workspace: Workspace) {
        let config = workspace.config(true);
        fs::create_dir_all(workspace.path("data")).expect("mkdir");
        workspace.write(
            "data/feed.json",
            &json!({"feeds": [{"id": "a", "title": "old", "tracks": [{"id": "1"}]}]}),
        );
        let src = workspace.write(
            "src.json",
            &json!({"feeds": [{"id": "a", "title": "new", "tracks": [{"id": "9"}]}]}),
        );

        let report = run_import(&config, &[src], Vec::new()).expect("import");

        assert_eq!(
            read_json(&config.target),
            json!({"feeds": [{"id": "a", "title": "new", "tracks": [{"id": "9"}]}]})
        );
        assert_eq!(
            report.events,
            vec![MergeEvent::FeedReplaced {
                feed_id: "a".into()
            }]
        );
    }

    #[rstest]
    fn target_entries_without_id_are_dropped(workspace: Workspace) {
        let config = workspace.config(false);
        fs::create_dir_all(workspace.path("data")).expect("mkdir");
        workspace.write(
            "data/feed.json",
            &json!({"feeds": [{"title": "orphan"}, {"id": "a", "tracks": [{"name": "x"}]}]}),
        );
        let src = workspace.write("src.json", &json!({"feeds": []}));

        let report = run_import(&config, &[src], Vec::new()).expect("import");

        assert_eq!(
            read_json(&config.target),
            json!({"feeds": [{"id": "a", "tracks": []}]})
        );
        assert_eq!(report.counts().skipped, 2);
    }

    #[rstest]
    fn missing_source_aborts_without_writing(workspace: Workspace) {
        let config = workspace.config(false);
        let err = run_import(&config, &[workspace.path("absent.json")], Vec::new())
            .expect_err("missing source");
        assert!(matches!(err, ImportError::MissingSource(_)));
        assert!(!config.target.exists());
    }

    #[rstest]
    fn malformed_second_source_leaves_target_untouched(workspace: Workspace) {
        let config = workspace.config(false);
        fs::create_dir_all(workspace.path("data")).expect("mkdir");
        let original = "{\"feeds\": [{\"id\": \"a\"}]}";
        fs::write(&config.target, original).expect("seed target");
        let good = workspace.write("good.json", &json!({"feeds": [{"id": "b"}]}));
        let bad = workspace.write("bad.json", &json!({"items": []}));

        let err = run_import(&config, &[good, bad], Vec::new()).expect_err("bad source");

        assert!(matches!(err, ImportError::MissingFeeds(_)));
        assert_eq!(fs::read_to_string(&config.target).expect("read"), original);
    }

    #[rstest]
    fn malformed_target_aborts(workspace: Workspace) {
        let config = workspace.config(false);
        fs::create_dir_all(workspace.path("data")).expect("mkdir");
        fs::write(&config.target, "not json").expect("seed target");
        let src = workspace.write("src.json", &json!({"feeds": []}));

        let err = run_import(&config, &[src], Vec::new()).expect_err("bad target");

        assert!(matches!(err, ImportError::Syntax { .. }));
        assert_eq!(fs::read_to_string(&config.target).expect("read"), "not json");
    }

    #[rstest]
    fn dry_run_writes_nothing(workspace: Workspace) {
        let config = ImportConfig {
            dry_run: true,
            ..workspace.config(false)
        };
        let src = workspace.write("src.json", &json!({"feeds": [{"id": "a"}]}));
        let mut out = Vec::new();

        let report = run_import(&config, &[src], &mut out).expect("import");

        assert_eq!(report.counts().feeds_added, 1);
        assert!(!config.target.exists());
        assert!(!workspace.path("data").exists());
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Dry run:"));
    }

    /// Fails every write with a broken pipe and counts the attempts.
    #[derive(Default)]
    struct ClosedPipe {
        attempts: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn closed_output_stops_progress_but_still_saves(workspace: Workspace) {
        let src = workspace.write(
            "src.json",
            &json!({"feeds": [{"id": "a", "tracks": [{"id": "1"}]}, {"id": "b"}]}),
        );
        let config = workspace.config(false);
        let mut pipe = ClosedPipe::default();

        let report = run_import(&config, &[src], &mut pipe).expect("import");

        assert_eq!(pipe.attempts, 1);
        assert_eq!(report.counts().feeds_added, 2);
        assert_eq!(
            read_json(&config.target),
            json!({"feeds": [{"id": "a", "tracks": [{"id": "1"}]}, {"id": "b", "tracks": []}]})
        );
    }

    #[rstest]
    fn numeric_title_is_imported_unchanged(workspace: Workspace) {
        let src = workspace.write(
            "src.json",
            &json!({"feeds": [{"id": "a", "title": 1984, "tracks": [{"id": "1"}]}]}),
        );
        let config = workspace.config(false);

        let report = run_import(&config, &[src], Vec::new()).expect("import");

        assert_eq!(report.counts().feeds_added, 1);
        assert_eq!(
            read_json(&config.target),
            json!({"feeds": [{"id": "a", "title": 1984, "tracks": [{"id": "1"}]}]})
        );
    }
}
