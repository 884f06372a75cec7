//! Rendering merge progress and the closing summary.
//!
//! Writers take any [`Write`] so tests can capture output. [`Output`] wraps
//! the process's stdout and treats a closed pipe as the end of output.

use std::io::{ErrorKind, Write};

use log::error;

use crate::merge::{MergeCounts, MergeReport};

/// Write one progress line per recorded event.
///
/// # Errors
///
/// Returns an error if writing to the provided output fails.
pub fn write_events<W: Write>(mut out: W, report: &MergeReport) -> std::io::Result<()> {
    for event in &report.events {
        writeln!(out, "{event}")?;
    }
    Ok(())
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Write the per-kind counts of a run.
///
/// # Errors
///
/// Returns an error if writing to the provided output fails.
///
/// # Examples
///
/// ```
/// use feedmerge::merge::MergeCounts;
/// use feedmerge::summary::write_summary;
///
/// let counts = MergeCounts { feeds_added: 1, tracks_added: 2, ..Default::default() };
/// let mut out = Vec::new();
/// write_summary(&mut out, &counts).unwrap();
/// assert!(String::from_utf8(out).unwrap().contains("1 feed added"));
/// ```
pub fn write_summary<W: Write>(mut out: W, counts: &MergeCounts) -> std::io::Result<()> {
    writeln!(out, "Summary:")?;
    let rows = [
        (counts.feeds_added, "feed", "feeds", "added"),
        (counts.feeds_merged, "feed", "feeds", "merged"),
        (counts.feeds_replaced, "feed", "feeds", "replaced"),
        (counts.tracks_added, "track", "tracks", "added"),
        (counts.tracks_existing, "track", "tracks", "already present"),
        (counts.skipped, "entry", "entries", "skipped"),
    ];
    for (count, one, many, verb) in rows {
        if count > 0 {
            writeln!(out, "  {count} {} {verb}", plural(count, one, many))?;
        }
    }
    if rows.iter().all(|(count, ..)| *count == 0) {
        writeln!(out, "  nothing to import")?;
    }
    Ok(())
}

/// Best-effort progress sink.
///
/// Write failures are logged rather than returned. Once the reader goes away
/// (broken pipe) the sink is closed and later output is dropped without
/// further write attempts.
pub struct Output<W> {
    inner: W,
    closed: bool,
}

impl<W: Write> Output<W> {
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Whether a broken pipe has closed the sink.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run `write` against the underlying writer unless the sink is closed.
    pub fn emit<F>(&mut self, label: &str, write: F)
    where
        F: FnOnce(&mut W) -> std::io::Result<()>,
    {
        if self.closed {
            return;
        }
        match write(&mut self.inner) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => self.closed = true,
            Err(e) => error!("error printing {label}: {e}"),
        }
    }

    /// Write a single line.
    pub fn line(&mut self, line: &str) {
        self.emit("message", |w| writeln!(w, "{line}"));
    }
}
