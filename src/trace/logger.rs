use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::trace::trace::RunEvent;

/// Append-only JSONL journal of processing runs.
///
/// A journal that cannot be opened is disabled; logging to it is then a no-op.
pub struct RunJournal {
    sink: Option<JournalSink>,
}

struct JournalSink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
    written: AtomicUsize,
}

impl JournalSink {
    fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LineWriter::new(file)),
            written: AtomicUsize::new(0),
        })
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("journal lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl RunJournal {
    pub fn open(path: &Path) -> Self {
        match JournalSink::create(path) {
            Ok(sink) => {
                debug!(path = %path.display(), "run journal opened");
                Self { sink: Some(sink) }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open run journal");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    /// Events appended since the journal was opened.
    pub fn events_written(&self) -> usize {
        self.sink
            .as_ref()
            .map_or(0, |s| s.written.load(Ordering::Relaxed))
    }

    pub fn log(&self, event: &RunEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let result = serde_json::to_string(event)
            .map_err(io::Error::from)
            .and_then(|line| sink.append(&line));
        if let Err(e) = result {
            warn!(path = %sink.path.display(), stage = ?event.stage, error = %e, "journal event dropped");
        }
    }
}
