//! JSONL sink for dispatch events.
//!
//! One line per [`DispatchEvent`]: the event's payload object plus `type`,
//! a per-file `seq` number and an RFC 3339 UTC `timestamp`. Lines are
//! appended, so several turns can share one file.

use relay_application::ports::dispatch_logger::{DispatchEvent, DispatchLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

struct Sink {
    writer: BufWriter<File>,
    seq: u64,
}

/// Appends dispatch events to a JSONL file.
pub struct JsonlDispatchLogger {
    sink: Mutex<Sink>,
    path: PathBuf,
}

impl JsonlDispatchLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            sink: Mutex::new(Sink {
                writer: BufWriter::new(file),
                seq: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far
    pub fn events_written(&self) -> u64 {
        self.sink.lock().map(|s| s.seq).unwrap_or(0)
    }
}

fn to_record(event: DispatchEvent, seq: u64) -> Value {
    let mut record = match event.payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    record.insert("type".to_string(), Value::from(event.event_type));
    record.insert("seq".to_string(), Value::from(seq));
    record.insert(
        "timestamp".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
    );
    Value::Object(record)
}

impl DispatchLogger for JsonlDispatchLogger {
    fn log(&self, event: DispatchEvent) {
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        let record = to_record(event, sink.seq + 1);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        // A flush per line keeps the file readable while a turn is running.
        match writeln!(sink.writer, "{}", line).and_then(|_| sink.writer.flush()) {
            Ok(()) => sink.seq += 1,
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to write dispatch event"),
        }
    }
}

impl Drop for JsonlDispatchLogger {
    fn drop(&mut self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.writer.flush();
        }
    }
}
