// crates/gatework-store/src/audit.rs
// ============================================================================
// Module: JSONL Audit Log
// Description: Append-only, line-delimited JSON implementation of the
//              Audit Log trait seam.
// Purpose: Write one JSON object per audit event to `logs/<run_id>.jsonl`,
//          UTF-8, no trailing commas, flushed before a run summary returns.
// Dependencies: gatework-core, serde_json, std::fs
// ============================================================================

//! ## Overview
//! One [`JsonlAuditLog`] is bound to a single run at construction, since
//! the run id that names the log file is fixed for the lifetime of a run.
//! [`JsonlAuditLog::append`] is safe to call from multiple worker threads:
//! each call takes the file lock, writes one complete line, and releases
//! it, so interleaved events from concurrent steps are never split.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use gatework_core::audit::AuditEvent;
use gatework_core::audit::AuditSink;
use gatework_core::error::AuditError;
use gatework_core::identifiers::RunId;

/// A filesystem-backed [`AuditSink`] writing to `<root>/logs/<run_id>.jsonl`.
pub struct JsonlAuditLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl JsonlAuditLog {
    /// Opens (creating if necessary) the append-only log file for
    /// `run_id` under `root`.
    ///
    /// # Errors
    /// Returns [`AuditError::Append`] if the log directory or file cannot
    /// be created.
    pub fn new(root: impl AsRef<Path>, run_id: &RunId) -> Result<Self, AuditError> {
        let dir = root.as_ref().join("logs");
        fs::create_dir_all(&dir).map_err(|err| AuditError::Append(err.to_string()))?;
        let path = dir.join(format!("{run_id}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| AuditError::Append(err.to_string()))?;
        Ok(Self { file: Mutex::new(file), path })
    }

    /// The path this sink writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(event).map_err(|err| AuditError::Append(err.to_string()))?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes()).map_err(|err| AuditError::Append(err.to_string()))
    }

    fn flush(&self) -> Result<(), AuditError> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.flush().map_err(|err| AuditError::Flush(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::fs;

    use super::JsonlAuditLog;
    use gatework_core::audit::AuditEvent;
    use gatework_core::audit::AuditEventKind;
    use gatework_core::audit::AuditSink;
    use gatework_core::identifiers::RunId;

    #[test]
    fn appended_events_are_newline_delimited_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let run_id = RunId::generate();
        let log = JsonlAuditLog::new(dir.path(), &run_id).expect("opens");

        log.append(&AuditEvent {
            ts: "2026-07-27T00:00:00Z".to_owned(),
            run_id: run_id.clone(),
            kind: AuditEventKind::RunStarted { workflow_name: "demo".to_owned() },
        })
        .expect("appends");
        log.append(&AuditEvent {
            ts: "2026-07-27T00:00:01Z".to_owned(),
            run_id: run_id.clone(),
            kind: AuditEventKind::RunEnded { status: "succeeded".to_owned(), tokens_used_total: 0 },
        })
        .expect("appends");
        log.flush().expect("flushes");

        let contents = fs::read_to_string(log.path()).expect("reads log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event\":\"run_started\""));
        assert!(lines[1].contains("\"event\":\"run_ended\""));
    }
}
