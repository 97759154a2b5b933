//! Compliance Ledger - Append-only JSONL storage
//!
//! Each line is one JSON-serialized [`ComplianceEvent`]. Lines are never
//! rewritten. The in-memory variant keeps events in a `Vec` so engines built
//! for tests can still replay.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::ComplianceEvent;

enum Backend {
    File { path: PathBuf, file: File },
    Memory(Vec<ComplianceEvent>),
    /// Rejects every write
    #[cfg(test)]
    Failing,
}

/// Append-only ledger of compliance events
pub struct ComplianceLedger {
    backend: Backend,
}

impl ComplianceLedger {
    /// Open (or create) a ledger file at the given path
    pub fn open(path: impl AsRef<Path>) -> ComplianceResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            backend: Backend::File { path, file },
        })
    }

    /// Create an in-memory ledger
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Vec::new()),
        }
    }

    /// Ledger whose appends always fail
    #[cfg(test)]
    pub(crate) fn failing() -> Self {
        Self {
            backend: Backend::Failing,
        }
    }

    /// Append an event
    pub fn append(&mut self, event: &ComplianceEvent) -> ComplianceResult<()> {
        match &mut self.backend {
            Backend::File { file, .. } => {
                let json = serde_json::to_string(event)?;
                writeln!(file, "{}", json)
                    .and_then(|_| file.flush())
                    .map_err(|e| ComplianceError::LedgerWriteError(e.to_string()))
            }
            Backend::Memory(events) => {
                events.push(event.clone());
                Ok(())
            }
            #[cfg(test)]
            Backend::Failing => Err(ComplianceError::LedgerWriteError(
                "ledger unavailable".to_string(),
            )),
        }
    }

    /// Read all events in append order
    pub fn read_all(&self) -> ComplianceResult<Vec<ComplianceEvent>> {
        self.read_from(0)
    }

    /// Read events starting at a line number
    pub fn read_from(&self, start_line: usize) -> ComplianceResult<Vec<ComplianceEvent>> {
        let path = match &self.backend {
            Backend::Memory(events) => return Ok(events.iter().skip(start_line).cloned().collect()),
            Backend::File { path, .. } => path,
            #[cfg(test)]
            Backend::Failing => return Ok(Vec::new()),
        };

        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();

        for (i, line) in reader.lines().enumerate().skip(start_line) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: ComplianceEvent = serde_json::from_str(&line).map_err(|e| {
                ComplianceError::LedgerReadError(format!("line {}: {}", i + 1, e))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Number of events (lines) in the ledger
    pub fn len(&self) -> ComplianceResult<usize> {
        match &self.backend {
            Backend::Memory(events) => Ok(events.len()),
            #[cfg(test)]
            Backend::Failing => Ok(0),
            Backend::File { path, .. } => {
                let reader = BufReader::new(File::open(path)?);
                Ok(reader.lines().count())
            }
        }
    }

    pub fn is_empty(&self) -> ComplianceResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Path of the ledger file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File { path, .. } => Some(path),
            Backend::Memory(_) => None,
            #[cfg(test)]
            Backend::Failing => None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn event(n: usize) -> ComplianceEvent {
        ComplianceEvent::rule_set_loaded(format!("hash-{n}"), n)
    }

    #[test]
    fn test_in_memory_ledger_keeps_events() {
        let mut ledger = ComplianceLedger::in_memory();
        ledger.append(&event(1)).unwrap();
        ledger.append(&event(2)).unwrap();

        assert!(ledger.is_in_memory());
        assert!(ledger.path().is_none());
        assert_eq!(ledger.read_all().unwrap().len(), 2);
        assert_eq!(ledger.read_from(1).unwrap().len(), 1);
    }

    #[test]
    fn test_file_ledger_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compliance.jsonl");

        let first = event(1);
        let second = ComplianceEvent::alert_resolved("alert-1", Utc::now());

        {
            let mut ledger = ComplianceLedger::open(&path).unwrap();
            ledger.append(&first).unwrap();
            ledger.append(&second).unwrap();
        }

        let ledger = ComplianceLedger::open(&path).unwrap();
        let events = ledger.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id(), first.id());
        assert_eq!(events[1].id(), second.id());
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn test_read_from_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compliance.jsonl");

        let mut ledger = ComplianceLedger::open(&path).unwrap();
        for i in 0..5 {
            ledger.append(&event(i)).unwrap();
        }

        assert_eq!(ledger.read_from(3).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_line_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compliance.jsonl");
        std::fs::write(&path, "{\"event_type\":\"nope\"}\n").unwrap();

        let ledger = ComplianceLedger::open(&path).unwrap();
        assert!(matches!(
            ledger.read_all(),
            Err(ComplianceError::LedgerReadError(_))
        ));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("compliance.jsonl");

        let ledger = ComplianceLedger::open(&path).unwrap();
        assert!(!ledger.is_in_memory());
        assert!(path.parent().unwrap().exists());
        assert!(ledger.is_empty().unwrap());
    }
}
