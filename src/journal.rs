//! Append-only event trail for received snapshots.
//!
//! One multi-line block plus one condensed summary line per snapshot,
//! flushed after every append so the trail survives an abrupt exit. The
//! journal is owned by the subscriber loop, which processes one message at
//! a time; that single ownership is what keeps blocks from interleaving.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::SystemTelemetry;
use crate::format;

pub struct EventJournal {
    file: File,
    path: PathBuf,
}

impl EventJournal {
    /// Open (creating if needed) the journal in append mode. Failing here
    /// is a startup error the caller treats as fatal.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        debug!("event journal open at {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the event block and the summary line for one snapshot.
    pub async fn append(&mut self, telemetry: &SystemTelemetry) -> std::io::Result<()> {
        let block = format::event_block(telemetry);
        let summary = format::summary_line(telemetry);

        self.file.write_all(block.as_bytes()).await?;
        self.file.write_all(summary.as_bytes()).await?;
        self.file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HardwareGauges, NetworkOverview, SystemIdentity};

    fn minimal_telemetry(hostname: &str) -> SystemTelemetry {
        SystemTelemetry {
            timestamp: 1_700_000_000,
            system: SystemIdentity {
                hostname: hostname.to_string(),
                ..SystemIdentity::default()
            },
            hardware: HardwareGauges::default(),
            network: NetworkOverview::default(),
            processes: Vec::new(),
            critical_files: Vec::new(),
        }
    }

    #[tokio::test]
    async fn append_writes_block_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut journal = EventJournal::open(&path).await.unwrap();
        journal.append(&minimal_telemetry("host-a")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("--- snapshot from host-a"));
        assert!(contents.contains("cpu=0.0%"));
    }

    #[tokio::test]
    async fn appends_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut journal = EventJournal::open(&path).await.unwrap();
        journal.append(&minimal_telemetry("first")).await.unwrap();
        journal.append(&minimal_telemetry("second")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let first = contents.find("first").unwrap();
        let second = contents.find("second").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn open_fails_for_unwritable_path() {
        assert!(
            EventJournal::open(Path::new("/nonexistent-dir/events.log"))
                .await
                .is_err()
        );
    }
}
