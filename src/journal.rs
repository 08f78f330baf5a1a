// Session journal - appends events to disk in JSON Lines format
//
// JSON Lines (JSONL) writes one JSON object per line, making it easy to:
// - Stream process large files
// - Grep/search with standard tools
// - Parse with jq or other JSON tools
//
// Each session gets its own file: sleepscope-YYYYMMDD-HHMMSS-XXXX.jsonl
// Example: jq 'select(.type=="quality_rated")' journal/sleepscope-20260824-*.jsonl

use crate::events::AppEvent;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Writes journal events for one session
pub struct Journal {
    journal_dir: PathBuf,
    session_id: String,
    event_rx: mpsc::Receiver<AppEvent>,
}

impl Journal {
    pub fn new(
        journal_dir: PathBuf,
        session_id: String,
        event_rx: mpsc::Receiver<AppEvent>,
    ) -> Result<Self> {
        fs::create_dir_all(&journal_dir).context("Failed to create journal directory")?;

        Ok(Self {
            journal_dir,
            session_id,
            event_rx,
        })
    }

    fn journal_file_path(&self) -> PathBuf {
        self.journal_dir
            .join(format!("sleepscope-{}.jsonl", self.session_id))
    }

    /// Run the journal loop, appending events as they arrive.
    ///
    /// Runs in its own task until the sending side closes the channel,
    /// which happens when the TUI shuts down.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!("Journal started: {:?}", self.journal_file_path());

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.write_event(&event) {
                tracing::error!("Failed to write journal event: {:?}", e);
                // Keep draining even if one write fails
            }
        }

        tracing::info!("Journal shutting down");
        Ok(())
    }

    fn write_event(&self, event: &AppEvent) -> Result<()> {
        let path = self.journal_file_path();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open journal file")?;

        let json = serde_json::to_string(event).context("Failed to serialize journal event")?;
        writeln!(file, "{}", json).context("Failed to write to journal file")?;

        // Flush immediately so the journal survives a crash
        file.flush().context("Failed to flush journal file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn journal_writes_one_json_object_per_line() {
        let dir = std::env::temp_dir().join(format!("sleepscope-journal-{}", std::process::id()));
        let (tx, rx) = mpsc::channel(8);
        let journal = Journal::new(dir.clone(), "test-session".to_string(), rx).unwrap();
        let path = journal.journal_file_path();

        tx.send(AppEvent::NightsCleared {
            timestamp: Utc::now(),
        })
        .await
        .unwrap();
        tx.send(AppEvent::NightClicked {
            timestamp: Utc::now(),
            night_id: 3,
        })
        .await
        .unwrap();
        drop(tx);

        journal.run().await.unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("type").is_some());
        }

        let _ = fs::remove_dir_all(&dir);
    }
}
