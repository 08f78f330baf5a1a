// Events recorded in the session journal
//
// These describe what happened to the night list and what the user did to
// it. Using a tagged enum keeps the journal greppable with jq and gives
// type-safe communication between the TUI loop and the journal task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Journal event type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")] // {"type": "snapshot_applied", ...}
pub enum AppEvent {
    /// A computed list update was applied to the displayed sequence
    SnapshotApplied {
        timestamp: DateTime<Utc>,
        generation: u64,
        rows: usize,
        inserts: usize,
        removes: usize,
        updates: usize,
        moves: usize,
    },

    /// A computed list update arrived stale and was discarded
    SnapshotDiscarded {
        timestamp: DateTime<Utc>,
        generation: u64,
    },

    /// The user activated a night row
    NightClicked {
        timestamp: DateTime<Utc>,
        night_id: i64,
    },

    /// A new night started tracking
    TrackingStarted {
        timestamp: DateTime<Utc>,
        night_id: i64,
    },

    /// The in-progress night stopped tracking
    TrackingStopped {
        timestamp: DateTime<Utc>,
        night_id: i64,
    },

    /// A night's quality rating changed
    QualityRated {
        timestamp: DateTime<Utc>,
        night_id: i64,
        quality: u8,
    },

    /// All nights were deleted
    NightsCleared { timestamp: DateTime<Utc> },
}

/// Generate a unique session ID for journal file naming
/// Format: YYYYMMDD-HHMMSS-XXXX (timestamp + 4 random hex chars)
pub fn generate_session_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    // RandomState gives a random seed without adding a dependency
    let random = RandomState::new().build_hasher().finish();
    let short_hash = format!("{:04x}", random & 0xFFFF);

    format!("{}-{}", timestamp, short_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = AppEvent::NightClicked {
            timestamp: Utc::now(),
            night_id: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"night_clicked\""));
        assert!(json.contains("\"night_id\":42"));
    }

    #[test]
    fn session_ids_carry_timestamp_and_suffix() {
        let id = generate_session_id();
        // YYYYMMDD-HHMMSS-XXXX
        assert_eq!(id.split('-').count(), 3);
        assert_eq!(id.split('-').last().unwrap().len(), 4);
    }
}
