// Core data model - sleep nights and their display representation
//
// A SleepNight is an immutable snapshot of one tracked sleep session as
// stored in SQLite. The TUI never shows nights directly: the list adapter
// wraps them in DisplayItem, a closed sum type of "the header row" and
// "one night row". Keeping the union closed means classification is total
// by construction - there is no unknown row kind to handle at render time.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the synthetic header row.
///
/// Night ids come from SQLite AUTOINCREMENT and are always positive, so
/// `i64::MIN` can never collide with a real record key.
pub const HEADER_ID: i64 = i64::MIN;

/// Default quality threshold separating "poor" from "good" nights.
pub const DEFAULT_QUALITY_THRESHOLD: u8 = 3;

/// One tracked sleep session.
///
/// Values are read-only once loaded; edits go through storage and come
/// back as part of a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepNight {
    /// Unique key (SQLite rowid)
    pub id: i64,
    /// When tracking started
    pub start_time: DateTime<Utc>,
    /// When tracking stopped (== start_time while still in progress)
    pub end_time: DateTime<Utc>,
    /// Quality rating on a 0-5 scale (0 = unrated/terrible)
    pub quality: u8,
}

impl SleepNight {
    /// Construct from the raw epoch-millisecond columns stored in SQLite
    pub fn from_millis(id: i64, start_milli: i64, end_milli: i64, quality: u8) -> Self {
        Self {
            id,
            start_time: millis_to_utc(start_milli),
            end_time: millis_to_utc(end_milli),
            quality,
        }
    }

    /// A night is "in progress" until stop records a distinct end time
    pub fn in_progress(&self) -> bool {
        self.end_time == self.start_time
    }

    /// Tracked duration, zero while in progress
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// Short human label for the quality rating, mirroring the 0-5 scale
    pub fn quality_label(&self) -> &'static str {
        match self.quality {
            0 => "terrible",
            1 => "poor",
            2 => "so-so",
            3 => "ok",
            4 => "pretty good",
            _ => "excellent",
        }
    }

    /// One-line summary used by the detail panel and clipboard copy
    pub fn summary(&self) -> String {
        if self.in_progress() {
            format!(
                "#{} {} - in progress",
                self.id,
                self.start_time.format("%Y-%m-%d %H:%M"),
            )
        } else {
            let mins = self.duration().num_minutes();
            format!(
                "#{} {} - {}h{:02}m, quality {} ({})",
                self.id,
                self.start_time.format("%Y-%m-%d %H:%M"),
                mins / 60,
                mins % 60,
                self.quality,
                self.quality_label(),
            )
        }
    }
}

fn millis_to_utc(milli: i64) -> DateTime<Utc> {
    // timestamp_millis_opt only fails outside the representable range;
    // clamp to epoch rather than poisoning the whole snapshot
    Utc.timestamp_millis_opt(milli)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
}

/// One visual row unit in the displayed sequence.
///
/// The sequence invariant is: exactly one Header, always at index 0,
/// followed by Night rows in snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    /// The single sentinel row shown above all nights
    Header,
    /// One night wrapped for display
    Night(SleepNight),
}

impl DisplayItem {
    /// Identity key used by the diff to decide "same slot"
    pub fn id(&self) -> i64 {
        match self {
            DisplayItem::Header => HEADER_ID,
            DisplayItem::Night(night) => night.id,
        }
    }

    /// The wrapped night, if this is a night row
    pub fn night(&self) -> Option<&SleepNight> {
        match self {
            DisplayItem::Header => None,
            DisplayItem::Night(night) => Some(night),
        }
    }
}

/// Which visual template a row uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowVariant {
    /// The header sentinel
    Header,
    /// Night with quality below the threshold
    LowQuality,
    /// Night with quality at or above the threshold
    GoodQuality,
}

/// Map a display item to its row variant.
///
/// Total and deterministic: every item maps to exactly one variant, with
/// the boundary at `quality >= threshold`.
pub fn classify(item: &DisplayItem, threshold: u8) -> RowVariant {
    match item {
        DisplayItem::Header => RowVariant::Header,
        DisplayItem::Night(night) => {
            if night.quality < threshold {
                RowVariant::LowQuality
            } else {
                RowVariant::GoodQuality
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night(id: i64, quality: u8) -> SleepNight {
        SleepNight::from_millis(id, 1_700_000_000_000, 1_700_028_800_000, quality)
    }

    #[test]
    fn classify_is_total_over_the_quality_scale() {
        for quality in 0..=5u8 {
            let item = DisplayItem::Night(night(1, quality));
            let variant = classify(&item, DEFAULT_QUALITY_THRESHOLD);
            if quality < DEFAULT_QUALITY_THRESHOLD {
                assert_eq!(variant, RowVariant::LowQuality, "quality {}", quality);
            } else {
                assert_eq!(variant, RowVariant::GoodQuality, "quality {}", quality);
            }
        }
    }

    #[test]
    fn classify_boundary_sits_exactly_at_threshold() {
        assert_eq!(
            classify(&DisplayItem::Night(night(1, 2)), 3),
            RowVariant::LowQuality
        );
        assert_eq!(
            classify(&DisplayItem::Night(night(1, 3)), 3),
            RowVariant::GoodQuality
        );
    }

    #[test]
    fn header_identity_never_collides_with_night_ids() {
        assert_eq!(DisplayItem::Header.id(), HEADER_ID);
        assert_ne!(DisplayItem::Night(night(1, 4)).id(), HEADER_ID);
    }

    #[test]
    fn in_progress_night_has_zero_duration() {
        let n = SleepNight::from_millis(7, 1_700_000_000_000, 1_700_000_000_000, 0);
        assert!(n.in_progress());
        assert_eq!(n.duration().num_minutes(), 0);
        assert!(n.summary().contains("in progress"));
    }

    #[test]
    fn summary_reports_duration_and_quality() {
        let n = night(3, 4);
        let s = n.summary();
        assert!(s.contains("#3"));
        assert!(s.contains("8h00m"));
        assert!(s.contains("pretty good"));
    }
}
