// Demo mode: seed and mutate synthetic nights to showcase the TUI
//
// The demo writes through the same NightStore the key bindings use, so
// the visible list only ever updates via the watcher -> submit -> diff
// path. Watching it run exercises every edit-script shape:
// - seeding inserts a week of history (Inserts)
// - periodic re-rating changes attributes in place (Updates)
// - a fresh night appears at the top every cycle (Insert after header)
// - old nights fall off the end (Removes)
//
// Run with: sleepscope --demo

use crate::storage::NightStore;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Nights kept alive before the oldest is deleted
const DEMO_MAX_NIGHTS: usize = 10;

/// Pause between demo mutations
const DEMO_STEP: Duration = Duration::from_millis(2500);

/// Quality sequence the demo cycles through; deliberately straddles the
/// default threshold so both row variants stay on screen
const DEMO_QUALITIES: [u8; 7] = [2, 4, 1, 5, 3, 0, 4];

/// Seed a week of plausible history if the database is empty
fn seed_history(store: &NightStore) -> anyhow::Result<()> {
    if !store.snapshot()?.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    for (i, &quality) in DEMO_QUALITIES.iter().enumerate() {
        // Previous evening, 10pm-ish
        let bedtime =
            now - ChronoDuration::days(DEMO_QUALITIES.len() as i64 - i as i64) - ChronoDuration::hours(2);
        let wake = bedtime + ChronoDuration::hours(6 + (i as i64 % 3));
        store.insert_night(bedtime, wake, quality)?;
    }
    Ok(())
}

/// Run the demo mutation loop until shutdown is signalled
pub async fn run_demo(store: NightStore, mut shutdown_rx: oneshot::Receiver<()>) {
    if let Err(e) = seed_history(&store) {
        tracing::error!("Demo seeding failed: {:?}", e);
        return;
    }
    tracing::info!("Demo mode active: synthetic nights will keep changing");

    // Let the first snapshot land before mutating
    sleep(Duration::from_millis(1500)).await;

    let mut step: usize = 0;
    loop {
        if shutdown_rx.try_recv().is_ok() {
            return;
        }

        if let Err(e) = demo_step(&store, step) {
            tracing::error!("Demo step failed: {:?}", e);
        }
        step = step.wrapping_add(1);

        sleep(DEMO_STEP).await;
    }
}

/// One mutation: alternate between re-rating an existing night, adding a
/// finished night, and trimming the oldest when the list grows too long
fn demo_step(store: &NightStore, step: usize) -> anyhow::Result<()> {
    let snapshot = store.snapshot()?;

    match step % 3 {
        // Re-rate a night somewhere in the middle of the list
        0 if !snapshot.is_empty() => {
            let target = &snapshot[step / 3 % snapshot.len()];
            let quality = DEMO_QUALITIES[step % DEMO_QUALITIES.len()];
            if target.quality != quality {
                store.set_quality(target.id, quality)?;
            }
        }
        // A new finished night appears at the top
        1 => {
            let wake = Utc::now();
            let bedtime = wake - ChronoDuration::hours(7);
            store.insert_night(bedtime, wake, DEMO_QUALITIES[step % DEMO_QUALITIES.len()])?;
        }
        // Trim history once it gets long
        _ => {
            if snapshot.len() > DEMO_MAX_NIGHTS {
                if let Some(oldest) = snapshot.last() {
                    store.delete_night(oldest.id)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent() {
        let store = NightStore::open_in_memory().unwrap();
        seed_history(&store).unwrap();
        let first = store.snapshot().unwrap().len();
        assert_eq!(first, DEMO_QUALITIES.len());

        seed_history(&store).unwrap();
        assert_eq!(store.snapshot().unwrap().len(), first);
    }

    #[test]
    fn steps_cycle_through_rate_insert_trim() {
        let store = NightStore::open_in_memory().unwrap();
        seed_history(&store).unwrap();

        let before = store.snapshot().unwrap().len();
        demo_step(&store, 1).unwrap(); // insert
        assert_eq!(store.snapshot().unwrap().len(), before + 1);

        demo_step(&store, 0).unwrap(); // re-rate, count unchanged
        assert_eq!(store.snapshot().unwrap().len(), before + 1);

        // Grow past the cap, then trim
        for _ in 0..DEMO_MAX_NIGHTS {
            demo_step(&store, 1).unwrap();
        }
        let grown = store.snapshot().unwrap().len();
        demo_step(&store, 2).unwrap();
        assert_eq!(store.snapshot().unwrap().len(), grown - 1);
    }
}
