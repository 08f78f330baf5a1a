// List presentation adapter - keeps the night list in sync with snapshots
//
// The adapter owns the displayed sequence (header + one row per night) and
// is the only thing allowed to replace it. Synchronization follows a
// build-offthread / apply-onthread split:
//
//   storage watcher ──snapshot──▶ submit()
//                                    │ spawns a task: build items + diff
//                                    ▼
//                       mpsc::UnboundedSender<ComputedUpdate>
//                                    │
//                                    ▼
//   TUI event loop ──────────────▶ apply()   (single consumer, in order)
//
// submit() stamps each task with a generation from an atomic counter;
// apply() only accepts the newest generation, so racing submissions
// resolve last-writer-wins with no torn intermediate sequence. Superseded
// results are simply dropped on arrival - building a sequence of tens of
// rows is too cheap to be worth cancelling.

pub mod diff;

use crate::model::{classify, DisplayItem, RowVariant, SleepNight};
use diff::DiffOp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of one off-thread sequence build, ready for the UI loop to apply.
#[derive(Debug)]
pub struct ComputedUpdate {
    /// Generation stamped at submit time; stale generations are discarded
    pub generation: u64,
    /// The freshly built displayed sequence
    pub items: Vec<DisplayItem>,
    /// Edit script from the sequence that was displayed at submit time
    pub script: Vec<DiffOp>,
}

/// Click handler invoked with a night's id when its row is activated.
pub struct ClickListener {
    on_click: Box<dyn Fn(i64) + Send + Sync>,
}

impl ClickListener {
    pub fn new(on_click: impl Fn(i64) + Send + Sync + 'static) -> Self {
        Self {
            on_click: Box::new(on_click),
        }
    }

    fn notify(&self, night_id: i64) {
        (self.on_click)(night_id)
    }
}

/// Build the displayed sequence for a snapshot: header prepended, nights
/// in source order. An absent snapshot is "zero nights", not an error.
pub fn build_display_items(snapshot: Option<Vec<SleepNight>>) -> Vec<DisplayItem> {
    let nights = snapshot.unwrap_or_default();
    let mut items = Vec::with_capacity(nights.len() + 1);
    items.push(DisplayItem::Header);
    items.extend(nights.into_iter().map(DisplayItem::Night));
    items
}

/// The adapter instance owned by the TUI's App.
///
/// `displayed` is mutated only through `apply`, which runs on the event
/// loop. `submit` may be called from the loop at any time; the heavy part
/// runs on a spawned task.
pub struct NightListAdapter {
    /// Currently displayed sequence (header always at index 0)
    displayed: Vec<DisplayItem>,
    /// Monotonic submission counter shared with in-flight build tasks
    generation: Arc<AtomicU64>,
    /// Generation of the sequence currently displayed
    applied_generation: u64,
    /// Hand-off channel to the event loop
    update_tx: mpsc::UnboundedSender<ComputedUpdate>,
    /// External click handler
    click_listener: ClickListener,
    /// Quality threshold for row variant classification
    threshold: u8,
}

impl NightListAdapter {
    pub fn new(
        update_tx: mpsc::UnboundedSender<ComputedUpdate>,
        click_listener: ClickListener,
        threshold: u8,
    ) -> Self {
        Self {
            displayed: vec![DisplayItem::Header],
            generation: Arc::new(AtomicU64::new(0)),
            applied_generation: 0,
            update_tx,
            click_listener,
            threshold,
        }
    }

    /// The sequence currently on screen
    pub fn items(&self) -> &[DisplayItem] {
        &self.displayed
    }

    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    /// Row variant for the item at `pos`, if in range
    pub fn variant_at(&self, pos: usize) -> Option<RowVariant> {
        self.displayed
            .get(pos)
            .map(|item| classify(item, self.threshold))
    }

    /// Accept a new snapshot. Builds the new sequence and its diff on a
    /// spawned task and posts the result back through the update channel.
    pub fn submit(&self, snapshot: Option<Vec<SleepNight>>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let old = self.displayed.clone();
        let tx = self.update_tx.clone();

        tokio::spawn(async move {
            let items = build_display_items(snapshot);
            let script = diff::diff(
                &old,
                &items,
                |a, b| a.id() == b.id(),
                |a, b| a == b,
            );
            // Receiver gone means the TUI is shutting down; nothing to do
            let _ = tx.send(ComputedUpdate {
                generation,
                items,
                script,
            });
        });
    }

    /// Apply a computed update on the event loop.
    ///
    /// Returns false (and leaves the displayed sequence untouched) when
    /// the update was superseded by a later submission.
    pub fn apply(&mut self, update: ComputedUpdate) -> bool {
        let latest = self.generation.load(Ordering::SeqCst);
        if update.generation < latest || update.generation <= self.applied_generation {
            tracing::debug!(
                generation = update.generation,
                latest,
                "discarding superseded list update"
            );
            return false;
        }

        tracing::debug!(
            generation = update.generation,
            rows = update.items.len(),
            ops = update.script.len(),
            "applying list update"
        );
        self.displayed = update.items;
        self.applied_generation = update.generation;
        true
    }

    /// Activate the row at `pos`. Header rows are inert; night rows
    /// notify the click listener with the night's id.
    pub fn click(&self, pos: usize) -> bool {
        match self.displayed.get(pos) {
            Some(DisplayItem::Night(night)) => {
                self.click_listener.notify(night.id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SleepNight, DEFAULT_QUALITY_THRESHOLD, HEADER_ID};
    use std::sync::Mutex;

    fn night(id: i64, quality: u8) -> SleepNight {
        SleepNight::from_millis(id, 1_700_000_000_000, 1_700_028_800_000, quality)
    }

    fn test_adapter() -> (
        NightListAdapter,
        mpsc::UnboundedReceiver<ComputedUpdate>,
        Arc<Mutex<Vec<i64>>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clicked = Arc::new(Mutex::new(Vec::new()));
        let sink = clicked.clone();
        let listener = ClickListener::new(move |id| sink.lock().unwrap().push(id));
        (
            NightListAdapter::new(tx, listener, DEFAULT_QUALITY_THRESHOLD),
            rx,
            clicked,
        )
    }

    #[test]
    fn absent_snapshot_builds_header_only() {
        let items = build_display_items(None);
        assert_eq!(items, vec![DisplayItem::Header]);
    }

    #[test]
    fn header_is_always_first_and_unique() {
        let items = build_display_items(Some(vec![night(1, 2), night(2, 4)]));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], DisplayItem::Header);
        let headers = items
            .iter()
            .filter(|i| matches!(i, DisplayItem::Header))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(items[1].id(), 1);
        assert_eq!(items[2].id(), 2);
    }

    #[tokio::test]
    async fn submit_then_apply_replaces_the_sequence() {
        let (mut adapter, mut rx, _) = test_adapter();
        adapter.submit(Some(vec![night(1, 2), night(2, 4)]));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.items.len(), 3);
        // Header survives the diff; only the two nights are inserted
        assert_eq!(update.script.len(), 2);
        assert!(adapter.apply(update));

        assert_eq!(adapter.len(), 3);
        assert_eq!(adapter.variant_at(0), Some(RowVariant::Header));
        assert_eq!(adapter.variant_at(1), Some(RowVariant::LowQuality));
        assert_eq!(adapter.variant_at(2), Some(RowVariant::GoodQuality));
    }

    #[tokio::test]
    async fn resubmitting_identical_content_yields_empty_script() {
        let (mut adapter, mut rx, _) = test_adapter();
        let snapshot = vec![night(1, 2), night(2, 4)];

        adapter.submit(Some(snapshot.clone()));
        let first = rx.recv().await.unwrap();
        assert!(adapter.apply(first));

        adapter.submit(Some(snapshot));
        let second = rx.recv().await.unwrap();
        assert!(second.script.is_empty());
        assert!(adapter.apply(second));
        assert_eq!(adapter.len(), 3);
    }

    #[tokio::test]
    async fn changed_attributes_on_same_key_produce_an_update_op() {
        let (mut adapter, mut rx, _) = test_adapter();
        adapter.submit(Some(vec![night(1, 2)]));
        let first = rx.recv().await.unwrap();
        adapter.apply(first);

        adapter.submit(Some(vec![night(1, 5)]));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.script, vec![DiffOp::Update { index: 1 }]);
    }

    #[tokio::test]
    async fn superseded_update_is_discarded() {
        let (mut adapter, mut rx, _) = test_adapter();
        adapter.submit(Some(vec![night(1, 2)]));
        adapter.submit(Some(vec![night(1, 2), night(2, 4)]));

        // Task completion order is not guaranteed; collect both results
        let mut a = rx.recv().await.unwrap();
        let mut b = rx.recv().await.unwrap();
        if a.generation > b.generation {
            std::mem::swap(&mut a, &mut b);
        }

        assert!(adapter.apply(b));
        assert_eq!(adapter.len(), 3);

        // The older generation arrives late and must not win
        assert!(!adapter.apply(a));
        assert_eq!(adapter.len(), 3);
    }

    #[tokio::test]
    async fn click_notifies_listener_with_night_id_and_ignores_header() {
        let (mut adapter, mut rx, clicked) = test_adapter();
        adapter.submit(Some(vec![night(7, 3)]));
        let update = rx.recv().await.unwrap();
        adapter.apply(update);

        assert!(!adapter.click(0)); // header
        assert!(adapter.click(1));
        assert!(!adapter.click(99)); // out of range
        assert_eq!(*clicked.lock().unwrap(), vec![7]);
    }

    #[test]
    fn header_sentinel_uses_the_reserved_identity() {
        let items = build_display_items(Some(vec![night(1, 1)]));
        assert_eq!(items[0].id(), HEADER_ID);
    }
}
