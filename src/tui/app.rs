// TUI application state
//
// App owns the list adapter, the selection, and the per-panel scroll
// state. All mutation happens on the event loop; background tasks only
// talk to App through channels.

use super::scroll::ScrollState;
use super::theme::{Theme, ThemeKind};
use crate::adapter::{diff::DiffOp, ClickListener, ComputedUpdate, NightListAdapter};
use crate::config::Config;
use crate::events::AppEvent;
use crate::logging::LogBuffer;
use crate::model::SleepNight;
use crate::storage::NightStore;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Different views the TUI can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Nights, // Night list with optional detail
    Help, // Keybindings
}

/// Which panel receives scroll/selection input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Nights,
    Logs,
}

/// How long a toast notification stays on screen
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Main application state for the TUI
pub struct App {
    /// The list adapter driving the night list
    pub adapter: NightListAdapter,

    /// Database handle for user actions (start/stop/rate/clear)
    pub store: NightStore,

    /// Index of the currently selected row in the displayed sequence
    pub selected: usize,

    /// Night shown in the detail panel (set by click notifications)
    pub detail: Option<SleepNight>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// When the app started (for uptime display)
    pub start_time: Instant,

    /// Scroll state for the night list
    pub list_scroll: ScrollState,

    /// Scroll state for the logs panel
    pub logs_scroll: ScrollState,

    /// Which panel has input focus
    pub focus: Focus,

    /// Current view being displayed
    pub view: View,

    /// Current color theme
    pub theme_kind: ThemeKind,

    /// Log buffer for the system logs panel
    pub log_buffer: LogBuffer,

    /// Quality threshold used for row classification (from config)
    pub quality_threshold: u8,

    /// Effective configuration; rewritten when the theme changes so the
    /// choice survives restarts
    pub config: Config,

    /// Transient notification shown in the status bar
    toast: Option<(String, Instant)>,

    /// Journal sink; None when journaling is disabled
    journal_tx: Option<mpsc::Sender<AppEvent>>,

    /// Running count of applied list updates (status bar)
    pub updates_applied: u64,
}

impl App {
    /// Create the App and its adapter, wiring the click listener to
    /// `click_tx` so activations come back through the event loop.
    pub fn new(
        config: &Config,
        store: NightStore,
        log_buffer: LogBuffer,
        update_tx: mpsc::UnboundedSender<ComputedUpdate>,
        click_tx: mpsc::UnboundedSender<i64>,
        journal_tx: Option<mpsc::Sender<AppEvent>>,
    ) -> Self {
        let listener = ClickListener::new(move |night_id| {
            // Receiver dropped only at shutdown
            let _ = click_tx.send(night_id);
        });
        let adapter = NightListAdapter::new(update_tx, listener, config.display.quality_threshold);

        Self {
            adapter,
            store,
            selected: 0,
            detail: None,
            should_quit: false,
            start_time: Instant::now(),
            list_scroll: ScrollState::new(),
            logs_scroll: ScrollState::following(),
            focus: Focus::default(),
            view: View::default(),
            theme_kind: ThemeKind::from_name(&config.theme),
            log_buffer,
            quality_threshold: config.display.quality_threshold,
            config: config.clone(),
            toast: None,
            journal_tx,
            updates_applied: 0,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme_kind.theme()
    }

    /// Apply a computed list update (or discard it if superseded) and
    /// journal the outcome.
    pub fn apply_update(&mut self, update: ComputedUpdate) {
        let generation = update.generation;
        let (mut inserts, mut removes, mut updates, mut moves) = (0, 0, 0, 0);
        for op in &update.script {
            match op {
                DiffOp::Insert { .. } => inserts += 1,
                DiffOp::Remove { .. } => removes += 1,
                DiffOp::Update { .. } => updates += 1,
                DiffOp::Move { .. } => moves += 1,
            }
        }
        let rows = update.items.len();

        if self.adapter.apply(update) {
            self.updates_applied += 1;
            // Keep the selection in range when rows disappear
            if self.selected >= self.adapter.len() {
                self.selected = self.adapter.len().saturating_sub(1);
            }
            self.journal(AppEvent::SnapshotApplied {
                timestamp: Utc::now(),
                generation,
                rows,
                inserts,
                removes,
                updates,
                moves,
            });
        } else {
            self.journal(AppEvent::SnapshotDiscarded {
                timestamp: Utc::now(),
                generation,
            });
        }
    }

    /// A click notification arrived for `night_id`: open the detail panel
    pub fn open_detail(&mut self, night_id: i64) {
        self.journal(AppEvent::NightClicked {
            timestamp: Utc::now(),
            night_id,
        });
        self.detail = self
            .adapter
            .items()
            .iter()
            .find_map(|item| item.night().filter(|n| n.id == night_id).cloned());
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn select_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
        self.list_scroll.ensure_visible(self.selected);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.adapter.len() {
            self.selected += 1;
        }
        self.list_scroll.ensure_visible(self.selected);
    }

    pub fn select_top(&mut self) {
        self.selected = 0;
        self.list_scroll.ensure_visible(0);
    }

    pub fn select_bottom(&mut self) {
        self.selected = self.adapter.len().saturating_sub(1);
        self.list_scroll.ensure_visible(self.selected);
    }

    /// Activate the selected row (header rows are inert)
    pub fn activate_selected(&mut self) {
        if !self.adapter.click(self.selected) {
            self.close_detail();
        }
    }

    /// Start a night, or stop the one in progress. The visible list
    /// updates when the watcher picks the write up.
    pub fn toggle_tracking(&mut self) {
        let now = Utc::now();
        match self.store.current_night() {
            Ok(Some(night)) => match self.store.stop_night(night.id, now) {
                Ok(()) => {
                    self.journal(AppEvent::TrackingStopped {
                        timestamp: now,
                        night_id: night.id,
                    });
                    self.toast(format!("Stopped tracking night #{}", night.id));
                }
                Err(e) => self.report_error("stop tracking", e),
            },
            Ok(None) => match self.store.start_night(now) {
                Ok(id) => {
                    self.journal(AppEvent::TrackingStarted {
                        timestamp: now,
                        night_id: id,
                    });
                    self.toast(format!("Tracking night #{}", id));
                }
                Err(e) => self.report_error("start tracking", e),
            },
            Err(e) => self.report_error("read current night", e),
        }
    }

    /// Rate the selected night `quality` (0-5)
    pub fn rate_selected(&mut self, quality: u8) {
        let Some(night) = self
            .adapter
            .items()
            .get(self.selected)
            .and_then(|item| item.night())
        else {
            self.toast("Select a night to rate".to_string());
            return;
        };
        let night_id = night.id;

        match self.store.set_quality(night_id, quality) {
            Ok(()) => {
                self.journal(AppEvent::QualityRated {
                    timestamp: Utc::now(),
                    night_id,
                    quality,
                });
                self.toast(format!("Rated night #{} as {}", night_id, quality));
            }
            Err(e) => self.report_error("rate night", e),
        }
    }

    /// Delete every night
    pub fn clear_all(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.journal(AppEvent::NightsCleared {
                    timestamp: Utc::now(),
                });
                self.close_detail();
                self.toast("Cleared all nights".to_string());
            }
            Err(e) => self.report_error("clear nights", e),
        }
    }

    /// Copy the selected night's summary to the system clipboard
    pub fn copy_selected(&mut self) {
        let Some(summary) = self
            .adapter
            .items()
            .get(self.selected)
            .and_then(|item| item.night())
            .map(|n| n.summary())
        else {
            self.toast("Select a night to copy".to_string());
            return;
        };

        match arboard::Clipboard::new().and_then(|mut c| c.set_text(summary)) {
            Ok(()) => self.toast("Copied to clipboard".to_string()),
            Err(e) => {
                tracing::warn!("Clipboard unavailable: {}", e);
                self.toast("Clipboard unavailable".to_string());
            }
        }
    }

    /// Switch to the next theme and persist the choice. Losing the
    /// preference is not worth interrupting the session, so a failed
    /// write only logs.
    pub fn cycle_theme(&mut self) {
        self.theme_kind = self.theme_kind.next();
        self.config.theme = self.theme_kind.name().to_string();
        if let Err(e) = self.config.save() {
            tracing::warn!("Could not persist theme choice: {}", e);
        }
        self.toast(format!("Theme: {}", self.theme_kind.name()));
    }

    pub fn toggle_help(&mut self) {
        self.view = match self.view {
            View::Nights => View::Help,
            View::Help => View::Nights,
        };
    }

    pub fn toast(&mut self, message: String) {
        self.toast = Some((message, Instant::now()));
    }

    /// Current toast text, if it hasn't expired
    pub fn active_toast(&self) -> Option<&str> {
        match &self.toast {
            Some((message, since)) if since.elapsed() < TOAST_DURATION => Some(message),
            _ => None,
        }
    }

    fn report_error(&mut self, action: &str, e: anyhow::Error) {
        tracing::error!("Failed to {}: {:?}", action, e);
        self.toast(format!("Failed to {}", action));
    }

    fn journal(&self, event: AppEvent) {
        if let Some(tx) = &self.journal_tx {
            // try_send: the journal must never stall the UI loop
            let _ = tx.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DisplayItem, RowVariant};

    fn test_app() -> (
        App,
        mpsc::UnboundedReceiver<ComputedUpdate>,
        mpsc::UnboundedReceiver<i64>,
    ) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (click_tx, click_rx) = mpsc::unbounded_channel();
        let store = NightStore::open_in_memory().unwrap();
        let app = App::new(
            &Config::default(),
            store,
            LogBuffer::new(),
            update_tx,
            click_tx,
            None,
        );
        (app, update_rx, click_rx)
    }

    #[tokio::test]
    async fn starts_with_header_only_sequence() {
        let (app, _update_rx, _click_rx) = test_app();
        assert_eq!(app.adapter.items(), &[DisplayItem::Header]);
        assert_eq!(app.adapter.variant_at(0), Some(RowVariant::Header));
    }

    #[tokio::test]
    async fn tracking_round_trip_reaches_the_list_via_snapshots() {
        let (mut app, mut update_rx, _click_rx) = test_app();

        app.toggle_tracking(); // start
        let snapshot = app.store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].in_progress());

        // Simulate what the watcher does
        app.adapter.submit(Some(snapshot));
        let update = update_rx.recv().await.unwrap();
        app.apply_update(update);
        assert_eq!(app.adapter.len(), 2);
        assert_eq!(app.updates_applied, 1);

        app.toggle_tracking(); // stop
        assert!(app.store.current_night().unwrap().is_none());
    }

    #[tokio::test]
    async fn rating_updates_storage_for_the_selected_row() {
        let (mut app, mut update_rx, _click_rx) = test_app();
        let id = app
            .store
            .insert_night(Utc::now() - chrono::Duration::hours(8), Utc::now(), 1)
            .unwrap();

        app.adapter.submit(Some(app.store.snapshot().unwrap()));
        let update = update_rx.recv().await.unwrap();
        app.apply_update(update);

        app.selected = 1; // the night row
        app.rate_selected(5);
        assert_eq!(app.store.night(id).unwrap().unwrap().quality, 5);
    }

    #[tokio::test]
    async fn activation_routes_through_click_channel_to_detail() {
        let (mut app, mut update_rx, mut click_rx) = test_app();
        let id = app
            .store
            .insert_night(Utc::now() - chrono::Duration::hours(7), Utc::now(), 4)
            .unwrap();

        app.adapter.submit(Some(app.store.snapshot().unwrap()));
        let update = update_rx.recv().await.unwrap();
        app.apply_update(update);

        // Header is inert
        app.selected = 0;
        app.activate_selected();
        assert!(click_rx.try_recv().is_err());

        app.selected = 1;
        app.activate_selected();
        let clicked = click_rx.try_recv().unwrap();
        assert_eq!(clicked, id);

        app.open_detail(clicked);
        assert_eq!(app.detail.as_ref().map(|n| n.id), Some(id));
    }

    #[tokio::test]
    async fn cycling_the_theme_writes_it_back_to_the_config_file() {
        use crate::config::test_support;
        use crate::tui::theme::ThemeKind;

        let _lock = test_support::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let _home = test_support::HomeGuard::new("theme-persist");

        let (mut app, _update_rx, _click_rx) = test_app();
        assert_eq!(app.theme_kind, ThemeKind::Dark);

        app.cycle_theme();
        assert_eq!(app.theme_kind, ThemeKind::Light);

        let path = Config::config_path().unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("theme = \"light\""));

        // A fresh load starts from the persisted theme
        assert_eq!(Config::from_env().theme, "light");
    }

    #[tokio::test]
    async fn selection_clamps_when_the_list_shrinks() {
        let (mut app, mut update_rx, _click_rx) = test_app();
        for _ in 0..3 {
            app.store
                .insert_night(Utc::now() - chrono::Duration::hours(6), Utc::now(), 3)
                .unwrap();
        }
        app.adapter.submit(Some(app.store.snapshot().unwrap()));
        let update = update_rx.recv().await.unwrap();
        app.apply_update(update);
        app.selected = 3;

        app.clear_all();
        app.adapter.submit(Some(app.store.snapshot().unwrap()));
        let update = update_rx.recv().await.unwrap();
        app.apply_update(update);

        assert_eq!(app.adapter.len(), 1); // header only
        assert_eq!(app.selected, 0);
    }
}
