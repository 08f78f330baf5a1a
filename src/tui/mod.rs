// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks)
// - Receiving snapshots, computed list updates and click notifications
// - Rendering the UI

pub mod app;
pub mod scroll;
pub mod theme;
pub mod ui;

use crate::adapter::ComputedUpdate;
use crate::model::SleepNight;
use anyhow::{Context, Result};
use app::{App, Focus, View};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// when done - including on error, so a panic in the loop doesn't leave
/// the shell in raw mode.
pub async fn run_tui(
    mut app: App,
    mut snapshot_rx: mpsc::Receiver<Vec<SleepNight>>,
    mut update_rx: mpsc::UnboundedReceiver<ComputedUpdate>,
    mut click_rx: mpsc::UnboundedReceiver<i64>,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // The displayed sequence starts as header-only ("no data yet")
    app.adapter.submit(None);

    let result = run_event_loop(
        &mut terminal,
        &mut app,
        &mut snapshot_rx,
        &mut update_rx,
        &mut click_rx,
    )
    .await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// tokio::select! waits on four sources at once:
/// 1. Keyboard input (navigation and commands)
/// 2. Timer ticks (periodic redraws, toast expiry)
/// 3. Snapshots from the storage watcher (fed into adapter.submit)
/// 4. Computed list updates and click notifications from the adapter
///
/// Snapshot construction happens on spawned tasks; everything received
/// here is applied on this single loop, which is what keeps the
/// displayed sequence free of torn intermediate states.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    snapshot_rx: &mut mpsc::Receiver<Vec<SleepNight>>,
    update_rx: &mut mpsc::UnboundedReceiver<ComputedUpdate>,
    click_rx: &mut mpsc::UnboundedReceiver<i64>,
) -> Result<()> {
    // 5 FPS is plenty for a list that only changes on snapshots
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard input
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        handle_key_event(app, key_event);
                    }
                }
            } => {}

            // Periodic tick for redrawing
            _ = tick_interval.tick() => {}

            // A fresh snapshot from the watcher: hand it to the adapter
            Some(nights) = snapshot_rx.recv() => {
                app.adapter.submit(Some(nights));
            }

            // An off-thread build finished: apply (or discard) it here
            Some(update) = update_rx.recv() => {
                app.apply_update(update);
            }

            // A night row was activated
            Some(night_id) = click_rx.recv() => {
                app.open_detail(night_id);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Route a key press to the App
fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Only react to presses; some terminals also send release events
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Help view swallows everything except close/quit
    if app.view == View::Help {
        match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Esc | KeyCode::Char('?') => app.toggle_help(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            if app.detail.is_some() {
                app.close_detail();
            }
        }

        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Nights => Focus::Logs,
                Focus::Logs => Focus::Nights,
            };
        }

        KeyCode::Up | KeyCode::Char('k') => match app.focus {
            Focus::Nights => app.select_up(),
            Focus::Logs => app.logs_scroll.scroll_up(),
        },
        KeyCode::Down | KeyCode::Char('j') => match app.focus {
            Focus::Nights => app.select_down(),
            Focus::Logs => app.logs_scroll.scroll_down(),
        },
        KeyCode::Char('g') => app.select_top(),
        KeyCode::Char('G') => app.select_bottom(),

        KeyCode::Enter => app.activate_selected(),

        // Tracking and rating write to storage; the list catches up when
        // the watcher delivers the next snapshot
        KeyCode::Char('s') => app.toggle_tracking(),
        KeyCode::Char(c @ '0'..='5') => {
            // '0'..='5' guarantees the digit parses
            app.rate_selected(c as u8 - b'0');
        }
        KeyCode::Char('C') => app.clear_all(),

        KeyCode::Char('y') => app.copy_selected(),
        KeyCode::Char('t') => app.cycle_theme(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}
