// UI rendering logic
//
// All rendering for the TUI lives here. In ratatui the layout and
// widgets are rebuilt on every frame; the adapter's displayed sequence
// is the single source of what the night list shows, and classify()
// picks each row's visual template.

use super::app::{App, Focus, View};
use super::theme::Theme;
use crate::logging::{LogEntry, LogLevel};
use crate::model::{classify, DisplayItem, RowVariant, SleepNight};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &mut App) {
    // Split the terminal into four vertical sections:
    // - Title bar (3 lines fixed)
    // - Main content area (fills remaining space)
    // - System logs (6 lines fixed)
    // - Status bar (3 lines fixed)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(8),    // Main content
            Constraint::Length(6), // System logs
            Constraint::Length(3), // Status bar
        ])
        .split(f.area());

    let theme = app.theme();

    render_title(f, chunks[0], app, &theme);

    match app.view {
        View::Nights => render_nights_content(f, chunks[1], app, &theme),
        View::Help => render_help_view(f, chunks[1], &theme),
    }

    render_logs_panel(f, chunks[2], app, &theme);
    render_status(f, chunks[3], app, &theme);
}

fn render_title(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let title = Line::from(vec![
        Span::styled(
            " sleepscope ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("v{}", crate::config::VERSION),
            Style::default().fg(theme.foreground),
        ),
        Span::raw("  "),
        Span::styled(
            format!("theme: {}", app.theme_kind.name()),
            Style::default().fg(theme.border),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(title).block(block), area);
}

/// Night list, with the detail panel alongside when a night is open
fn render_nights_content(f: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    if app.detail.is_some() && area.width >= 80 {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        render_night_list(f, chunks[0], app, theme);
        if let Some(night) = &app.detail {
            render_detail_panel(f, chunks[1], night, theme);
        }
    } else if let Some(night) = app.detail.clone() {
        // Too narrow for a split: detail takes the whole content area
        render_detail_panel(f, area, &night, theme);
    } else {
        render_night_list(f, area, app, theme);
    }
}

fn render_night_list(f: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    let viewport = area.height.saturating_sub(2) as usize; // borders
    app.list_scroll
        .update_dimensions(app.adapter.len(), viewport);
    app.list_scroll.ensure_visible(app.selected);

    let (start, end) = app.list_scroll.visible_range();
    let focused = app.focus == Focus::Nights;
    let width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = app.adapter.items()[start..end]
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let absolute = start + i;
            let variant = classify(item, app.quality_threshold);
            let line = render_row(item, variant, width, theme);

            // Selected row gets the theme's selection pair for contrast
            let row = ListItem::new(line);
            if focused && absolute == app.selected {
                row.style(
                    Style::default()
                        .fg(theme.selection_fg)
                        .bg(theme.selection_bg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                row
            }
        })
        .collect();

    let border_color = if focused {
        theme.border_focused
    } else {
        theme.border
    };
    let night_count = app.adapter.len().saturating_sub(1);
    let title = format!(" Nights ({}) ", night_count);

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    f.render_widget(list, area);
}

/// Build one row line. The match on RowVariant is exhaustive: the set of
/// templates is closed, so there is no fallback arm to rot.
fn render_row(item: &DisplayItem, variant: RowVariant, width: usize, theme: &Theme) -> Line<'static> {
    match variant {
        RowVariant::Header => Line::from(Span::styled(
            "Sleep Results",
            Style::default()
                .fg(theme.header)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        RowVariant::LowQuality | RowVariant::GoodQuality => {
            // classify only returns night variants for night rows
            let night = item
                .night()
                .unwrap_or_else(|| unreachable!("night variant on header row"));
            let color = match variant {
                RowVariant::LowQuality => theme.low_quality,
                RowVariant::GoodQuality => theme.good_quality,
                RowVariant::Header => unreachable!(),
            };

            let stars = "★".repeat(night.quality as usize);
            let body = if night.in_progress() {
                format!(
                    "#{:<4} {}  tracking…",
                    night.id,
                    night.start_time.format("%b %d %H:%M"),
                )
            } else {
                let mins = night.duration().num_minutes();
                format!(
                    "#{:<4} {}  {}h{:02}m  {:<5} {}",
                    night.id,
                    night.start_time.format("%b %d %H:%M"),
                    mins / 60,
                    mins % 60,
                    stars,
                    night.quality_label(),
                )
            };

            let style = if night.in_progress() {
                Style::default()
                    .fg(theme.in_progress)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default().fg(color)
            };
            Line::from(Span::styled(truncate_to_width(&body, width), style))
        }
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, night: &SleepNight, theme: &Theme) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Night #{}", night.id),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Start:    ", Style::default().fg(theme.border)),
            Span::raw(night.start_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]),
    ];

    if night.in_progress() {
        lines.push(Line::from(Span::styled(
            "Still tracking…",
            Style::default()
                .fg(theme.in_progress)
                .add_modifier(Modifier::ITALIC),
        )));
    } else {
        let mins = night.duration().num_minutes();
        lines.push(Line::from(vec![
            Span::styled("End:      ", Style::default().fg(theme.border)),
            Span::raw(night.end_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Duration: ", Style::default().fg(theme.border)),
            Span::raw(format!("{}h{:02}m", mins / 60, mins % 60)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Quality:  ", Style::default().fg(theme.border)),
            Span::raw(format!("{} ({})", night.quality, night.quality_label())),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "0-5 rate · y copy · Esc close",
        Style::default().fg(theme.border),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(" Detail ");
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_help_view(f: &mut Frame, area: Rect, theme: &Theme) {
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", k), Style::default().fg(theme.accent)),
            Span::styled(desc, Style::default().fg(theme.foreground)),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            "Keybindings",
            Style::default()
                .fg(theme.header)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        key("j/k, ↓/↑", "Move selection"),
        key("g / G", "Jump to top / bottom"),
        key("Enter", "Open the selected night"),
        key("Esc", "Close detail / help"),
        key("s", "Start or stop tracking a night"),
        key("0-5", "Rate the selected night"),
        key("C", "Clear all nights"),
        key("y", "Copy selected night to clipboard"),
        key("Tab", "Switch focus between nights and logs"),
        key("t", "Cycle color theme"),
        key("?", "Toggle this help"),
        key("q", "Quit"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Help ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_logs_panel(f: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    let entries = app.log_buffer.entries();
    let viewport = area.height.saturating_sub(2) as usize;
    app.logs_scroll.update_dimensions(entries.len(), viewport);

    let (start, end) = app.logs_scroll.visible_range();
    let focused = app.focus == Focus::Logs;

    let items: Vec<ListItem> = entries[start..end]
        .iter()
        .map(|entry| {
            ListItem::new(format_log_entry(entry)).style(log_level_style(&entry.level, theme))
        })
        .collect();

    let border_color = if focused {
        theme.border_focused
    } else {
        theme.border
    };
    let title = if app.logs_scroll.auto_follow {
        " System Logs "
    } else {
        " System Logs [scroll] "
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    f.render_widget(list, area);
}

fn render_status(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let line = if let Some(toast) = app.active_toast() {
        Line::from(Span::styled(
            format!(" {} ", toast),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        let nights = app.adapter.len().saturating_sub(1);
        let uptime = app.start_time.elapsed().as_secs();
        Line::from(vec![
            Span::styled(
                format!(" {} nights ", nights),
                Style::default().fg(theme.foreground),
            ),
            Span::styled("· ", Style::default().fg(theme.border)),
            Span::styled(
                format!("{} updates ", app.updates_applied),
                Style::default().fg(theme.foreground),
            ),
            Span::styled("· ", Style::default().fg(theme.border)),
            Span::styled(
                format!("up {}m{:02}s ", uptime / 60, uptime % 60),
                Style::default().fg(theme.foreground),
            ),
            Span::styled("· ", Style::default().fg(theme.border)),
            Span::styled(
                "s track  0-5 rate  Enter detail  ? help  q quit",
                Style::default().fg(theme.border),
            ),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

fn log_level_style(level: &LogLevel, theme: &Theme) -> Style {
    let color = match level {
        LogLevel::Error => theme.log_error,
        LogLevel::Warn => theme.log_warn,
        LogLevel::Info => theme.log_info,
        LogLevel::Debug | LogLevel::Trace => theme.log_debug,
    };
    Style::default().fg(color)
}

/// Truncate to a display width, honoring wide characters (CJK, emoji)
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_width_aware() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        // Wide chars count double
        let truncated = truncate_to_width("日本語テスト", 5);
        assert!(truncated.ends_with('…'));
        assert!(truncated.chars().count() <= 3);
    }
}
