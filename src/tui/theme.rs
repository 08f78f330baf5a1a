// Theme system for the TUI
//
// A small set of built-in color themes, cycled at runtime with 't'.
// Each theme names the colors the panels draw with, including the pair
// used for the two night row variants.

use ratatui::style::Color;

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
    Nord,
    Dracula,
}

impl ThemeKind {
    pub fn all() -> &'static [ThemeKind] {
        &[
            ThemeKind::Dark,
            ThemeKind::Light,
            ThemeKind::Nord,
            ThemeKind::Dracula,
        ]
    }

    /// Get the next theme in the cycle
    pub fn next(self) -> Self {
        let themes = Self::all();
        let current = themes.iter().position(|&t| t == self).unwrap_or(0);
        themes[(current + 1) % themes.len()]
    }

    /// Parse a config value; unknown names fall back to Dark
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => ThemeKind::Light,
            "nord" => ThemeKind::Nord,
            "dracula" => ThemeKind::Dracula,
            _ => ThemeKind::Dark,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
            ThemeKind::Nord => "nord",
            ThemeKind::Dracula => "dracula",
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            ThemeKind::Dark => Theme {
                foreground: Color::Gray,
                accent: Color::Cyan,
                header: Color::Yellow,
                low_quality: Color::Red,
                good_quality: Color::Green,
                in_progress: Color::Blue,
                selection_fg: Color::Black,
                selection_bg: Color::Cyan,
                border: Color::DarkGray,
                border_focused: Color::Cyan,
                log_error: Color::Red,
                log_warn: Color::Yellow,
                log_info: Color::Gray,
                log_debug: Color::DarkGray,
            },
            ThemeKind::Light => Theme {
                foreground: Color::Black,
                accent: Color::Blue,
                header: Color::Magenta,
                low_quality: Color::Red,
                good_quality: Color::Rgb(0, 128, 0),
                in_progress: Color::Blue,
                selection_fg: Color::White,
                selection_bg: Color::Blue,
                border: Color::Gray,
                border_focused: Color::Blue,
                log_error: Color::Red,
                log_warn: Color::Rgb(150, 100, 0),
                log_info: Color::Black,
                log_debug: Color::Gray,
            },
            ThemeKind::Nord => Theme {
                foreground: Color::Rgb(216, 222, 233),
                accent: Color::Rgb(136, 192, 208),
                header: Color::Rgb(235, 203, 139),
                low_quality: Color::Rgb(191, 97, 106),
                good_quality: Color::Rgb(163, 190, 140),
                in_progress: Color::Rgb(129, 161, 193),
                selection_fg: Color::Rgb(46, 52, 64),
                selection_bg: Color::Rgb(136, 192, 208),
                border: Color::Rgb(76, 86, 106),
                border_focused: Color::Rgb(136, 192, 208),
                log_error: Color::Rgb(191, 97, 106),
                log_warn: Color::Rgb(235, 203, 139),
                log_info: Color::Rgb(216, 222, 233),
                log_debug: Color::Rgb(76, 86, 106),
            },
            ThemeKind::Dracula => Theme {
                foreground: Color::Rgb(248, 248, 242),
                accent: Color::Rgb(139, 233, 253),
                header: Color::Rgb(241, 250, 140),
                low_quality: Color::Rgb(255, 85, 85),
                good_quality: Color::Rgb(80, 250, 123),
                in_progress: Color::Rgb(98, 114, 164),
                selection_fg: Color::Rgb(40, 42, 54),
                selection_bg: Color::Rgb(189, 147, 249),
                border: Color::Rgb(98, 114, 164),
                border_focused: Color::Rgb(189, 147, 249),
                log_error: Color::Rgb(255, 85, 85),
                log_warn: Color::Rgb(241, 250, 140),
                log_info: Color::Rgb(248, 248, 242),
                log_debug: Color::Rgb(98, 114, 164),
            },
        }
    }
}

/// Colors for all UI elements
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub foreground: Color,
    pub accent: Color,
    /// Header sentinel row
    pub header: Color,
    /// Night rows below the quality threshold
    pub low_quality: Color,
    /// Night rows at or above the quality threshold
    pub good_quality: Color,
    /// Nights still being tracked
    pub in_progress: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub border: Color,
    pub border_focused: Color,
    pub log_error: Color,
    pub log_warn: Color,
    pub log_info: Color,
    pub log_debug: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_theme_and_wraps() {
        let mut kind = ThemeKind::Dark;
        for _ in 0..ThemeKind::all().len() {
            kind = kind.next();
        }
        assert_eq!(kind, ThemeKind::Dark);
    }

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(ThemeKind::from_name("nord"), ThemeKind::Nord);
        assert_eq!(ThemeKind::from_name("NoSuchTheme"), ThemeKind::Dark);
    }
}
