// Reusable scroll state for TUI panels
//
// Each panel owns its scroll state; the App just renders and routes
// input. The nights list keeps its selection visible, the logs panel
// auto-follows streaming entries.

/// Scroll state for a single panel
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Item index at the top of the viewport
    offset: usize,
    /// Total number of items in content
    total: usize,
    /// Items visible in the viewport
    viewport: usize,
    /// Keep the view pinned to the bottom as content grows.
    /// Scrolling up takes control; scrolling back to the bottom returns it.
    pub auto_follow: bool,
}

impl ScrollState {
    /// Manual scrolling (nights list)
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            auto_follow: false,
        }
    }

    /// Auto-following (logs panel)
    pub fn following() -> Self {
        Self {
            auto_follow: true,
            ..Self::new()
        }
    }

    /// Update content and viewport sizes; call each render frame
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;

        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn scroll_up(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            self.auto_follow = false;
        }
    }

    /// Scroll down one unit; reaching the bottom re-enables auto-follow
    pub fn scroll_down(&mut self) {
        if self.offset < self.max_offset() {
            self.offset += 1;
        }
        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    /// Bring `index` into the visible range, moving as little as possible
    pub fn ensure_visible(&mut self, index: usize) {
        if index < self.offset {
            self.offset = index;
        } else if self.viewport > 0 && index >= self.offset + self.viewport {
            self.offset = index + 1 - self.viewport;
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Visible range as (start, end)
    pub fn visible_range(&self) -> (usize, usize) {
        let start = self.offset;
        let end = (self.offset + self.viewport).min(self.total);
        (start, end)
    }

    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follow_pins_to_bottom() {
        let mut scroll = ScrollState::following();
        scroll.update_dimensions(20, 5);
        assert_eq!(scroll.visible_range(), (15, 20));

        scroll.update_dimensions(25, 5);
        assert_eq!(scroll.visible_range(), (20, 25));
    }

    #[test]
    fn scrolling_up_releases_auto_follow() {
        let mut scroll = ScrollState::following();
        scroll.update_dimensions(20, 5);
        scroll.scroll_up();
        assert!(!scroll.auto_follow);
        assert_eq!(scroll.offset(), 14);

        // Content grows; view stays where the user put it
        scroll.update_dimensions(30, 5);
        assert_eq!(scroll.offset(), 14);
    }

    #[test]
    fn ensure_visible_moves_minimally() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);

        scroll.ensure_visible(10);
        assert_eq!(scroll.visible_range(), (6, 11));

        scroll.ensure_visible(6); // already visible, no movement
        assert_eq!(scroll.offset(), 6);

        scroll.ensure_visible(2);
        assert_eq!(scroll.offset(), 2);
    }

    #[test]
    fn offset_clamps_when_content_shrinks() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);
        scroll.ensure_visible(19);
        assert_eq!(scroll.offset(), 15);

        scroll.update_dimensions(6, 5);
        assert_eq!(scroll.offset(), 1);
    }
}
