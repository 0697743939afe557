//! One physical screen and its nine views

use crate::{geometry::Rectangle, view::View};
use x11rb::protocol::xproto::Window;

/// Number of views on every monitor
pub(crate) const NUM_VIEWS: usize = 9;

/// Maximum length of the displayed layout symbol in bytes
pub(crate) const LT_SYMBOL_MAX: usize = 16;

/// One monitor as reported by Xinerama: its screen rectangle, the window
/// area left over after the bar, and the nine [`View`]s living on it.
///
/// Monitors are identified by their index in the manager's list; the
/// geometry reconciler only ever appends or truncates, so an index stays
/// valid for the lifetime of its monitor.
#[derive(Debug, Clone)]
pub(crate) struct Monitor {
    /// Index assigned by the geometry reconciler
    pub(crate) num: usize,

    /// The whole screen rectangle
    pub(crate) screen: Rectangle,
    /// The screen minus the bar; what the arrangers divide up
    pub(crate) window: Rectangle,
    /// Y-coordinate of the bar, `-bar_h` when hidden
    pub(crate) bar_y:  i32,

    /// Whether the bar is shown
    pub(crate) show_bar: bool,
    /// Whether the bar sits at the top edge
    pub(crate) top_bar:  bool,
    /// The bar window handle
    pub(crate) bar_win:  Window,

    /// Symbol of the current layout, possibly overridden by `monocle`
    pub(crate) lt_symbol: String,

    /// The nine views
    pub(crate) views:    [View; NUM_VIEWS],
    /// Index of the selected view
    pub(crate) sel_view: usize,
}

impl Monitor {
    /// Create a monitor with empty views, all on the default layout
    pub(crate) fn new(
        num: usize,
        mfact: f32,
        layout: usize,
        symbol: &str,
        show_bar: bool,
        top_bar: bool,
    ) -> Self {
        let views: [View; NUM_VIEWS] = std::array::from_fn(|_| View::new(mfact, layout));

        Self {
            num,
            screen: Rectangle::default(),
            window: Rectangle::default(),
            bar_y: 0,
            show_bar,
            top_bar,
            bar_win: x11rb::NONE,
            lt_symbol: symbol.to_owned(),
            views,
            sel_view: 0,
        }
    }

    /// The selected view
    pub(crate) fn sel_view(&self) -> &View {
        &self.views[self.sel_view]
    }

    /// The selected view, mutably
    pub(crate) fn sel_view_mut(&mut self) -> &mut View {
        &mut self.views[self.sel_view]
    }

    /// Replace the displayed layout symbol, bounded to [`LT_SYMBOL_MAX`]
    pub(crate) fn set_lt_symbol(&mut self, symbol: &str) {
        let mut end = symbol.len().min(LT_SYMBOL_MAX);
        while !symbol.is_char_boundary(end) {
            end -= 1;
        }
        self.lt_symbol = symbol[..end].to_owned();
    }

    /// Adopt a new screen rectangle and recompute the window area
    pub(crate) fn set_screen(&mut self, screen: Rectangle, bar_h: u32) {
        self.screen = screen;
        self.update_bar_pos(bar_h);
    }

    /// Recompute the window area and bar position from the screen rectangle
    /// and the `show_bar` / `top_bar` flags
    pub(crate) fn update_bar_pos(&mut self, bar_h: u32) {
        let mut window = self.screen;

        if self.show_bar {
            window.dimension.height = self.screen.h().saturating_sub(bar_h);
            if self.top_bar {
                self.bar_y = window.y();
                window.point.y += bar_h as i32;
            } else {
                self.bar_y = window.bottom();
            }
        } else {
            self.bar_y = -(bar_h as i32);
        }

        self.window = window;
    }
}

#[cfg(test)]
mod tests {
    use super::Monitor;
    use crate::geometry::Rectangle;

    const BAR_H: u32 = 14;

    fn monitor() -> Monitor {
        let mut m = Monitor::new(0, 0.55, 0, "[]=", true, true);
        m.set_screen(Rectangle::new(0, 0, 1920, 1080), BAR_H);
        m
    }

    #[test]
    fn top_bar_shrinks_window_area_from_above() {
        let m = monitor();
        assert_eq!(m.window, Rectangle::new(0, 14, 1920, 1066));
        assert_eq!(m.bar_y, 0);
    }

    #[test]
    fn bottom_bar_shrinks_window_area_from_below() {
        let mut m = monitor();
        m.top_bar = false;
        m.update_bar_pos(BAR_H);

        assert_eq!(m.window, Rectangle::new(0, 0, 1920, 1066));
        assert_eq!(m.bar_y, 1066);
    }

    #[test]
    fn hidden_bar_leaves_the_whole_screen() {
        let mut m = monitor();
        m.show_bar = false;
        m.update_bar_pos(BAR_H);

        assert_eq!(m.window, m.screen);
        assert_eq!(m.bar_y, -14);
    }

    #[test]
    fn offset_monitor_keeps_its_origin() {
        let mut m = monitor();
        m.set_screen(Rectangle::new(1920, 200, 1280, 1024), BAR_H);

        assert_eq!(m.window, Rectangle::new(1920, 214, 1280, 1010));
        assert_eq!(m.bar_y, 200);
    }
}
