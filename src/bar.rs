//! What the bar should show
//!
//! The engine only decides *content*: a row of tag cells, the layout
//! symbol, the status text, and the selected client's title. Turning that
//! into pixels is the job of a [`Painter`], which also owns text
//! measurement so that click classification and rendering agree on where
//! everything is.

use crate::input::ClickRegion;
use anyhow::Result;
use x11rb::protocol::xproto::Window;

// ============================== Painter =============================
// ====================================================================

/// The draw collaborator the engine delegates pixels to
pub(crate) trait Painter {
    /// Width in pixels of a piece of text, padding included
    fn text_width(&self, text: &str) -> u32;

    /// Height of the bar this painter draws
    fn bar_height(&self) -> u32;

    /// The backing drawable must grow to cover the widest monitor
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Render a composed scene onto the given bar window
    fn repaint(&mut self, scene: &BarScene, bar_win: Window, width: u32) -> Result<()>;
}

/// Fixed-metric placeholder painter.
///
/// Measures text by cell count and renders nothing; a real renderer
/// implements [`Painter`] over a font and a pixmap and is handed to
/// [`WindowManager::new`](crate::wm::WindowManager::new) instead.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NullPainter;

/// Cell advance of the placeholder metric
const NULL_CELL_W: u32 = 7;
/// Bar height of the placeholder metric
const NULL_BAR_H: u32 = 14;

impl Painter for NullPainter {
    fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * NULL_CELL_W + NULL_BAR_H
    }

    fn bar_height(&self) -> u32 {
        NULL_BAR_H
    }

    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn repaint(&mut self, _scene: &BarScene, _bar_win: Window, _width: u32) -> Result<()> {
        Ok(())
    }
}

// ============================== Scene ===============================
// ====================================================================

/// Color scheme of one bar segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scheme {
    /// Unfocused colors
    Normal,
    /// Focused colors
    Selected,
}

/// The small indicator drawn in the corner of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Square {
    /// Solid square
    Filled,
    /// Outline square
    Outline,
}

/// One horizontal run of the bar
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BarItem {
    /// Left edge, relative to the bar window
    pub(crate) x:      i32,
    /// Width of the segment
    pub(crate) w:      u32,
    /// The text to draw
    pub(crate) text:   String,
    /// Colors to draw it in
    pub(crate) scheme: Scheme,
    /// Swap foreground and background (urgency)
    pub(crate) invert: bool,
    /// Indicator square, if any
    pub(crate) square: Option<Square>,
}

/// Everything one bar shows, left to right
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BarScene {
    /// The segments in draw order
    pub(crate) items: Vec<BarItem>,
}

/// Display state of one tag cell
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TagState {
    /// The view holds at least one client
    pub(crate) occupied: bool,
    /// The view holds an urgent client
    pub(crate) urgent:   bool,
    /// The view's focus stack has a head
    pub(crate) has_sel:  bool,
}

/// Title cell of the selected client
#[derive(Debug, Clone, Copy)]
pub(crate) struct TitleState<'a> {
    /// The (bounded) client title
    pub(crate) text:     &'a str,
    /// Client cannot be resized
    pub(crate) fixed:    bool,
    /// Client is floating
    pub(crate) floating: bool,
}

/// Compose the scene for one monitor's bar.
///
/// Layout mirrors the click classification in [`click_region`]: tag cells,
/// then the layout symbol, then (selected monitor only) the right-aligned
/// status, with the title filling whatever is left in the middle.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compose(
    painter: &dyn Painter,
    tags: &[String],
    states: &[TagState],
    sel_view: usize,
    is_sel_mon: bool,
    lt_symbol: &str,
    status: &str,
    title: Option<TitleState>,
    bar_w: u32,
) -> BarScene {
    let mut items = Vec::with_capacity(tags.len() + 3);
    let mut x = 0_i32;

    for (i, (tag, state)) in tags.iter().zip(states).enumerate() {
        let w = painter.text_width(tag);
        let square = if is_sel_mon && state.has_sel && i == sel_view {
            Some(Square::Filled)
        } else if state.occupied {
            Some(Square::Outline)
        } else {
            None
        };

        items.push(BarItem {
            x,
            w,
            text: tag.clone(),
            scheme: if i == sel_view { Scheme::Selected } else { Scheme::Normal },
            invert: state.urgent,
            square,
        });
        x += w as i32;
    }

    let lt_w = painter.text_width(lt_symbol);
    items.push(BarItem {
        x,
        w: lt_w,
        text: lt_symbol.to_owned(),
        scheme: Scheme::Normal,
        invert: false,
        square: None,
    });
    x += lt_w as i32;

    // status is only drawn on the selected monitor
    let mut status_x = bar_w as i32;
    if is_sel_mon {
        let mut w = painter.text_width(status);
        status_x = bar_w as i32 - w as i32;
        if status_x < x {
            status_x = x;
            w = (bar_w as i32 - x).max(0) as u32;
        }
        items.push(BarItem {
            x: status_x,
            w,
            text: status.to_owned(),
            scheme: Scheme::Normal,
            invert: false,
            square: None,
        });
    }

    // the selected client's title fills the middle
    let title_w = status_x - x;
    if title_w > painter.bar_height() as i32 {
        let item = title.map_or_else(
            || BarItem {
                x,
                w: title_w as u32,
                text: String::new(),
                scheme: Scheme::Normal,
                invert: false,
                square: None,
            },
            |t| BarItem {
                x,
                w: title_w as u32,
                text: t.text.to_owned(),
                scheme: if is_sel_mon { Scheme::Selected } else { Scheme::Normal },
                invert: false,
                square: if t.fixed {
                    Some(Square::Filled)
                } else if t.floating {
                    Some(Square::Outline)
                } else {
                    None
                },
            },
        );
        items.push(item);
    }

    BarScene { items }
}

/// Classify a click on the bar at `x`, returning the region and, for a tag
/// cell, the index of the clicked view
pub(crate) fn click_region(
    painter: &dyn Painter,
    click_x: i32,
    tags: &[String],
    lt_symbol: &str,
    status: &str,
    bar_w: u32,
) -> (ClickRegion, Option<usize>) {
    let mut x = 0_i32;
    for (i, tag) in tags.iter().enumerate() {
        x += painter.text_width(tag) as i32;
        if click_x < x {
            return (ClickRegion::TagBar, Some(i));
        }
    }

    if click_x < x + painter.text_width(lt_symbol) as i32 {
        (ClickRegion::LtSymbol, None)
    } else if click_x > bar_w as i32 - painter.text_width(status) as i32 {
        (ClickRegion::StatusText, None)
    } else {
        (ClickRegion::WinTitle, None)
    }
}

#[cfg(test)]
mod tests {
    use super::{click_region, compose, NullPainter, Painter, Scheme, Square, TagState, TitleState};
    use crate::input::ClickRegion;

    fn tags() -> Vec<String> {
        (1..=9).map(|t| t.to_string()).collect()
    }

    #[test]
    fn scene_orders_tags_layout_title_status() {
        let p = NullPainter;
        let states = vec![
            TagState { occupied: true, urgent: false, has_sel: true },
            TagState { occupied: true, urgent: true, has_sel: false },
            TagState::default(),
            TagState::default(),
            TagState::default(),
            TagState::default(),
            TagState::default(),
            TagState::default(),
            TagState::default(),
        ];
        let title = TitleState { text: "xterm", fixed: false, floating: true };

        let scene = compose(&p, &tags(), &states, 0, true, "[]=", "ok", Some(title), 1920);

        // nine tag cells, layout symbol, status, title
        assert_eq!(scene.items.len(), 12);

        // selected+focused tag carries the filled square, occupied the outline
        assert_eq!(scene.items[0].square, Some(Square::Filled));
        assert_eq!(scene.items[0].scheme, Scheme::Selected);
        assert_eq!(scene.items[1].square, Some(Square::Outline));
        assert!(scene.items[1].invert);
        assert_eq!(scene.items[2].square, None);

        // cells abut
        assert_eq!(scene.items[1].x, scene.items[0].x + scene.items[0].w as i32);

        // status is right-aligned
        let status = &scene.items[10];
        assert_eq!(status.x + status.w as i32, 1920);

        // the floating title carries an outline square
        let title = &scene.items[11];
        assert_eq!(title.text, "xterm");
        assert_eq!(title.square, Some(Square::Outline));
    }

    #[test]
    fn unselected_monitor_shows_no_status() {
        let p = NullPainter;
        let states = vec![TagState::default(); 9];

        let scene = compose(&p, &tags(), &states, 0, false, "[]=", "ok", None, 1920);

        assert!(scene.items.iter().all(|i| i.text != "ok"));
        // the empty title run still pads the middle
        assert_eq!(scene.items.last().unwrap().text, "");
    }

    #[test]
    fn clicks_map_to_regions() {
        let p = NullPainter;
        let tags = tags();
        let tag_w = p.text_width("1") as i32;

        let (region, idx) = click_region(&p, 0, &tags, "[]=", "status", 1920);
        assert_eq!((region, idx), (ClickRegion::TagBar, Some(0)));

        let (region, idx) = click_region(&p, tag_w * 3 + 1, &tags, "[]=", "status", 1920);
        assert_eq!((region, idx), (ClickRegion::TagBar, Some(3)));

        let (region, _) = click_region(&p, tag_w * 9 + 1, &tags, "[]=", "status", 1920);
        assert_eq!(region, ClickRegion::LtSymbol);

        let (region, _) = click_region(&p, 900, &tags, "[]=", "status", 1920);
        assert_eq!(region, ClickRegion::WinTitle);

        let (region, _) = click_region(&p, 1919, &tags, "[]=", "status", 1920);
        assert_eq!(region, ClickRegion::StatusText);
    }
}
