//! Metadata about a managed X-window

use crate::geometry::{Dimension, Point, Rectangle};
use bitflags::bitflags;
use x11rb::{properties, protocol::xproto::Window};

/// Maximum length of a client title in bytes
pub(crate) const TITLE_MAX: usize = 256;

/// Title used for clients that advertise nothing readable
pub(crate) const BROKEN: &str = "broken";

// ============================ SizeHints =============================
// ====================================================================

/// The `WM_NORMAL_HINTS` constraints a client has placed on its own
/// geometry, reduced to the fields the resize policy consults.
///
/// See [ICCCM 4.1.2.3][1] for the meaning of each field.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.2.3
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct SizeHints {
    /// Program-specified base width and height
    pub(crate) base: (i32, i32),
    /// Program-specified resize increments
    pub(crate) inc:  (i32, i32),
    /// Program-specified minimum size
    pub(crate) min:  (i32, i32),
    /// Program-specified maximum size (`0` means unconstrained)
    pub(crate) max:  (i32, i32),
    /// Program-specified minimum aspect ratio (`h/w` lower bound)
    pub(crate) mina: f32,
    /// Program-specified maximum aspect ratio (`w/h` upper bound)
    pub(crate) maxa: f32,
}

impl SizeHints {
    /// Reduce a raw `WM_NORMAL_HINTS` property to the policy fields.
    ///
    /// Base falls back to the minimum size and vice-versa when only one of
    /// the two was specified.
    pub(crate) fn from_normal_hints(hints: &properties::WmSizeHints) -> Self {
        let base = hints.base_size.or(hints.min_size).unwrap_or((0, 0));
        let min = hints.min_size.or(hints.base_size).unwrap_or((0, 0));
        let inc = hints.size_increment.unwrap_or((0, 0));
        let max = hints.max_size.unwrap_or((0, 0));

        let (mina, maxa) = hints.aspect.map_or((0.0, 0.0), |(min_a, max_a)| {
            (
                min_a.denominator as f32 / min_a.numerator as f32,
                max_a.numerator as f32 / max_a.denominator as f32,
            )
        });

        Self { base, inc, min, max, mina, maxa }
    }

    /// A client whose minimum and maximum sizes coincide cannot be resized
    pub(crate) fn is_fixed(&self) -> bool {
        self.max.0 > 0 && self.max.1 > 0 && self.max == self.min
    }
}

// =========================== ClientFlags ============================
// ====================================================================

bitflags! {
    /// Boolean state carried by every [`Client`]
    #[derive(Default)]
    pub(crate) struct ClientFlags: u8 {
        /// Min and max size hints coincide; implies `FLOATING`
        const FIXED        = 0b0000_0001;
        /// Positioned by the user; skipped by the arrangers
        const FLOATING     = 0b0000_0010;
        /// The urgency WM hint is set and the client is not focused
        const URGENT       = 0b0000_0100;
        /// Currently occupying the whole monitor
        const FULLSCREEN   = 0b0000_1000;
        /// The floating state to restore when leaving fullscreen
        const OLD_FLOATING = 0b0001_0000;
    }
}

// =============================== Client =============================
// ====================================================================

/// One managed top-level window and the state the engine tracks for it
#[derive(Debug, Clone)]
pub(crate) struct Client {
    /// The window handle given out by the server
    pub(crate) window: Window,
    /// `_NET_WM_NAME` or `WM_NAME`, bounded to [`TITLE_MAX`] bytes
    pub(crate) title:  String,

    /// Current geometry, border excluded
    pub(crate) rect:     Rectangle,
    /// Geometry before the last resize; restored when leaving fullscreen
    pub(crate) old_rect: Rectangle,
    /// Current border width
    pub(crate) bw:       u32,
    /// Border width before the last change
    pub(crate) old_bw:   u32,

    /// The `WM_NORMAL_HINTS` constraints
    pub(crate) hints: SizeHints,
    /// Boolean state
    pub(crate) flags: ClientFlags,

    /// Index of the owning monitor
    pub(crate) mon:  usize,
    /// Index of the owning view on that monitor
    pub(crate) view: usize,
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.window == other.window
    }
}

impl Client {
    /// Create a new [`Client`] from the attributes a window had when it was
    /// first managed
    pub(crate) fn new(window: Window, rect: Rectangle, bw: u32, mon: usize, view: usize) -> Self {
        Self {
            window,
            title: String::new(),
            rect,
            old_rect: rect,
            bw,
            old_bw: bw,
            hints: SizeHints::default(),
            flags: ClientFlags::empty(),
            mon,
            view,
        }
    }

    /// Width including both borders
    pub(crate) const fn outer_w(&self) -> i32 {
        self.rect.dimension.width as i32 + 2 * self.bw as i32
    }

    /// Height including both borders
    pub(crate) const fn outer_h(&self) -> i32 {
        self.rect.dimension.height as i32 + 2 * self.bw as i32
    }

    /// Is the client skipped by the arrangers?
    pub(crate) const fn is_floating(&self) -> bool {
        self.flags.contains(ClientFlags::FLOATING)
    }

    /// Is the client currently fullscreen?
    pub(crate) const fn is_fullscreen(&self) -> bool {
        self.flags.contains(ClientFlags::FULLSCREEN)
    }

    /// Store a new geometry, remembering the previous one
    pub(crate) fn set_rect(&mut self, rect: Rectangle) {
        self.old_rect = self.rect;
        self.rect = rect;
    }

    /// Bound the title to [`TITLE_MAX`] bytes on a character boundary,
    /// falling back to [`BROKEN`] when the client advertises nothing
    pub(crate) fn set_title(&mut self, title: &str) {
        let mut end = title.len().min(TITLE_MAX);
        while !title.is_char_boundary(end) {
            end -= 1;
        }
        self.title = if end == 0 {
            BROKEN.to_owned()
        } else {
            title[..end].to_owned()
        };
    }

    /// Refresh the size hints and the `FIXED` flag from a new
    /// `WM_NORMAL_HINTS` property
    pub(crate) fn set_hints(&mut self, hints: SizeHints) {
        self.hints = hints;
        self.flags.set(ClientFlags::FIXED, hints.is_fixed());
    }

    /// Record the state to restore later and adopt fullscreen geometry
    /// bookkeeping. The caller pushes the screen rectangle to the server.
    pub(crate) fn enter_fullscreen(&mut self) {
        self.flags
            .set(ClientFlags::OLD_FLOATING, self.is_floating());
        self.flags
            .insert(ClientFlags::FULLSCREEN | ClientFlags::FLOATING);
        self.old_bw = self.bw;
        self.bw = 0;
    }

    /// Restore the geometry, border, and floating state saved when
    /// fullscreen was entered
    pub(crate) fn exit_fullscreen(&mut self) {
        let floating = self.flags.contains(ClientFlags::OLD_FLOATING);
        self.flags.set(ClientFlags::FLOATING, floating);
        self.flags.remove(ClientFlags::FULLSCREEN);
        self.bw = self.old_bw;
        self.rect = self.old_rect;
    }

    /// Clamp a proposed rectangle against the screen and the client's size
    /// hints, returning the result and whether it differs from the current
    /// geometry.
    ///
    /// Policy, in order: enforce a positive size; rescue the window from
    /// off-screen (against the whole display when `interactive`, else
    /// against the owning monitor's screen rectangle); enforce the bar
    /// height as a lower bound; then, for floating clients or when
    /// `respect_hints` is set, the ICCCM 4.1.2.3 aspect / increment /
    /// min / max negotiation.
    pub(crate) fn apply_size_hints(
        &self,
        rect: Rectangle,
        interactive: bool,
        display: Dimension,
        screen: Rectangle,
        bar_h: u32,
        respect_hints: bool,
    ) -> (Rectangle, bool) {
        let bw = self.bw as i32;
        let mut x = rect.x();
        let mut y = rect.y();
        let mut w = (rect.w() as i32).max(1);
        let mut h = (rect.h() as i32).max(1);

        if interactive {
            let (sw, sh) = (display.width as i32, display.height as i32);
            if x > sw {
                x = sw - self.outer_w();
            }
            if y > sh {
                y = sh - self.outer_h();
            }
            if x + w + 2 * bw < 0 {
                x = 0;
            }
            if y + h + 2 * bw < 0 {
                y = 0;
            }
        } else {
            if x > screen.right() {
                x = screen.right() - self.outer_w();
            }
            if y > screen.bottom() {
                y = screen.bottom() - self.outer_h();
            }
            if x + w + 2 * bw < screen.x() {
                x = screen.x();
            }
            if y + h + 2 * bw < screen.y() {
                y = screen.y();
            }
        }

        h = h.max(bar_h as i32);
        w = w.max(bar_h as i32);

        if respect_hints || self.is_floating() {
            let SizeHints { base, inc, min, max, mina, maxa } = self.hints;

            // see the last two sentences in ICCCM 4.1.2.3
            let base_is_min = base == min;
            if !base_is_min {
                // temporarily remove base dimensions
                w -= base.0;
                h -= base.1;
            }
            // adjust for aspect limits
            if mina > 0.0 && maxa > 0.0 {
                if maxa < w as f32 / h as f32 {
                    w = (h as f32 * maxa + 0.5) as i32;
                } else if mina < h as f32 / w as f32 {
                    h = (w as f32 * mina + 0.5) as i32;
                }
            }
            if base_is_min {
                // increment calculation requires this
                w -= base.0;
                h -= base.1;
            }
            // adjust for increment value
            if inc.0 > 0 {
                w -= w % inc.0;
            }
            if inc.1 > 0 {
                h -= h % inc.1;
            }
            // restore base dimensions
            w = (w + base.0).max(min.0);
            h = (h + base.1).max(min.1);
            if max.0 > 0 {
                w = w.min(max.0);
            }
            if max.1 > 0 {
                h = h.min(max.1);
            }
        }

        let clamped = Rectangle::new(x, y, w.max(1) as u32, h.max(1) as u32);
        let changed = clamped != self.rect;

        (clamped, changed)
    }

    /// The point at the middle of the client, used to decide which monitor
    /// it should migrate to after a drag
    pub(crate) const fn center(&self) -> Point {
        self.rect.center()
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, ClientFlags, SizeHints, BROKEN, TITLE_MAX};
    use crate::geometry::{Dimension, Rectangle};

    const DISPLAY: Dimension = Dimension::new(1920, 1080);
    const SCREEN: Rectangle = Rectangle::new(0, 0, 1920, 1080);
    const BAR_H: u32 = 14;

    fn client() -> Client {
        Client::new(1, Rectangle::new(0, 0, 400, 300), 1, 0, 0)
    }

    #[test]
    fn tiled_resize_ignores_min_size_without_respect_hints() {
        let mut c = client();
        c.set_hints(SizeHints {
            min: (500, 500),
            ..SizeHints::default()
        });

        let (r, changed) =
            c.apply_size_hints(Rectangle::new(0, 0, 400, 300), false, DISPLAY, SCREEN, BAR_H, false);

        assert_eq!(r, Rectangle::new(0, 0, 400, 300));
        assert!(!changed);
    }

    #[test]
    fn bar_height_is_the_floor_for_either_axis() {
        let c = client();
        let (r, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 3, 5), false, DISPLAY, SCREEN, BAR_H, false);

        assert_eq!((r.w(), r.h()), (BAR_H, BAR_H));
    }

    #[test]
    fn floating_client_honors_min_and_max() {
        let mut c = client();
        c.flags.insert(ClientFlags::FLOATING);
        c.set_hints(SizeHints {
            min: (200, 150),
            max: (600, 400),
            ..SizeHints::default()
        });

        let (small, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 50, 50), false, DISPLAY, SCREEN, BAR_H, false);
        assert_eq!((small.w(), small.h()), (200, 150));

        let (big, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 900, 900), false, DISPLAY, SCREEN, BAR_H, false);
        assert_eq!((big.w(), big.h()), (600, 400));
    }

    #[test]
    fn increments_snap_down_from_the_base_size() {
        let mut c = client();
        c.flags.insert(ClientFlags::FLOATING);
        c.set_hints(SizeHints {
            base: (20, 10),
            min: (20, 10),
            inc: (16, 32),
            ..SizeHints::default()
        });

        let (r, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 100, 100), false, DISPLAY, SCREEN, BAR_H, false);

        // (100 - 20) snaps to 80, (100 - 10) snaps to 64
        assert_eq!((r.w(), r.h()), (100, 74));
    }

    #[test]
    fn aspect_ratio_bounds_the_proposal() {
        let mut c = client();
        c.flags.insert(ClientFlags::FLOATING);
        c.set_hints(SizeHints {
            mina: 0.5,
            maxa: 2.0,
            ..SizeHints::default()
        });

        // wider than 2:1 gets its width pulled in
        let (wide, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 500, 100), false, DISPLAY, SCREEN, BAR_H, false);
        assert_eq!((wide.w(), wide.h()), (200, 100));

        // taller than 1:2 gets its height pulled in
        let (tall, _) =
            c.apply_size_hints(Rectangle::new(0, 0, 100, 500), false, DISPLAY, SCREEN, BAR_H, false);
        assert_eq!((tall.w(), tall.h()), (100, 50));
    }

    #[test]
    fn off_screen_proposal_is_rescued_to_the_monitor() {
        let c = client();
        let (r, _) = c.apply_size_hints(
            Rectangle::new(5000, -4000, 400, 300),
            false,
            DISPLAY,
            SCREEN,
            BAR_H,
            false,
        );

        assert_eq!(r.x(), 1920 - c.outer_w());
        assert_eq!(r.y(), 0);
    }

    #[test]
    fn unchanged_rect_reports_no_change() {
        let c = client();
        let (_, changed) =
            c.apply_size_hints(Rectangle::new(0, 0, 400, 300), false, DISPLAY, SCREEN, BAR_H, false);
        assert!(!changed);
    }

    #[test]
    fn fixed_clients_are_detected() {
        let mut c = client();
        c.set_hints(SizeHints {
            min: (300, 200),
            max: (300, 200),
            ..SizeHints::default()
        });

        assert!(c.flags.contains(ClientFlags::FIXED));
    }

    #[test]
    fn fullscreen_round_trip_restores_geometry() {
        let mut c = client();
        c.set_rect(Rectangle::new(30, 40, 500, 400));
        let saved = (c.rect, c.bw, c.is_floating());

        c.enter_fullscreen();
        c.set_rect(SCREEN);
        assert!(c.is_fullscreen());
        assert!(c.is_floating());
        assert_eq!(c.bw, 0);

        c.exit_fullscreen();
        assert_eq!((c.rect, c.bw, c.is_floating()), saved);
        assert!(!c.is_fullscreen());
    }

    #[test]
    fn title_is_bounded_and_broken_when_empty() {
        let mut c = client();
        c.set_title("");
        assert_eq!(c.title, BROKEN);

        c.set_title(&"é".repeat(200));
        assert!(c.title.len() <= TITLE_MAX);
        assert!(c.title.chars().all(|ch| ch == 'é'));
    }
}
