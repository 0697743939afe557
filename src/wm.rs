//! The window-management engine
//!
//! Owns the client registry, the monitor list, and the focus policy; every
//! mutation of that state lives here. The event dispatch that drives these
//! operations is in [`events`](crate::events).

use crate::{
    bar::{self, Painter, TagState, TitleState},
    client::{Client, ClientFlags, SizeHints},
    config::{pixel, Config},
    geometry::{Dimension, Point, Rectangle},
    input::{mods_mask, Button, ButtonBinding, ClickRegion, KeyBinding},
    layout::{self, Arranger, LAYOUTS},
    monitor::{Monitor, NUM_VIEWS},
    xconnection::{WmState, XConn},
};
use anyhow::{Context, Result};
use std::{
    collections::{HashMap, VecDeque},
    os::unix::process::CommandExt,
    process::{Command, Stdio},
};
use x11rb::protocol::{
    xproto::{AtomEnum, ButtonIndex, ConfigureWindowAux, ModMask, StackMode, Window},
    Event,
};

/// Status text shown when the root window carries no name
const DEFAULT_STATUS: &str = concat!("vwm-", env!("CARGO_PKG_VERSION"));

/// Maximum length of the status text in bytes
const STATUS_MAX: usize = 256;

// ============================== Drag ================================

/// Which kind of pointer drag is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragKind {
    /// Moving the client under the pointer
    Move,
    /// Resizing it from its bottom-right corner
    Resize,
}

/// An in-flight pointer drag; while one is set, the dispatcher accepts only
/// the drag whitelist of event types
#[derive(Debug, Clone, Copy)]
pub(crate) struct Drag {
    /// Move or resize
    pub(crate) kind:       DragKind,
    /// The dragged client
    pub(crate) window:     Window,
    /// Pointer position when the drag started
    pub(crate) start_ptr:  Point,
    /// Client geometry when the drag started
    pub(crate) start_rect: Rectangle,
}

// ========================== WindowManager ===========================

/// The engine: every piece of mutable window-management state, and the
/// operations the dispatcher and the bindings invoke on it
pub(crate) struct WindowManager {
    /// The X surface
    pub(crate) x: XConn,
    /// Immutable user configuration
    pub(crate) config: Config,
    /// The draw collaborator for the bars
    pub(crate) painter: Box<dyn Painter>,

    /// Every managed client, keyed by its window
    pub(crate) clients:  HashMap<Window, Client>,
    /// Monitors in Xinerama order
    pub(crate) monitors: Vec<Monitor>,
    /// Index of the selected monitor
    pub(crate) sel_mon:  usize,

    /// Root window name, shown in the bar
    pub(crate) status:  String,
    /// Whole display size, updated on root `ConfigureNotify`
    pub(crate) display: Dimension,
    /// Bar height, fixed by the painter's font
    pub(crate) bar_h:   u32,
    /// Which modifier bit is num-lock
    pub(crate) numlock: u16,

    /// The key table
    pub(crate) keys:    Vec<KeyBinding>,
    /// The button table
    pub(crate) buttons: Vec<ButtonBinding>,

    /// Events put aside while draining crossings after a restack
    pub(crate) pending: VecDeque<Event>,
    /// The in-flight drag, if any
    pub(crate) drag:    Option<Drag>,
    /// Cleared by the quit binding
    pub(crate) running: bool,

    /// Border pixel for unfocused clients
    norm_border: u32,
    /// Border pixel for the focused client
    sel_border:  u32,
}

impl WindowManager {
    /// Claim the WM slot on the server and assemble the engine
    pub(crate) fn new(x: XConn, config: Config, painter: Box<dyn Painter>) -> Result<Self> {
        x.become_wm()?;

        let norm_border = pixel(&config.colors.normal_border)?;
        let sel_border = pixel(&config.colors.selected_border)?;
        let display = x.display_size();
        let bar_h = painter.bar_height();
        let keys = config.keys();
        let buttons = config.buttons();

        let mut wm = Self {
            x,
            config,
            painter,
            clients: HashMap::new(),
            monitors: Vec::new(),
            sel_mon: 0,
            status: DEFAULT_STATUS.to_owned(),
            display,
            bar_h,
            numlock: 0,
            keys,
            buttons,
            pending: VecDeque::new(),
            drag: None,
            running: false,
            norm_border,
            sel_border,
        };

        wm.setup()?;

        Ok(wm)
    }

    /// One-time server-side setup: monitors, bars, root properties, grabs
    fn setup(&mut self) -> Result<()> {
        self.update_geometry()?;
        self.x.advertise_support()?;
        self.x.init_root()?;
        self.update_bars()?;
        self.update_status();
        self.grab_keys();
        self.x.flush();

        Ok(())
    }

    // ========================= Accessors ========================

    /// The selected monitor
    pub(crate) fn sel_mon(&self) -> &Monitor {
        &self.monitors[self.sel_mon]
    }

    /// The selected monitor, mutably
    pub(crate) fn sel_mon_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.sel_mon]
    }

    /// The selected client of the selected monitor's selected view
    pub(crate) fn sel_client(&self) -> Option<Window> {
        self.sel_mon().sel_view().sel
    }

    /// Which monitor a window belongs to: the pointer's monitor for the
    /// root, a bar's own monitor, a client's owner, or the selection
    pub(crate) fn window_to_monitor(&self, window: Window) -> usize {
        if window == self.x.root() {
            if let Some(p) = self.x.query_pointer() {
                return self.point_to_monitor(p);
            }
        }
        if let Some(m) = self.monitors.iter().position(|m| m.bar_win == window) {
            return m;
        }
        self.clients
            .get(&window)
            .map_or(self.sel_mon, |c| c.mon)
    }

    /// The first monitor whose window area contains the point
    pub(crate) fn point_to_monitor(&self, point: Point) -> usize {
        self.monitors
            .iter()
            .position(|m| m.window.contains(point))
            .unwrap_or(self.sel_mon)
    }

    /// The monitor `dir` hops away from the selection, wrapping
    pub(crate) fn dir_to_monitor(&self, dir: i32) -> usize {
        let n = self.monitors.len();
        if dir > 0 {
            (self.sel_mon + 1) % n
        } else {
            (self.sel_mon + n - 1) % n
        }
    }

    /// Tiled windows of a monitor's selected view, in display order
    fn tiled_windows(&self, mon: usize) -> Vec<Window> {
        self.monitors[mon]
            .sel_view()
            .clients
            .iter()
            .copied()
            .filter(|w| !self.clients[w].is_floating())
            .collect()
    }

    // ========================== Geometry ========================

    /// Clamp a proposed rectangle through the client's size hints and push
    /// it to the server if it changed
    pub(crate) fn resize(&mut self, window: Window, rect: Rectangle, interactive: bool) {
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        let screen = self.monitors[c.mon].screen;
        let (rect, changed) = c.apply_size_hints(
            rect,
            interactive,
            self.display,
            screen,
            self.bar_h,
            self.config.resize_hints,
        );

        if changed {
            self.resize_client(window, rect);
        }
    }

    /// Adopt a new geometry and push it to the server unconditionally
    pub(crate) fn resize_client(&mut self, window: Window, rect: Rectangle) {
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };
        c.set_rect(rect);
        let bw = c.bw;
        self.x.move_resize(window, rect, bw);
        self.x.send_configure_notify(window, rect, bw);
        self.x.sync();
    }

    // ========================== Arrange =========================

    /// Re-layout one monitor, or all of them
    pub(crate) fn arrange(&mut self, mon: Option<usize>) {
        match mon {
            Some(m) => self.show_hide(m),
            None => (0..self.monitors.len()).for_each(|m| self.show_hide(m)),
        }
        self.focus(None);
        match mon {
            Some(m) => self.arrange_monitor(m),
            None => (0..self.monitors.len()).for_each(|m| self.arrange_monitor(m)),
        }
    }

    /// Run the selected view's arranger and restack
    fn arrange_monitor(&mut self, mon: usize) {
        let (layout_idx, mfact, total) = {
            let view = self.monitors[mon].sel_view();
            (view.layout, view.mfact, view.clients.len())
        };
        let layout = &LAYOUTS[layout_idx];
        let area = self.monitors[mon].window;

        self.monitors[mon].set_lt_symbol(layout.symbol);
        if layout.arrange == Some(Arranger::Monocle) && total > 0 {
            self.monitors[mon].set_lt_symbol(&format!("[{total}]"));
        }

        if let Some(arranger) = layout.arrange {
            let bar_h = self.bar_h;
            let windows = self.tiled_windows(mon);
            let borders: Vec<u32> = windows.iter().map(|w| self.clients[w].bw).collect();

            layout::arrange(arranger, area, mfact, bar_h, &borders, |i, rect| {
                self.resize(windows[i], rect, false);
                self.clients.get(&windows[i]).map_or(rect, |c| c.rect)
            });
        }

        self.restack(mon);
    }

    /// Reflect focus and layout in the server's stacking order: a floating
    /// selection is raised, tiled clients are sunk below the bar in focus
    /// order. Crossing events caused by the restack are discarded.
    pub(crate) fn restack(&mut self, mon: usize) {
        self.draw_bar(mon);

        let view = self.monitors[mon].sel_view();
        let Some(sel) = view.sel else {
            return;
        };
        let layout = &LAYOUTS[view.layout];

        if layout.arrange.is_none() || self.clients.get(&sel).map_or(false, Client::is_floating) {
            self.x.raise_window(sel);
        }

        if layout.arrange.is_some() {
            let mut sibling = self.monitors[mon].bar_win;
            for &w in &self.monitors[mon].sel_view().stack {
                if self.clients.get(&w).map_or(true, Client::is_floating) {
                    continue;
                }
                self.x.configure(
                    w,
                    &ConfigureWindowAux::new()
                        .sibling(sibling)
                        .stack_mode(StackMode::BELOW),
                );
                sibling = w;
            }
        }

        self.drain_crossings();
    }

    /// Throw away the `EnterNotify` events a batch of configures produced,
    /// keeping everything else for the dispatcher
    pub(crate) fn drain_crossings(&mut self) {
        self.x.sync();
        while let Some(event) = self.x.poll_for_event() {
            if !matches!(event, Event::EnterNotify(_)) {
                self.pending.push_back(event);
            }
        }
    }

    /// Put the selected view's windows where the model says they are,
    /// most recently focused first
    fn show_hide(&mut self, mon: usize) {
        let stack = self.monitors[mon].sel_view().stack.clone();
        let floating_layout = LAYOUTS[self.monitors[mon].sel_view().layout].arrange.is_none();

        for w in stack {
            let (rect, floating) = match self.clients.get(&w) {
                Some(c) => (c.rect, c.is_floating()),
                None => continue,
            };
            self.x.move_window(w, rect.point);
            if floating_layout || floating {
                self.resize(w, rect, false);
            }
        }
    }

    // =========================== Focus ==========================

    /// Give focus to a client, or to the head of the selected view's focus
    /// stack when `None`
    pub(crate) fn focus(&mut self, window: Option<Window>) {
        let window = window
            .or_else(|| self.sel_mon().sel_view().stack.first().copied())
            .filter(|w| self.clients.contains_key(w));

        if let Some(prev) = self.sel_client() {
            if Some(prev) != window {
                self.unfocus(prev, false);
            }
        }

        if let Some(w) = window {
            let (mon, view, urgent) = {
                let c = &self.clients[&w];
                (c.mon, c.view, c.flags.contains(ClientFlags::URGENT))
            };
            if mon != self.sel_mon {
                self.sel_mon = mon;
            }
            if urgent {
                if let Some(c) = self.clients.get_mut(&w) {
                    c.flags.remove(ClientFlags::URGENT);
                }
                self.x.clear_urgency(w);
            }
            self.monitors[mon].views[view].promote(w);
            self.grab_buttons(w, true);
            self.x.set_border_color(w, self.sel_border);
            self.x.focus_window(w);
        } else {
            self.x.focus_root();
        }

        self.sel_mon_mut().sel_view_mut().sel = window;
        self.draw_bars();
    }

    /// Drop a client out of focus: normal border, only the catch-all
    /// button grab so a click can re-focus it
    pub(crate) fn unfocus(&mut self, window: Window, refocus_root: bool) {
        if !self.clients.contains_key(&window) {
            return;
        }
        self.grab_buttons(window, false);
        self.x.set_border_color(window, self.norm_border);
        if refocus_root {
            self.x.focus_root();
        }
    }

    // ======================= Grab policy ========================

    /// The four lock-modifier combinations every grab is repeated with
    fn lock_combos(&self) -> [u16; 4] {
        let caps = u16::from(ModMask::LOCK);
        [0, caps, self.numlock, self.numlock | caps]
    }

    /// Install the button grabs a client needs in its focus state: the
    /// configured client-window bindings when focused, a single catch-all
    /// grab otherwise
    pub(crate) fn grab_buttons(&mut self, window: Window, focused: bool) {
        self.numlock = self.x.numlock_mask();
        self.x.ungrab_buttons(window);

        if focused {
            for binding in &self.buttons {
                if binding.click != ClickRegion::ClientWin {
                    continue;
                }
                let mask = mods_mask(&binding.mods);
                for combo in self.lock_combos() {
                    self.x
                        .grab_button(window, button_index(binding.button), mask | combo);
                }
            }
        } else {
            self.x
                .grab_button(window, ButtonIndex::ANY, u16::from(ModMask::ANY));
        }
    }

    /// Install the key grabs for the whole key table
    pub(crate) fn grab_keys(&mut self) {
        self.numlock = self.x.numlock_mask();
        self.x.ungrab_keys();

        for binding in &self.keys {
            let mask = mods_mask(&binding.mods);
            for keycode in self.x.keysym_to_keycodes(binding.keysym) {
                for combo in self.lock_combos() {
                    self.x.grab_key(keycode, mask | combo);
                }
            }
        }
    }

    // ========================= Lifecycle ========================

    /// Bring a new window under management
    pub(crate) fn manage(&mut self, window: Window, geom: Rectangle, old_bw: u32) {
        let trans = self
            .x
            .transient_for(window)
            .and_then(|t| self.clients.get(&t));
        let (mon, view) = trans.map_or_else(
            || (self.sel_mon, self.monitors[self.sel_mon].sel_view),
            |t| (t.mon, t.view),
        );
        let is_transient = trans.is_some();
        let screen = self.monitors[mon].screen;
        let win_area = self.monitors[mon].window;
        let bar_y = self.monitors[mon].bar_y;

        let mut c = Client::new(window, geom, self.config.border_px, mon, view);
        c.old_bw = old_bw;

        let mut x = geom.x() + win_area.x();
        let mut y = geom.y() + win_area.y();
        let (w, h) = (geom.w() as i32, geom.h() as i32);

        if w == screen.w() as i32 && h == screen.h() as i32 {
            // screen-sized windows start floating and borderless at the
            // screen origin
            c.flags.insert(ClientFlags::FLOATING);
            x = screen.x();
            y = screen.y();
            c.bw = 0;
        } else {
            let bw = c.bw as i32;
            if x + w + 2 * bw > screen.right() {
                x = screen.right() - w - 2 * bw;
            }
            if y + h + 2 * bw > screen.bottom() {
                y = screen.bottom() - h - 2 * bw;
            }
            x = x.max(screen.x());
            // only fix the y-offset when the client center might cover the
            // bar
            let covers_bar = bar_y == 0
                && x + w / 2 >= win_area.x()
                && x + w / 2 < win_area.right();
            y = y.max(if covers_bar { self.bar_h as i32 } else { screen.y() });
        }

        let rect = Rectangle::new(x, y, geom.w(), geom.h());
        c.rect = rect;
        c.old_rect = rect;

        if let Some(hints) = self.x.normal_hints(window) {
            c.set_hints(SizeHints::from_normal_hints(&hints));
        }
        if !c.is_floating() {
            let floating = is_transient || c.flags.contains(ClientFlags::FIXED);
            c.flags.set(ClientFlags::FLOATING, floating);
            c.flags.set(ClientFlags::OLD_FLOATING, floating);
        }

        let bw = c.bw;
        let floating = c.is_floating();
        self.clients.insert(window, c);
        self.update_title(window);

        self.x.set_border_width(window, bw);
        self.x.set_border_color(window, self.norm_border);
        // propagates the border width even when the size does not change
        self.x.send_configure_notify(window, rect, bw);
        self.x.select_client_events(window);
        self.grab_buttons(window, false);
        if floating {
            self.x.raise_window(window);
        }

        self.monitors[mon].views[view].attach(window);
        self.monitors[mon].views[view].attach_stack(window);

        // park it off-screen until the arrange; some clients need a real
        // configure before the first map
        self.x.move_resize(
            window,
            Rectangle::new(rect.x() + 2 * self.display.width as i32, rect.y(), rect.w(), rect.h()),
            bw,
        );
        self.x.map_window(window);
        self.x.set_wm_state(window, WmState::Normal);
        self.arrange(Some(mon));

        log::info!("managing window {window} on monitor {mon}, view {view}");
    }

    /// Drop a window from management. `destroyed` tells whether the window
    /// is already gone, in which case no requests may touch it.
    pub(crate) fn unmanage(&mut self, window: Window, destroyed: bool) {
        let Some(c) = self.clients.remove(&window) else {
            return;
        };
        let view = &mut self.monitors[c.mon].views[c.view];
        view.detach(window);
        view.detach_stack(window);

        if self.drag.map_or(false, |d| d.window == window) {
            self.drag = None;
            self.x.ungrab_pointer();
        }

        if !destroyed {
            // the server grab makes the restore atomic against the client
            // disappearing mid-sequence
            let _server = self.x.grab_server();
            self.x.set_border_width(window, c.old_bw);
            self.x.ungrab_buttons(window);
            self.x.set_wm_state(window, WmState::Withdrawn);
            self.x.sync();
        }

        log::info!("unmanaging window {window}");
        self.focus(None);
        self.arrange(Some(c.mon));
    }

    /// Manage everything that was already mapped when we started: regular
    /// windows first, transients second so their owners exist
    pub(crate) fn scan(&mut self) -> Result<()> {
        let children = self
            .x
            .query_tree_children(self.x.root())
            .context("failed to scan existing windows")?;

        let mut transients = Vec::new();
        for window in children {
            let Some(attrs) = self.x.window_attributes(window) else {
                continue;
            };
            if attrs.override_redirect {
                continue;
            }
            if self.x.transient_for(window).is_some() {
                transients.push(window);
                continue;
            }
            if self.x.window_is_viewable(window)
                || self.x.wm_state(window) == Some(WmState::Iconic.into())
            {
                self.manage_existing(window);
            }
        }

        for window in transients {
            if self.x.window_is_viewable(window)
                || self.x.wm_state(window) == Some(WmState::Iconic.into())
            {
                self.manage_existing(window);
            }
        }

        Ok(())
    }

    /// Fetch the geometry of a pre-existing window and manage it
    fn manage_existing(&mut self, window: Window) {
        if self.clients.contains_key(&window) {
            return;
        }
        if let Some(geom) = self.x.window_geometry(window) {
            let old_bw = self.x.window_border_width(window);
            self.manage(window, geom, old_bw);
        }
    }

    /// Close the selected client: politely when it speaks
    /// `WM_DELETE_WINDOW`, forcefully otherwise
    pub(crate) fn kill_client(&mut self) {
        let Some(sel) = self.sel_client() else {
            return;
        };
        if self.x.supports_delete(sel) {
            if let Err(e) = self.x.send_delete(sel) {
                log::warn!("failed to ask {sel} to close: {e}");
            }
        } else {
            self.x.kill_client_force(sel);
        }
    }

    /// Move a client to another monitor, onto that monitor's selected view
    pub(crate) fn send_to_monitor(&mut self, window: Window, target: usize) {
        let (mon, view) = match self.clients.get(&window) {
            Some(c) if c.mon != target => (c.mon, c.view),
            _ => return,
        };

        self.unfocus(window, true);
        self.monitors[mon].views[view].detach(window);
        self.monitors[mon].views[view].detach_stack(window);

        let target_view = self.monitors[target].sel_view;
        if let Some(c) = self.clients.get_mut(&window) {
            c.mon = target;
            c.view = target_view;
        }
        self.monitors[target].views[target_view].attach(window);
        self.monitors[target].views[target_view].attach_stack(window);

        self.focus(None);
        self.arrange(None);
    }

    // ========================= Fullscreen =======================

    /// Enter or leave fullscreen, per the `_NET_WM_STATE` protocol
    pub(crate) fn set_fullscreen(&mut self, window: Window, fullscreen: bool) {
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };

        if fullscreen && !c.is_fullscreen() {
            c.enter_fullscreen();
            let screen = self.monitors[c.mon].screen;
            self.x.set_net_fullscreen(window, true);
            self.resize_client(window, screen);
            self.x.raise_window(window);
        } else if !fullscreen && c.is_fullscreen() {
            c.exit_fullscreen();
            let (rect, mon) = (c.rect, c.mon);
            self.x.set_net_fullscreen(window, false);
            self.resize_client(window, rect);
            self.arrange(Some(mon));
        }
    }

    // =========================== Bars ===========================

    /// Create missing bar windows and size the painter's drawable to the
    /// widest monitor
    pub(crate) fn update_bars(&mut self) -> Result<()> {
        let widest = self
            .monitors
            .iter()
            .map(|m| m.screen.w())
            .max()
            .unwrap_or(self.display.width);
        self.painter.resize(widest, self.bar_h)?;

        for m in &mut self.monitors {
            if m.bar_win != x11rb::NONE {
                continue;
            }
            let rect = Rectangle::new(m.window.x(), m.bar_y, m.window.w(), self.bar_h);
            m.bar_win = self.x.create_bar_window(rect, self.bar_h)?;
        }

        Ok(())
    }

    /// Recompose and repaint one monitor's bar
    pub(crate) fn draw_bar(&mut self, mon: usize) {
        let m = &self.monitors[mon];
        let states: Vec<TagState> = m
            .views
            .iter()
            .map(|v| TagState {
                occupied: !v.clients.is_empty(),
                urgent:   v
                    .clients
                    .iter()
                    .any(|w| self.clients[w].flags.contains(ClientFlags::URGENT)),
                has_sel:  v.sel.is_some(),
            })
            .collect();

        let sel = m.sel_view().sel.and_then(|w| self.clients.get(&w));
        let title = sel.map(|c| TitleState {
            text:     &c.title,
            fixed:    c.flags.contains(ClientFlags::FIXED),
            floating: c.is_floating(),
        });

        let scene = bar::compose(
            &*self.painter,
            &self.config.tags,
            &states,
            m.sel_view,
            mon == self.sel_mon,
            &m.lt_symbol,
            &self.status,
            title,
            m.window.w(),
        );

        let (bar_win, width) = (m.bar_win, m.window.w());
        if let Err(e) = self.painter.repaint(&scene, bar_win, width) {
            log::warn!("failed to repaint bar {bar_win}: {e}");
        }
    }

    /// Repaint every bar
    pub(crate) fn draw_bars(&mut self) {
        for m in 0..self.monitors.len() {
            self.draw_bar(m);
        }
    }

    /// Re-read the status text from the root window name
    pub(crate) fn update_status(&mut self) {
        let mut status = self
            .x
            .text_prop(self.x.root(), u32::from(AtomEnum::WM_NAME))
            .unwrap_or_else(|| DEFAULT_STATUS.to_owned());

        let mut end = status.len().min(STATUS_MAX);
        while !status.is_char_boundary(end) {
            end -= 1;
        }
        status.truncate(end);

        self.status = status;
        self.draw_bar(self.sel_mon);
    }

    /// Re-read a client's title
    pub(crate) fn update_title(&mut self, window: Window) {
        let atoms = *self.x.atoms();
        let title = self
            .x
            .text_prop(window, atoms._NET_WM_NAME)
            .or_else(|| self.x.text_prop(window, atoms.WM_NAME))
            .unwrap_or_default();

        if let Some(c) = self.clients.get_mut(&window) {
            c.set_title(&title);
        }
    }

    // ===================== Geometry reconciler ==================

    /// Synchronize the monitor list with the Xinerama screen set. Returns
    /// whether anything changed; the selection follows the pointer then.
    pub(crate) fn update_geometry(&mut self) -> Result<bool> {
        let screens = match self.x.xinerama_screens()? {
            Some(screens) => dedup_screens(screens),
            None => vec![Rectangle::new(
                0,
                0,
                self.display.width,
                self.display.height,
            )],
        };
        if screens.is_empty() {
            return Err(crate::error::Error::NoMonitors(self.x.screen()).into());
        }

        let dirty = reconcile_monitors(
            &mut self.monitors,
            &mut self.clients,
            &screens,
            &self.config,
            self.bar_h,
        );

        if self.sel_mon >= self.monitors.len() {
            self.sel_mon = 0;
        }
        if dirty {
            self.sel_mon = 0;
            if let Some(p) = self.x.query_pointer() {
                self.sel_mon = self.point_to_monitor(p);
            }
        }

        Ok(dirty)
    }

    // ======================== Consistency =======================

    /// Debug-build check of the model invariants, run after every event:
    /// each client sits in exactly one view's list and stack, a view's
    /// selection heads its stack, mfact stays in range, fixed implies
    /// floating, fullscreen implies floating and no border.
    #[cfg(debug_assertions)]
    pub(crate) fn assert_consistent(&self) {
        use crate::view::{MFACT_MAX, MFACT_MIN};

        for (&window, c) in &self.clients {
            assert!(c.mon < self.monitors.len(), "client {window} on a dead monitor");
            let mut list_seen = 0;
            let mut stack_seen = 0;
            for m in &self.monitors {
                for v in &m.views {
                    list_seen += v.clients.iter().filter(|&&w| w == window).count();
                    stack_seen += v.stack.iter().filter(|&&w| w == window).count();
                }
            }
            assert_eq!(list_seen, 1, "client {window} is listed {list_seen} times");
            assert_eq!(stack_seen, 1, "client {window} is stacked {stack_seen} times");
            assert!(
                self.monitors[c.mon].views[c.view].contains(window),
                "client {window} is not where it claims to be"
            );
            if c.flags.contains(ClientFlags::FIXED) {
                assert!(c.is_floating(), "fixed client {window} is not floating");
            }
            if c.is_fullscreen() {
                assert!(c.is_floating(), "fullscreen client {window} is not floating");
                assert_eq!(c.bw, 0, "fullscreen client {window} kept its border");
            }
        }

        for m in &self.monitors {
            for v in &m.views {
                assert!((MFACT_MIN..=MFACT_MAX).contains(&v.mfact));
                if let Some(sel) = v.sel {
                    // a selection pointing outside the view occurs while a
                    // client migrates; inside the view it must at least be
                    // on the focus stack
                    assert!(
                        v.stack.contains(&sel) || !v.contains(sel),
                        "view selection fell off its focus stack"
                    );
                }
            }
        }
    }

    // ========================== Spawning ========================

    /// Fork off a child in its own session, the X connection not inherited
    /// in any meaningful state
    pub(crate) fn spawn(&self, argv: &[String]) {
        let Some((program, args)) = argv.split_first() else {
            return;
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        unsafe {
            cmd.pre_exec(|| {
                let _ignore = nix::unistd::setsid();
                Ok(())
            });
        }

        match cmd.spawn() {
            Ok(child) => log::debug!("spawned {} as pid {}", program, child.id()),
            Err(e) => log::warn!("failed to spawn {}: {}", program, e),
        }
    }
}

/// Map a configured [`Button`] to the wire grab index
fn button_index(button: Button) -> ButtonIndex {
    match button {
        Button::Left => ButtonIndex::M1,
        Button::Middle => ButtonIndex::M2,
        Button::Right => ButtonIndex::M3,
        Button::ScrollUp => ButtonIndex::M4,
        Button::ScrollDown => ButtonIndex::M5,
    }
}

/// Only exact duplicate geometries count as the same screen
fn dedup_screens(screens: Vec<Rectangle>) -> Vec<Rectangle> {
    let mut unique: Vec<Rectangle> = Vec::with_capacity(screens.len());
    for s in screens {
        if !unique.contains(&s) {
            unique.push(s);
        }
    }
    unique
}

/// Bring the monitor list in line with the deduplicated screen list.
///
/// Growing appends fresh monitors; every surviving monitor whose geometry
/// changed is updated in place. Shrinking migrates the clients of removed
/// monitors onto monitor 0, preserving their view index, before the tail
/// is dropped.
fn reconcile_monitors(
    monitors: &mut Vec<Monitor>,
    clients: &mut HashMap<Window, Client>,
    screens: &[Rectangle],
    config: &Config,
    bar_h: u32,
) -> bool {
    let mut dirty = false;
    let old = monitors.len();
    let new = screens.len();

    if new >= old {
        for num in old..new {
            monitors.push(Monitor::new(
                num,
                config.mfact,
                0,
                LAYOUTS[0].symbol,
                config.show_bar,
                config.top_bar,
            ));
        }
        for (m, &screen) in monitors.iter_mut().zip(screens) {
            if m.screen != screen {
                dirty = true;
                m.set_screen(screen, bar_h);
            }
        }
    } else {
        for removed in new..old {
            for view in 0..NUM_VIEWS {
                let windows = std::mem::take(&mut monitors[removed].views[view].clients);
                monitors[removed].views[view].stack.clear();
                monitors[removed].views[view].sel = None;

                for window in windows {
                    dirty = true;
                    if let Some(c) = clients.get_mut(&window) {
                        c.mon = 0;
                    }
                    monitors[0].views[view].attach(window);
                    monitors[0].views[view].attach_stack(window);
                }
            }
        }
        monitors.truncate(new);
        for (m, &screen) in monitors.iter_mut().zip(screens) {
            if m.screen != screen {
                dirty = true;
                m.set_screen(screen, bar_h);
            }
        }
    }

    dirty
}

#[cfg(test)]
mod tests {
    use super::{dedup_screens, reconcile_monitors};
    use crate::{
        client::Client,
        config::Config,
        geometry::Rectangle,
        monitor::{Monitor, NUM_VIEWS},
    };
    use std::collections::HashMap;

    const BAR_H: u32 = 14;

    fn monitor(num: usize, screen: Rectangle) -> Monitor {
        let mut m = Monitor::new(num, 0.5, 0, "[M]", true, true);
        m.set_screen(screen, BAR_H);
        m
    }

    #[test]
    fn duplicate_screen_geometries_collapse() {
        let screens = vec![
            Rectangle::new(0, 0, 1920, 1080),
            Rectangle::new(0, 0, 1920, 1080),
            Rectangle::new(1920, 0, 1280, 1024),
        ];

        assert_eq!(dedup_screens(screens).len(), 2);
    }

    #[test]
    fn growing_appends_monitors_with_fresh_views() {
        let mut monitors = vec![monitor(0, Rectangle::new(0, 0, 1920, 1080))];
        let mut clients = HashMap::new();
        let screens = [
            Rectangle::new(0, 0, 1920, 1080),
            Rectangle::new(1920, 0, 1280, 1024),
        ];

        let dirty = reconcile_monitors(
            &mut monitors,
            &mut clients,
            &screens,
            &Config::default(),
            BAR_H,
        );

        assert!(dirty);
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[1].screen, screens[1]);
        assert!(monitors[1].views.iter().all(|v| v.clients.is_empty()));
    }

    #[test]
    fn unchanged_screens_are_not_dirty() {
        let screen = Rectangle::new(0, 0, 1920, 1080);
        let mut monitors = vec![monitor(0, screen)];
        let mut clients = HashMap::new();

        let dirty =
            reconcile_monitors(&mut monitors, &mut clients, &[screen], &Config::default(), BAR_H);

        assert!(!dirty);
    }

    #[test]
    fn shrinking_migrates_clients_to_monitor_zero_preserving_views() {
        let mut monitors = vec![
            monitor(0, Rectangle::new(0, 0, 1920, 1080)),
            monitor(1, Rectangle::new(1920, 0, 1280, 1024)),
        ];
        let mut clients = HashMap::new();

        // two clients on monitor 1, views 2 and 5
        for (window, view) in [(10, 2), (11, 5)] {
            clients.insert(
                window,
                Client::new(window, Rectangle::new(0, 0, 100, 100), 1, 1, view),
            );
            monitors[1].views[view].attach(window);
            monitors[1].views[view].attach_stack(window);
        }

        let screens = [Rectangle::new(0, 0, 1920, 1080)];
        let dirty = reconcile_monitors(
            &mut monitors,
            &mut clients,
            &screens,
            &Config::default(),
            BAR_H,
        );

        assert!(dirty);
        assert_eq!(monitors.len(), 1);
        assert_eq!(clients[&10].mon, 0);
        assert_eq!(clients[&11].mon, 0);
        assert!(monitors[0].views[2].contains(10));
        assert!(monitors[0].views[5].contains(11));
        // membership is exactly one view per client
        let total: usize = (0..NUM_VIEWS).map(|v| monitors[0].views[v].clients.len()).sum();
        assert_eq!(total, 2);
    }
}
