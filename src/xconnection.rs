//! Interacting directly with the X11 server
//!
//! Everything the engine asks of X goes through [`XConn`]; no other module
//! speaks the wire protocol. Requests that may race against dying windows
//! are issued unchecked here and their asynchronous errors are filtered by
//! [`is_benign_error`] at the event loop.

use crate::{
    error::Error,
    geometry::{Dimension, Point, Rectangle},
};
use anyhow::{Context, Result};
use x11rb::{
    atom_manager,
    connection::Connection,
    cursor::Handle as CursorHandle,
    errors::ReplyError,
    properties,
    protocol::{
        xinerama::ConnectionExt as _,
        xproto::{
            self, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            CloseDown, ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt, CreateWindowAux,
            Cursor, EventMask, GrabMode, GrabStatus, InputFocus, MapState, ModMask, PropMode,
            StackMode, Window, CONFIGURE_NOTIFY_EVENT,
        },
        ErrorKind, Event,
    },
    resource_manager::{self, Database},
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    CURRENT_TIME, NONE,
};

use crate::input::keysym::XK_NUM_LOCK;

// =============================== Atoms ==============================

atom_manager! {
    /// The atoms interned once at startup
    pub(crate) Atoms: AtomsCookie {
        UTF8_STRING,

        // ==== ICCCM ====
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_STATE,
        WM_HINTS,
        WM_NAME,

        // ==== EWMH ====
        _NET_SUPPORTED,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
    }
}

// ============================== WmState =============================

/// Values of the `WM_STATE` property set on every managed client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WmState {
    /// Not visible to the user in any form
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window's icon is visible
    Iconic,
}

impl From<WmState> for u32 {
    fn from(s: WmState) -> Self {
        match s {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

// ============================== Cursors =============================

/// The pointer shapes the engine switches between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorKind {
    /// The idle pointer
    Normal,
    /// Shown while a resize drag is active
    Resize,
    /// Shown while a move drag is active
    Move,
}

/// The loaded cursor handles
#[derive(Debug, Clone, Copy)]
struct Cursors {
    normal: Cursor,
    resize: Cursor,
    move_:  Cursor,
}

// ============================ Keyboard ==============================

/// Cached keycode-to-keysym table, refreshed on `MappingNotify`
#[derive(Debug, Default)]
struct Keyboard {
    min_keycode:         u8,
    keysyms_per_keycode: u8,
    keysyms:             Vec<u32>,
}

impl Keyboard {
    /// The keysym in the first column for a keycode
    fn keysym(&self, keycode: u8) -> u32 {
        if keycode < self.min_keycode {
            return 0;
        }
        let idx = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode as usize;
        self.keysyms.get(idx).copied().unwrap_or(0)
    }

    /// Every keycode producing the given keysym in its first column
    fn keycodes(&self, keysym: u32) -> Vec<u8> {
        let per = self.keysyms_per_keycode.max(1) as usize;
        self.keysyms
            .chunks(per)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .map(|(i, _)| self.min_keycode + i as u8)
            .collect()
    }
}

// =============================== XConn ==============================

/// The connection to the X-Server and the state cached off it
pub(crate) struct XConn {
    /// The actual [`Connection`](RustConnection)
    conn:     RustConnection,
    /// Screen number the connection is attached to
    screen:   usize,
    /// The root window of that screen
    root:     Window,
    /// The [`Atoms`] of the connection
    atoms:    Atoms,
    /// Loaded pointer shapes
    cursors:  Cursors,
    /// Cached keyboard mapping
    keyboard: Keyboard,
}

impl XConn {
    /// Setup the X11 [`Connection`](RustConnection)
    pub(crate) fn connect() -> Result<(RustConnection, usize), Error> {
        RustConnection::connect(None).map_err(Error::Connection)
    }

    /// Wrap a fresh connection: intern atoms, load cursors, and cache the
    /// keyboard mapping
    pub(crate) fn new(conn: RustConnection, screen: usize) -> Result<Self> {
        let root = conn.setup().roots[screen].root;

        log::debug!("interning atoms");
        let atoms = Atoms::new(&conn)
            .context("failed to request `Atoms`")?
            .reply()
            .context("failed to intern `Atoms`")?;

        let database = resource_manager::new_from_default(&conn)
            .context("failed to open the resource database")?;
        let cursors = Self::load_cursors(&conn, screen, &database)?;

        let mut xconn = Self {
            conn,
            screen,
            root,
            atoms,
            cursors,
            keyboard: Keyboard::default(),
        };
        xconn.refresh_keyboard_mapping()?;

        Ok(xconn)
    }

    /// Load the pointer shapes used by the engine
    fn load_cursors(conn: &RustConnection, screen: usize, db: &Database) -> Result<Cursors> {
        let handle = CursorHandle::new(conn, screen, db)
            .context("failed to request a cursor handle")?
            .reply()
            .context("failed to get a cursor handle")?;

        Ok(Cursors {
            normal: handle
                .load_cursor(conn, "left_ptr")
                .context("failed to load the `left_ptr` cursor")?,
            resize: handle
                .load_cursor(conn, "sizing")
                .context("failed to load the `sizing` cursor")?,
            move_:  handle
                .load_cursor(conn, "fleur")
                .context("failed to load the `fleur` cursor")?,
        })
    }

    // ========================= Accessor =========================

    /// Return the `root` window
    pub(crate) const fn root(&self) -> Window {
        self.root
    }

    /// Return the screen number the connection is attached to
    pub(crate) const fn screen(&self) -> usize {
        self.screen
    }

    /// Return the interned [`Atoms`]
    pub(crate) const fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    /// Width and height of the whole display
    pub(crate) fn display_size(&self) -> Dimension {
        let screen = &self.conn.setup().roots[self.screen];
        Dimension::new(screen.width_in_pixels.into(), screen.height_in_pixels.into())
    }

    /// The loaded cursor of the given kind
    pub(crate) const fn cursor(&self, kind: CursorKind) -> Cursor {
        match kind {
            CursorKind::Normal => self.cursors.normal,
            CursorKind::Resize => self.cursors.resize,
            CursorKind::Move => self.cursors.move_,
        }
    }

    // ====================== Window Manager ======================

    /// Make an attempt to become the window manager. Exactly one client may
    /// select `SubstructureRedirect` on the root; a `BadAccess` reply means
    /// the slot is taken.
    pub(crate) fn become_wm(&self) -> Result<()> {
        log::debug!("attempting to become the window manager");
        let res = self
            .conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new()
                    .event_mask(EventMask::SUBSTRUCTURE_REDIRECT),
            )
            .context("failed to select SubstructureRedirect")?
            .check();

        match res {
            Err(ReplyError::X11Error(ref e)) if e.error_kind == ErrorKind::Access => {
                Err(Error::OtherWm.into())
            },
            other => other.context("failed to check SubstructureRedirect selection"),
        }
    }

    /// Select the root event mask the dispatcher relies on and install the
    /// normal cursor
    pub(crate) fn init_root(&self) -> Result<()> {
        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new()
                    .event_mask(
                        EventMask::SUBSTRUCTURE_REDIRECT
                            | EventMask::SUBSTRUCTURE_NOTIFY
                            | EventMask::BUTTON_PRESS
                            | EventMask::ENTER_WINDOW
                            | EventMask::LEAVE_WINDOW
                            | EventMask::STRUCTURE_NOTIFY
                            | EventMask::PROPERTY_CHANGE,
                    )
                    .cursor(self.cursors.normal),
            )
            .context("failed to select the root event mask")?
            .check()
            .context("failed to check the root event mask")?;

        Ok(())
    }

    /// Advertise the supported `_NET_*` atoms on the root
    pub(crate) fn advertise_support(&self) -> Result<()> {
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.root,
                self.atoms._NET_SUPPORTED,
                AtomEnum::ATOM,
                &[
                    self.atoms._NET_SUPPORTED,
                    self.atoms._NET_WM_NAME,
                    self.atoms._NET_WM_STATE,
                    self.atoms._NET_WM_STATE_FULLSCREEN,
                ],
            )
            .context("failed to replace `_NET_SUPPORTED`")?
            .check()
            .context("failed to check replacing `_NET_SUPPORTED`")?;

        Ok(())
    }

    // ======================= Base Wrappers ======================

    /// Flush all pending requests to the X-Server
    pub(crate) fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            log::warn!("failed to flush requests to the X-server: {e}");
        }
    }

    /// Flush and wait until the server has processed everything sent so far
    pub(crate) fn sync(&self) {
        if let Err(e) = self.conn.sync() {
            log::warn!("failed to sync with the X-server: {e}");
        }
    }

    /// Block until the next event
    pub(crate) fn wait_for_event(&self) -> Result<Event> {
        self.conn
            .wait_for_event()
            .context("failed to wait for the next event")
    }

    /// Return the next event if one is already queued
    pub(crate) fn poll_for_event(&self) -> Option<Event> {
        self.conn
            .poll_for_event()
            .context("failed to poll for an event")
            .ok()?
    }

    // ========================== Queries =========================

    /// Children of the given window, bottom to top
    pub(crate) fn query_tree_children(&self, window: Window) -> Result<Vec<Window>> {
        Ok(self
            .conn
            .query_tree(window)
            .context("failed to request the window tree")?
            .reply()
            .context("failed to get the window tree")?
            .children)
    }

    /// A window's attributes, if it still exists
    pub(crate) fn window_attributes(
        &self,
        window: Window,
    ) -> Option<xproto::GetWindowAttributesReply> {
        self.conn
            .get_window_attributes(window)
            .ok()?
            .reply()
            .ok()
    }

    /// A window's geometry, if it still exists
    pub(crate) fn window_geometry(&self, window: Window) -> Option<Rectangle> {
        let geom = self.conn.get_geometry(window).ok()?.reply().ok()?;
        Some(Rectangle::new(
            geom.x.into(),
            geom.y.into(),
            geom.width.into(),
            geom.height.into(),
        ))
    }

    /// Border width a window asked for before it was managed
    pub(crate) fn window_border_width(&self, window: Window) -> u32 {
        self.conn
            .get_geometry(window)
            .ok()
            .and_then(|c| c.reply().ok())
            .map_or(0, |g| g.border_width.into())
    }

    /// Is the window override-redirect, and is it viewable?
    pub(crate) fn window_is_viewable(&self, window: Window) -> bool {
        self.window_attributes(window)
            .map_or(false, |a| a.map_state == MapState::VIEWABLE)
    }

    /// The window named by `WM_TRANSIENT_FOR`, if any
    pub(crate) fn transient_for(&self, window: Window) -> Option<Window> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                AtomEnum::WM_TRANSIENT_FOR,
                AtomEnum::WINDOW,
                0,
                1,
            )
            .ok()?
            .reply()
            .ok()?;

        reply.value32().and_then(|mut v| v.next()).filter(|&w| w != NONE)
    }

    /// Read a text property as UTF-8, best effort
    pub(crate) fn text_prop(&self, window: Window, atom: xproto::Atom) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
            .ok()?
            .reply()
            .ok()?;

        if reply.value.is_empty() {
            return None;
        }

        Some(String::from_utf8_lossy(&reply.value).into_owned())
    }

    /// A window's `WM_NORMAL_HINTS`
    pub(crate) fn normal_hints(&self, window: Window) -> Option<properties::WmSizeHints> {
        properties::WmSizeHints::get_normal_hints(&self.conn, window)
            .ok()?
            .reply()
            .ok()?
    }

    /// A window's `WM_HINTS`
    pub(crate) fn wm_hints(&self, window: Window) -> Option<properties::WmHints> {
        properties::WmHints::get(&self.conn, window).ok()?.reply().ok()?
    }

    /// Clear the urgency bit inside a window's `WM_HINTS`, leaving the rest
    /// of the property untouched
    pub(crate) fn clear_urgency(&self, window: Window) {
        /// `XUrgencyHint` flag bit inside `WM_HINTS`
        const URGENCY: u32 = 1 << 8;

        let Ok(Ok(reply)) = self
            .conn
            .get_property(false, window, self.atoms.WM_HINTS, self.atoms.WM_HINTS, 0, 9)
            .map(|c| c.reply())
        else {
            return;
        };

        let Some(mut hints) = reply.value32().map(|v| v.collect::<Vec<_>>()) else {
            return;
        };
        if hints.is_empty() {
            return;
        }

        hints[0] &= !URGENCY;
        let _ignore = self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.WM_HINTS,
            self.atoms.WM_HINTS,
            &hints,
        );
    }

    /// The first word of a window's `WM_STATE` property
    pub(crate) fn wm_state(&self, window: Window) -> Option<u32> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.WM_STATE,
                self.atoms.WM_STATE,
                0,
                2,
            )
            .ok()?
            .reply()
            .ok()?;

        reply.value32().and_then(|mut v| v.next())
    }

    /// Write a window's `WM_STATE` property
    pub(crate) fn set_wm_state(&self, window: Window, state: WmState) {
        let _ignore = self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[state.into(), NONE],
        );
    }

    /// Write or clear the `_NET_WM_STATE` fullscreen marker
    pub(crate) fn set_net_fullscreen(&self, window: Window, fullscreen: bool) {
        let state: &[u32] = if fullscreen {
            &[self.atoms._NET_WM_STATE_FULLSCREEN]
        } else {
            &[]
        };
        let _ignore = self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_STATE,
            AtomEnum::ATOM,
            state,
        );
    }

    /// Check whether the window advertises `WM_DELETE_WINDOW`
    pub(crate) fn supports_delete(&self, window: Window) -> bool {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_PROTOCOLS,
                AtomEnum::ATOM,
                0,
                u32::MAX,
            )
            .map_or(false, |cookie| {
                cookie.reply().map_or(false, |reply| {
                    reply.value32().map_or(false, |mut protocols| {
                        protocols.any(|p| p == self.atoms.WM_DELETE_WINDOW)
                    })
                })
            })
    }

    /// Ask the window to close itself via `WM_DELETE_WINDOW`
    pub(crate) fn send_delete(&self, window: Window) -> Result<()> {
        let data = [self.atoms.WM_DELETE_WINDOW, CURRENT_TIME, 0, 0, 0];
        let event = ClientMessageEvent::new(32, window, self.atoms.WM_PROTOCOLS, data);

        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)
            .with_context(|| format!("failed to send WM_DELETE_WINDOW to {window}"))?;
        self.flush();

        Ok(())
    }

    /// Force-kill a client that does not speak `WM_DELETE_WINDOW`
    pub(crate) fn kill_client_force(&self, window: Window) {
        let _server = self.grab_server();
        let _ignore = self.conn.set_close_down_mode(CloseDown::DESTROY_ALL);
        let _ignore = self.conn.kill_client(window);
        self.sync();
    }

    // ========================== Actions =========================

    /// Push a configure to the server
    pub(crate) fn configure(&self, window: Window, aux: &ConfigureWindowAux) {
        let _ignore = self.conn.configure_window(window, aux);
    }

    /// Move and resize in one request, accounting for the border
    pub(crate) fn move_resize(&self, window: Window, rect: Rectangle, bw: u32) {
        self.configure(window, &rect.to_aux(bw));
    }

    /// Move without touching the size
    pub(crate) fn move_window(&self, window: Window, point: Point) {
        self.configure(window, &ConfigureWindowAux::new().x(point.x).y(point.y));
    }

    /// Raise the window to the top of the stacking order
    pub(crate) fn raise_window(&self, window: Window) {
        self.configure(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        );
    }

    /// Map a window, making it visible
    pub(crate) fn map_window(&self, window: Window) {
        let _ignore = self.conn.map_window(window);
    }

    /// Select the events a managed client must report
    pub(crate) fn select_client_events(&self, window: Window) {
        let _ignore = self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(
                EventMask::ENTER_WINDOW
                    | EventMask::FOCUS_CHANGE
                    | EventMask::PROPERTY_CHANGE
                    | EventMask::STRUCTURE_NOTIFY,
            ),
        );
    }

    /// Color a window's border
    pub(crate) fn set_border_color(&self, window: Window, pixel: u32) {
        let _ignore = self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(pixel),
        );
    }

    /// Set a window's border width
    pub(crate) fn set_border_width(&self, window: Window, width: u32) {
        self.configure(window, &ConfigureWindowAux::new().border_width(width));
    }

    /// Hand the X input focus to a window
    pub(crate) fn focus_window(&self, window: Window) {
        let _ignore =
            self.conn
                .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME);
    }

    /// Park the X input focus on the root
    pub(crate) fn focus_root(&self) {
        self.focus_window(self.root);
    }

    /// Send a synthetic `ConfigureNotify` describing the client's current
    /// geometry; this is how a tiled client's configure request is refused
    pub(crate) fn send_configure_notify(&self, window: Window, rect: Rectangle, bw: u32) {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: rect.x() as i16,
            y: rect.y() as i16,
            width: rect.w() as u16,
            height: rect.h() as u16,
            border_width: bw as u16,
            override_redirect: false,
        };

        let _ignore = self
            .conn
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event);
    }

    /// Create the bar window for a monitor
    pub(crate) fn create_bar_window(&self, rect: Rectangle, bar_h: u32) -> Result<Window> {
        let window = self
            .conn
            .generate_id()
            .context("failed to generate an ID for the bar")?;

        self.conn
            .create_window(
                x11rb::COPY_DEPTH_FROM_PARENT,
                window,
                self.root,
                rect.x() as i16,
                rect.y() as i16,
                rect.w() as u16,
                bar_h as u16,
                0,
                xproto::WindowClass::INPUT_OUTPUT,
                x11rb::COPY_FROM_PARENT,
                &CreateWindowAux::new()
                    .override_redirect(1)
                    .background_pixmap(xproto::BackPixmap::PARENT_RELATIVE)
                    .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE)
                    .cursor(self.cursors.normal),
            )
            .with_context(|| format!("failed to create bar window {window}"))?
            .check()
            .with_context(|| format!("failed to check creating bar window {window}"))?;

        self.map_window(window);
        self.raise_window(window);

        Ok(window)
    }

    /// Unmap and destroy a bar window
    pub(crate) fn destroy_window(&self, window: Window) {
        let _ignore = self.conn.unmap_window(window);
        let _ignore = self.conn.destroy_window(window);
    }

    // ======================== Grab / Ungrab =====================

    /// Grab the server for a destructive sequence; released when the guard
    /// drops
    pub(crate) fn grab_server(&self) -> ServerGrab<'_> {
        let _ignore = self.conn.grab_server();
        ServerGrab { conn: self }
    }

    /// Passively grab one button + modifier combination on a window
    pub(crate) fn grab_button(&self, window: Window, button: ButtonIndex, modifiers: u16) {
        let _ignore = xproto::grab_button(
            &self.conn,
            false,
            window,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
            GrabMode::ASYNC,
            GrabMode::SYNC,
            NONE,
            NONE,
            button,
            ModMask::from(modifiers),
        );
    }

    /// Release every button grab held on a window
    pub(crate) fn ungrab_buttons(&self, window: Window) {
        let _ignore = xproto::ungrab_button(&self.conn, ButtonIndex::ANY, window, ModMask::ANY);
    }

    /// Passively grab one key + modifier combination on the root
    pub(crate) fn grab_key(&self, keycode: u8, modifiers: u16) {
        let _ignore = xproto::grab_key(
            &self.conn,
            true,
            self.root,
            ModMask::from(modifiers),
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        );
    }

    /// Release every key grab held on the root
    pub(crate) fn ungrab_keys(&self) {
        let _ignore =
            xproto::ungrab_key(&self.conn, xproto::Grab::ANY, self.root, ModMask::ANY);
    }

    /// Actively grab the pointer with the given cursor. The drag state
    /// machine holds this across events; [`Self::ungrab_pointer`] must be
    /// called on every path that ends the drag.
    pub(crate) fn grab_pointer(&self, cursor: CursorKind) -> bool {
        xproto::grab_pointer(
            &self.conn,
            false,
            self.root,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            NONE,
            self.cursor(cursor),
            CURRENT_TIME,
        )
        .ok()
        .and_then(|c| c.reply().ok())
        .map_or(false, |r| r.status == GrabStatus::SUCCESS)
    }

    /// Release the pointer grab taken for a drag
    pub(crate) fn ungrab_pointer(&self) {
        let _ignore = xproto::ungrab_pointer(&self.conn, CURRENT_TIME);
    }

    /// Warp the pointer to a coordinate inside the window
    pub(crate) fn warp_pointer(&self, window: Window, x: i16, y: i16) {
        let _ignore = xproto::warp_pointer(&self.conn, NONE, window, 0, 0, 0, 0, x, y);
    }

    /// Where the pointer currently is, in root coordinates
    pub(crate) fn query_pointer(&self) -> Option<Point> {
        let reply = self.conn.query_pointer(self.root).ok()?.reply().ok()?;
        Some(Point::new(reply.root_x.into(), reply.root_y.into()))
    }

    // ========================= Keyboard =========================

    /// Re-fetch the keycode-to-keysym table
    pub(crate) fn refresh_keyboard_mapping(&mut self) -> Result<()> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);

        let reply = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)
            .context("failed to request the keyboard mapping")?
            .reply()
            .context("failed to get the keyboard mapping")?;

        self.keyboard = Keyboard {
            min_keycode:         min,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms:             reply.keysyms,
        };

        Ok(())
    }

    /// The keysym a keycode produces with no modifiers
    pub(crate) fn keycode_to_keysym(&self, keycode: u8) -> u32 {
        self.keyboard.keysym(keycode)
    }

    /// Every keycode that produces the given keysym
    pub(crate) fn keysym_to_keycodes(&self, keysym: u32) -> Vec<u8> {
        self.keyboard.keycodes(keysym)
    }

    /// Which modifier bit num-lock currently lives on
    pub(crate) fn numlock_mask(&self) -> u16 {
        let Ok(Ok(reply)) = self.conn.get_modifier_mapping().map(|c| c.reply()) else {
            return 0;
        };

        let per = reply.keycodes_per_modifier() as usize;
        if per == 0 {
            return 0;
        }

        for (modifier, codes) in reply.keycodes.chunks(per).enumerate() {
            if codes
                .iter()
                .any(|&code| code != 0 && self.keyboard.keysym(code) == XK_NUM_LOCK)
            {
                return 1 << modifier;
            }
        }

        0
    }

    // ========================= Monitors =========================

    /// The Xinerama screen list, or `None` when the extension is inactive
    pub(crate) fn xinerama_screens(&self) -> Result<Option<Vec<Rectangle>>> {
        let active = self
            .conn
            .xinerama_is_active()
            .context("failed to request Xinerama state")?
            .reply()
            .context("failed to query Xinerama state")?
            .state;
        if active == 0 {
            return Ok(None);
        }

        let screens = self
            .conn
            .xinerama_query_screens()
            .context("failed to request Xinerama screens")?
            .reply()
            .context("failed to query Xinerama screens")?
            .screen_info
            .iter()
            .map(|info| {
                Rectangle::new(
                    info.x_org.into(),
                    info.y_org.into(),
                    info.width.into(),
                    info.height.into(),
                )
            })
            .collect();

        Ok(Some(screens))
    }
}

// ============================== Guards ==============================

/// Balances a server grab on every exit path
pub(crate) struct ServerGrab<'a> {
    conn: &'a XConn,
}

impl Drop for ServerGrab<'_> {
    fn drop(&mut self) {
        let _ignore = self.conn.conn.ungrab_server();
        self.conn.flush();
    }
}

// =========================== Error filter ===========================

/// Is this one of the errors expected when racing a disappearing window?
pub(crate) fn is_benign_error(err: &x11rb::x11_utils::X11Error) -> bool {
    is_benign(err.error_kind, err.major_opcode)
}

/// `BadWindow` can happen anywhere; the rest of the whitelist is
/// (request, error) pairs that only ever fire against windows that died
/// between our request and the server processing it.
fn is_benign(kind: ErrorKind, major_opcode: u8) -> bool {
    use xproto::{
        CONFIGURE_WINDOW_REQUEST, COPY_AREA_REQUEST, GRAB_BUTTON_REQUEST, GRAB_KEY_REQUEST,
        POLY_FILL_RECTANGLE_REQUEST, POLY_SEGMENT_REQUEST, POLY_TEXT8_REQUEST,
        SET_INPUT_FOCUS_REQUEST,
    };

    match (kind, major_opcode) {
        (ErrorKind::Window, _) => true,
        (ErrorKind::Match, SET_INPUT_FOCUS_REQUEST | CONFIGURE_WINDOW_REQUEST) => true,
        (
            ErrorKind::Drawable,
            POLY_TEXT8_REQUEST
            | POLY_FILL_RECTANGLE_REQUEST
            | POLY_SEGMENT_REQUEST
            | COPY_AREA_REQUEST,
        ) => true,
        (ErrorKind::Access, GRAB_BUTTON_REQUEST | GRAB_KEY_REQUEST) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_benign, Keyboard, WmState};
    use x11rb::protocol::{
        xproto::{
            CONFIGURE_WINDOW_REQUEST, GET_GEOMETRY_REQUEST, GRAB_BUTTON_REQUEST,
            SET_INPUT_FOCUS_REQUEST,
        },
        ErrorKind,
    };

    #[test]
    fn destroyed_window_races_are_whitelisted() {
        assert!(is_benign(ErrorKind::Window, GET_GEOMETRY_REQUEST));
        assert!(is_benign(ErrorKind::Match, SET_INPUT_FOCUS_REQUEST));
        assert!(is_benign(ErrorKind::Match, CONFIGURE_WINDOW_REQUEST));
        assert!(is_benign(ErrorKind::Access, GRAB_BUTTON_REQUEST));
    }

    #[test]
    fn other_errors_are_not_swallowed() {
        assert!(!is_benign(ErrorKind::Access, SET_INPUT_FOCUS_REQUEST));
        assert!(!is_benign(ErrorKind::Match, GET_GEOMETRY_REQUEST));
    }

    #[test]
    fn wm_state_wire_values_follow_icccm() {
        assert_eq!(u32::from(WmState::Withdrawn), 0);
        assert_eq!(u32::from(WmState::Normal), 1);
        assert_eq!(u32::from(WmState::Iconic), 3);
    }

    #[test]
    fn keyboard_mapping_is_indexed_by_keycode() {
        let kb = Keyboard {
            min_keycode:         8,
            keysyms_per_keycode: 2,
            keysyms:             vec![0x61, 0x41, 0x62, 0x42, 0x63, 0x43],
        };

        assert_eq!(kb.keysym(8), 0x61);
        assert_eq!(kb.keysym(10), 0x63);
        assert_eq!(kb.keysym(7), 0);
        assert_eq!(kb.keycodes(0x62), vec![9]);
        assert!(kb.keycodes(0x7a).is_empty());
    }
}
