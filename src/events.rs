//! The X event dispatch state machine
//!
//! One blocking read per iteration; handlers run to completion. While a
//! pointer drag is active the same loop accepts only the drag whitelist,
//! which keeps the "only these events during a drag" rule declarative
//! instead of buried in a nested pump.

use crate::{
    bar,
    client::{Client, ClientFlags, SizeHints},
    geometry::Rectangle,
    input::{clean_mask, mods_mask, Action, ClickRegion},
    layout::LAYOUTS,
    view::{MFACT_MAX, MFACT_MIN},
    wm::{Drag, DragKind, WindowManager},
    xconnection::{is_benign_error, CursorKind},
};
use anyhow::Result;
use x11rb::protocol::{
    xproto::{
        AtomEnum, ButtonPressEvent, ButtonReleaseEvent, ClientMessageEvent, ConfigWindow,
        ConfigureNotifyEvent, ConfigureRequestEvent, ConfigureWindowAux, EnterNotifyEvent,
        ExposeEvent, FocusInEvent, KeyPressEvent, Mapping, MappingNotifyEvent, MapRequestEvent,
        MotionNotifyEvent, NotifyDetail, NotifyMode, PropertyNotifyEvent, UnmapNotifyEvent,
    },
    Event,
};

impl WindowManager {
    /// The main event loop: manage what already exists, then dispatch
    /// until the quit binding fires
    pub(crate) fn run(&mut self) -> Result<()> {
        self.scan()?;
        self.x.flush();
        self.running = true;

        while self.running {
            let event = match self.pending.pop_front() {
                Some(event) => event,
                None => self.x.wait_for_event()?,
            };
            self.handle_event(event);
            #[cfg(debug_assertions)]
            self.assert_consistent();
            self.x.flush();
        }

        Ok(())
    }

    /// Route one event, honoring the drag whitelist while a drag runs
    fn handle_event(&mut self, event: Event) {
        log::trace!("event: {event:?}");

        if self.drag.is_some() {
            match event {
                Event::MotionNotify(e) => self.drag_motion(&e),
                Event::ButtonRelease(e) => self.drag_release(&e),
                Event::ConfigureRequest(e) => self.handle_configure_request(&e),
                Event::Expose(e) => self.handle_expose(&e),
                Event::MapRequest(e) => self.handle_map_request(&e),
                Event::Error(e) if !is_benign_error(&e) => {
                    log::error!("X error during drag: {e:?}");
                },
                _ => (),
            }
            return;
        }

        match event {
            Event::ButtonPress(e) => self.handle_button_press(&e),
            Event::ClientMessage(e) => self.handle_client_message(&e),
            Event::ConfigureRequest(e) => self.handle_configure_request(&e),
            Event::ConfigureNotify(e) => self.handle_configure_notify(&e),
            Event::DestroyNotify(e) => self.unmanage(e.window, true),
            Event::EnterNotify(e) => self.handle_enter_notify(&e),
            Event::Expose(e) => self.handle_expose(&e),
            Event::FocusIn(e) => self.handle_focus_in(&e),
            Event::KeyPress(e) => self.handle_key_press(&e),
            Event::MappingNotify(e) => self.handle_mapping_notify(&e),
            Event::MapRequest(e) => self.handle_map_request(&e),
            Event::PropertyNotify(e) => self.handle_property_notify(&e),
            Event::UnmapNotify(e) => self.handle_unmap_notify(&e),
            Event::Error(e) => {
                if is_benign_error(&e) {
                    log::debug!("ignoring benign X error: {e:?}");
                } else {
                    log::error!("X error: {e:?}");
                }
            },
            // everything else is noise to this engine
            _ => (),
        }
    }

    // ========================== Handlers ========================

    /// Manage on `MapRequest` unless the window opted out or is known
    fn handle_map_request(&mut self, event: &MapRequestEvent) {
        let window = event.window;
        let Some(attrs) = self.x.window_attributes(window) else {
            return;
        };
        if attrs.override_redirect || self.clients.contains_key(&window) {
            return;
        }
        let Some(geom) = self.x.window_geometry(window) else {
            return;
        };
        let old_bw = self.x.window_border_width(window);
        self.manage(window, geom, old_bw);
    }

    fn handle_unmap_notify(&mut self, event: &UnmapNotifyEvent) {
        if self.clients.contains_key(&event.window) {
            self.unmanage(event.window, false);
        }
    }

    /// Floating (and floating-layout) clients get what they ask for, with
    /// an off-screen rescue toward the monitor center; tiled clients are
    /// refused with a synthetic `ConfigureNotify` of their real geometry;
    /// unmanaged windows have the request forwarded verbatim
    fn handle_configure_request(&mut self, event: &ConfigureRequestEvent) {
        let window = event.window;
        let known = self
            .clients
            .get(&window)
            .map(|c| (c.mon, c.rect, c.bw, c.is_floating()));

        if let Some((mon, mut rect, bw, floating)) = known {
            let screen = self.monitors[mon].screen;
            let sel_layout_floating =
                LAYOUTS[self.monitors[self.sel_mon].sel_view().layout].arrange.is_none();

            if event.value_mask.contains(ConfigWindow::BORDER_WIDTH) {
                if let Some(c) = self.clients.get_mut(&window) {
                    c.bw = event.border_width.into();
                }
            } else if floating || sel_layout_floating {
                if event.value_mask.contains(ConfigWindow::X) {
                    rect.point.x = screen.x() + i32::from(event.x);
                }
                if event.value_mask.contains(ConfigWindow::Y) {
                    rect.point.y = screen.y() + i32::from(event.y);
                }
                if event.value_mask.contains(ConfigWindow::WIDTH) {
                    rect.dimension.width = event.width.into();
                }
                if event.value_mask.contains(ConfigWindow::HEIGHT) {
                    rect.dimension.height = event.height.into();
                }
                if rect.right() > screen.right() && floating {
                    // center in the x direction
                    rect.point.x = screen.x() + (screen.w() as i32 / 2 - rect.w() as i32 / 2);
                }
                if rect.bottom() > screen.bottom() && floating {
                    // center in the y direction
                    rect.point.y = screen.y() + (screen.h() as i32 / 2 - rect.h() as i32 / 2);
                }

                if let Some(c) = self.clients.get_mut(&window) {
                    c.rect = rect;
                }
                if event.value_mask.intersects(ConfigWindow::X | ConfigWindow::Y)
                    && !event
                        .value_mask
                        .intersects(ConfigWindow::WIDTH | ConfigWindow::HEIGHT)
                {
                    self.x.send_configure_notify(window, rect, bw);
                }
                self.x.move_resize(window, rect, bw);
            } else {
                self.x.send_configure_notify(window, rect, bw);
            }
        } else {
            self.x
                .configure(window, &ConfigureWindowAux::from_configure_request(event));
        }

        self.x.sync();
    }

    /// A root `ConfigureNotify` means the display changed: reconcile
    /// monitors, resize the bars, re-arrange the world
    fn handle_configure_notify(&mut self, event: &ConfigureNotifyEvent) {
        if event.window != self.x.root() {
            return;
        }

        self.display.width = event.width.into();
        self.display.height = event.height.into();

        match self.update_geometry() {
            Ok(true) => {
                if let Err(e) = self.update_bars() {
                    log::warn!("failed to refresh bars: {e}");
                }
                for m in &self.monitors {
                    self.x.configure(
                        m.bar_win,
                        &Rectangle::new(m.window.x(), m.bar_y, m.window.w(), self.bar_h)
                            .to_aux(0),
                    );
                }
                self.arrange(None);
            },
            Ok(false) => (),
            Err(e) => log::warn!("failed to reconcile monitors: {e}"),
        }
    }

    fn handle_property_notify(&mut self, event: &PropertyNotifyEvent) {
        use x11rb::protocol::xproto::Property;

        let window = event.window;
        let atoms = *self.x.atoms();

        if window == self.x.root() && event.atom == u32::from(AtomEnum::WM_NAME) {
            self.update_status();
            return;
        }
        if event.state == Property::DELETE {
            return;
        }
        if !self.clients.contains_key(&window) {
            return;
        }

        if event.atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) {
            // a late transient-for hint flips the client to floating
            let trans_managed = self
                .x
                .transient_for(window)
                .map_or(false, |t| self.clients.contains_key(&t));
            let mut arrange_mon = None;
            if let Some(c) = self.clients.get_mut(&window) {
                if !c.is_floating() && trans_managed {
                    c.flags.insert(ClientFlags::FLOATING);
                    arrange_mon = Some(c.mon);
                }
            }
            if let Some(mon) = arrange_mon {
                self.arrange(Some(mon));
            }
        } else if event.atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
            if let Some(hints) = self.x.normal_hints(window) {
                if let Some(c) = self.clients.get_mut(&window) {
                    c.set_hints(SizeHints::from_normal_hints(&hints));
                }
            }
        } else if event.atom == u32::from(AtomEnum::WM_HINTS) {
            self.update_wm_hints(window);
            self.draw_bars();
        }

        if event.atom == u32::from(AtomEnum::WM_NAME) || event.atom == atoms._NET_WM_NAME {
            self.update_title(window);
            if let Some(c) = self.clients.get(&window) {
                let (mon, view) = (c.mon, c.view);
                if self.monitors[mon].views[view].sel == Some(window) {
                    self.draw_bar(mon);
                }
            }
        }
    }

    /// Track urgency from `WM_HINTS`; a freshly focused client has the
    /// hint cleared on the server instead
    fn update_wm_hints(&mut self, window: x11rb::protocol::xproto::Window) {
        let Some(hints) = self.x.wm_hints(window) else {
            return;
        };

        if self.sel_client() == Some(window) && hints.urgent {
            self.x.clear_urgency(window);
        } else if let Some(c) = self.clients.get_mut(&window) {
            c.flags.set(ClientFlags::URGENT, hints.urgent);
        }
    }

    /// `_NET_WM_STATE` fullscreen requests
    fn handle_client_message(&mut self, event: &ClientMessageEvent) {
        let atoms = *self.x.atoms();
        if event.type_ != atoms._NET_WM_STATE {
            return;
        }
        let Some(c) = self.clients.get(&event.window) else {
            return;
        };

        let data = event.data.as_data32();
        if data[1] == atoms._NET_WM_STATE_FULLSCREEN
            || data[2] == atoms._NET_WM_STATE_FULLSCREEN
        {
            /// `_NET_WM_STATE_ADD`
            const ADD: u32 = 1;
            /// `_NET_WM_STATE_TOGGLE`
            const TOGGLE: u32 = 2;

            let fullscreen =
                data[0] == ADD || (data[0] == TOGGLE && !c.is_fullscreen());
            self.set_fullscreen(event.window, fullscreen);
        }
    }

    /// Focus follows the pointer into client windows; non-normal modes and
    /// inferior crossings are noise
    fn handle_enter_notify(&mut self, event: &EnterNotifyEvent) {
        let window = event.event;
        if window != self.x.root()
            && (event.mode != NotifyMode::NORMAL || event.detail == NotifyDetail::INFERIOR)
        {
            return;
        }

        let mon = self.window_to_monitor(window);
        if mon != self.sel_mon {
            if let Some(prev) = self.sel_client() {
                self.unfocus(prev, true);
            }
            self.sel_mon = mon;
        }

        let client = self.clients.contains_key(&window).then_some(window);
        self.focus(client);
    }

    /// Some clients grab the focus themselves; put it back
    fn handle_focus_in(&mut self, event: &FocusInEvent) {
        if let Some(sel) = self.sel_client() {
            if event.event != sel {
                self.x.focus_window(sel);
            }
        }
    }

    /// The final expose of a bar triggers its repaint
    fn handle_expose(&mut self, event: &ExposeEvent) {
        if event.count == 0 {
            if let Some(m) = self
                .monitors
                .iter()
                .position(|m| m.bar_win == event.window)
            {
                self.draw_bar(m);
            }
        }
    }

    fn handle_mapping_notify(&mut self, event: &MappingNotifyEvent) {
        if let Err(e) = self.x.refresh_keyboard_mapping() {
            log::warn!("failed to refresh the keyboard mapping: {e}");
        }
        if event.request == Mapping::KEYBOARD {
            self.grab_keys();
        }
    }

    /// Classify the click region, switch monitors if needed, and dispatch
    /// the matching button binding
    fn handle_button_press(&mut self, event: &ButtonPressEvent) {
        let mut click = ClickRegion::RootWin;
        let mut clicked_tag = None;

        let mon = self.window_to_monitor(event.event);
        if mon != self.sel_mon {
            if let Some(prev) = self.sel_client() {
                self.unfocus(prev, true);
            }
            self.sel_mon = mon;
            self.focus(None);
        }

        if event.event == self.sel_mon().bar_win {
            let m = self.sel_mon();
            let (region, tag) = bar::click_region(
                &*self.painter,
                i32::from(event.event_x),
                &self.config.tags,
                &m.lt_symbol,
                &self.status,
                m.window.w(),
            );
            click = region;
            clicked_tag = tag;
        } else if self.clients.contains_key(&event.event) {
            self.focus(Some(event.event));
            click = ClickRegion::ClientWin;
        }

        let state = clean_mask(u16::from(event.state), self.numlock);
        let bindings = self.buttons.clone();
        for binding in &bindings {
            if binding.click != click
                || u8::from(binding.button) != event.detail
                || clean_mask(mods_mask(&binding.mods), self.numlock) != state
            {
                continue;
            }

            // a click on a tag cell overrides the binding's default view
            let action = match (&binding.action, clicked_tag) {
                (Action::ViewTag(0), Some(tag)) => Action::ViewTag(tag),
                (Action::SendToView(0), Some(tag)) => Action::SendToView(tag),
                (action, _) => action.clone(),
            };
            self.run_action(&action);
        }
    }

    fn handle_key_press(&mut self, event: &KeyPressEvent) {
        let keysym = self.x.keycode_to_keysym(event.detail);
        let state = clean_mask(u16::from(event.state), self.numlock);

        let bindings = self.keys.clone();
        for binding in &bindings {
            if binding.keysym == keysym
                && clean_mask(mods_mask(&binding.mods), self.numlock) == state
            {
                self.run_action(&binding.action);
            }
        }
    }

    // ========================== Actions =========================

    /// Dispatch one bound action
    pub(crate) fn run_action(&mut self, action: &Action) {
        log::debug!("running action {action:?}");
        match *action {
            Action::FocusStack(dir) => self.focus_stack(dir),
            Action::FocusMonitor(dir) => self.focus_monitor(dir),
            Action::SendToMonitor(dir) => {
                if let Some(sel) = self.sel_client() {
                    let target = self.dir_to_monitor(dir);
                    self.send_to_monitor(sel, target);
                }
            },
            Action::ToggleBar => self.toggle_bar(),
            Action::SetLayout(layout) => self.set_layout(layout),
            Action::SetMfact(delta) => self.set_mfact(delta),
            Action::Zoom => self.zoom(),
            Action::ViewTag(view) => self.view_tag(view),
            Action::SendToView(view) => self.send_to_view(view),
            Action::KillClient => self.kill_client(),
            Action::ToggleFloating => self.toggle_floating(),
            Action::MoveMouse => self.start_drag(DragKind::Move),
            Action::ResizeMouse => self.start_drag(DragKind::Resize),
            Action::Spawn(ref argv) => self.spawn(argv),
            Action::Quit => self.running = false,
        }
    }

    /// Cycle focus through the selected view's client list, wrapping. A
    /// selection that is no longer on the list falls back to the last
    /// client.
    fn focus_stack(&mut self, dir: i32) {
        let view = self.sel_mon().sel_view();
        let Some(sel) = view.sel else {
            return;
        };
        let clients = &view.clients;
        if clients.is_empty() {
            return;
        }

        let target = match clients.iter().position(|&w| w == sel) {
            Some(pos) if dir > 0 => clients.get(pos + 1).or_else(|| clients.first()),
            Some(pos) => {
                if pos == 0 {
                    clients.last()
                } else {
                    clients.get(pos - 1)
                }
            },
            None => clients.last(),
        }
        .copied();

        if let Some(w) = target {
            self.focus(Some(w));
            self.restack(self.sel_mon);
        }
    }

    fn focus_monitor(&mut self, dir: i32) {
        let target = self.dir_to_monitor(dir);
        if target == self.sel_mon {
            return;
        }
        if let Some(prev) = self.sel_client() {
            self.unfocus(prev, true);
        }
        self.sel_mon = target;
        self.focus(None);
    }

    fn toggle_bar(&mut self) {
        let bar_h = self.bar_h;
        let sel = self.sel_mon;
        {
            let m = &mut self.monitors[sel];
            m.show_bar = !m.show_bar;
            m.update_bar_pos(bar_h);
        }

        let m = &self.monitors[sel];
        let aux = Rectangle::new(m.window.x(), m.bar_y, m.window.w(), bar_h).to_aux(0);
        self.x.configure(m.bar_win, &aux);
        self.arrange(Some(sel));
    }

    fn set_layout(&mut self, layout: usize) {
        if layout >= LAYOUTS.len() {
            return;
        }
        self.sel_mon_mut().sel_view_mut().layout = layout;
        let symbol = LAYOUTS[layout].symbol;
        self.sel_mon_mut().set_lt_symbol(symbol);

        if self.sel_client().is_some() {
            self.arrange(Some(self.sel_mon));
        } else {
            self.draw_bar(self.sel_mon);
        }
    }

    /// Nudge the master fraction; deltas that would leave the legal range
    /// are ignored
    fn set_mfact(&mut self, delta: f32) {
        if !(-1.0..=1.0).contains(&delta) {
            return;
        }
        let view = self.sel_mon().sel_view();
        if LAYOUTS[view.layout].arrange.is_none() {
            return;
        }

        let mfact = view.mfact + delta;
        if (MFACT_MIN..=MFACT_MAX).contains(&mfact) {
            self.sel_mon_mut().sel_view_mut().set_mfact(mfact);
            self.arrange(Some(self.sel_mon));
        }
    }

    /// Promote the selected tiled client to master
    fn zoom(&mut self) {
        let view = self.sel_mon().sel_view();
        let layout = &LAYOUTS[view.layout];
        if layout.arrange.is_none() || layout.arrange == Some(crate::layout::Arranger::Monocle) {
            return;
        }
        let Some(mut target) = view.sel else {
            return;
        };
        if self.clients.get(&target).map_or(true, Client::is_floating) {
            return;
        }

        let tiled: Vec<_> = view
            .clients
            .iter()
            .copied()
            .filter(|w| !self.clients[w].is_floating())
            .collect();
        if tiled.first() == Some(&target) {
            match tiled.get(1) {
                Some(&next) => target = next,
                None => return,
            }
        }

        let (mon, view_idx) = match self.clients.get(&target) {
            Some(c) => (c.mon, c.view),
            None => return,
        };
        self.monitors[mon].views[view_idx].detach(target);
        self.monitors[mon].views[view_idx].attach(target);
        self.focus(Some(target));
        self.arrange(Some(mon));
    }

    fn view_tag(&mut self, view: usize) {
        if view >= crate::monitor::NUM_VIEWS || view == self.sel_mon().sel_view {
            return;
        }
        self.sel_mon_mut().sel_view = view;
        self.arrange(Some(self.sel_mon));
    }

    /// Move the selected client to another view on the same monitor
    fn send_to_view(&mut self, view: usize) {
        if view >= crate::monitor::NUM_VIEWS {
            return;
        }
        let Some(sel) = self.sel_client() else {
            return;
        };
        let (mon, old_view) = match self.clients.get(&sel) {
            Some(c) => (c.mon, c.view),
            None => return,
        };
        if old_view == view {
            return;
        }

        self.monitors[mon].views[old_view].detach(sel);
        self.monitors[mon].views[old_view].detach_stack(sel);
        if let Some(c) = self.clients.get_mut(&sel) {
            c.view = view;
        }
        self.monitors[mon].views[view].attach(sel);
        self.monitors[mon].views[view].attach_stack(sel);
        self.arrange(Some(mon));
    }

    fn toggle_floating(&mut self) {
        let Some(sel) = self.sel_client() else {
            return;
        };
        let Some(c) = self.clients.get_mut(&sel) else {
            return;
        };
        if c.is_fullscreen() {
            return;
        }

        let floating = !c.is_floating() || c.flags.contains(ClientFlags::FIXED);
        c.flags.set(ClientFlags::FLOATING, floating);
        let rect = c.rect;
        if floating {
            self.resize(sel, rect, false);
        }
        self.arrange(Some(self.sel_mon));
    }

    // ============================ Drag ==========================

    /// Begin a pointer drag on the selected client
    fn start_drag(&mut self, kind: DragKind) {
        let Some(sel) = self.sel_client() else {
            return;
        };
        let Some(c) = self.clients.get(&sel) else {
            return;
        };
        if c.is_fullscreen() {
            return;
        }
        let start_rect = c.rect;
        let (outer_w, outer_h) = (c.outer_w(), c.outer_h());

        self.restack(self.sel_mon);

        let Some(start_ptr) = self.x.query_pointer() else {
            return;
        };
        let cursor = match kind {
            DragKind::Move => CursorKind::Move,
            DragKind::Resize => CursorKind::Resize,
        };
        if !self.x.grab_pointer(cursor) {
            return;
        }

        if kind == DragKind::Resize {
            self.x
                .warp_pointer(sel, (outer_w - 1) as i16, (outer_h - 1) as i16);
        }

        self.drag = Some(Drag { kind, window: sel, start_ptr, start_rect });
    }

    /// One motion step of the active drag
    fn drag_motion(&mut self, event: &MotionNotifyEvent) {
        let Some(drag) = self.drag else {
            return;
        };
        let Some(c) = self.clients.get(&drag.window) else {
            return;
        };

        let snap = self.config.snap as i32;
        let area = self.sel_mon().window;
        let layout_tiled =
            LAYOUTS[self.sel_mon().sel_view().layout].arrange.is_some();
        let tiled = !c.is_floating() && layout_tiled;
        let rect = c.rect;
        let (outer_w, outer_h) = (c.outer_w(), c.outer_h());
        let bw = c.bw as i32;

        match drag.kind {
            DragKind::Move => {
                let mut nx = drag.start_rect.x() + (i32::from(event.root_x) - drag.start_ptr.x);
                let mut ny = drag.start_rect.y() + (i32::from(event.root_y) - drag.start_ptr.y);

                if snap > 0
                    && (area.x()..=area.right()).contains(&nx)
                    && (area.y()..=area.bottom()).contains(&ny)
                {
                    if (area.x() - nx).abs() < snap {
                        nx = area.x();
                    } else if ((area.right()) - (nx + outer_w)).abs() < snap {
                        nx = area.right() - outer_w;
                    }
                    if (area.y() - ny).abs() < snap {
                        ny = area.y();
                    } else if ((area.bottom()) - (ny + outer_h)).abs() < snap {
                        ny = area.bottom() - outer_h;
                    }

                    if tiled && ((nx - rect.x()).abs() > snap || (ny - rect.y()).abs() > snap) {
                        self.toggle_floating();
                    }
                }

                let still_tiled = self
                    .clients
                    .get(&drag.window)
                    .map_or(true, |c| !c.is_floating() && layout_tiled);
                if !still_tiled {
                    self.resize(
                        drag.window,
                        Rectangle::new(nx, ny, rect.w(), rect.h()),
                        true,
                    );
                }
            },
            DragKind::Resize => {
                let nw = (i32::from(event.root_x) - drag.start_rect.x() - 2 * bw + 1).max(1);
                let nh = (i32::from(event.root_y) - drag.start_rect.y() - 2 * bw + 1).max(1);

                if snap > 0
                    && (area.x()..=area.right()).contains(&nw)
                    && (area.y()..=area.bottom()).contains(&nh)
                    && tiled
                    && ((nw - rect.w() as i32).abs() > snap
                        || (nh - rect.h() as i32).abs() > snap)
                {
                    self.toggle_floating();
                }

                let still_tiled = self
                    .clients
                    .get(&drag.window)
                    .map_or(true, |c| !c.is_floating() && layout_tiled);
                if !still_tiled {
                    self.resize(
                        drag.window,
                        Rectangle::new(rect.x(), rect.y(), nw as u32, nh as u32),
                        true,
                    );
                }
            },
        }
    }

    /// Finish the active drag, migrating the client to the monitor under
    /// its center
    fn drag_release(&mut self, _event: &ButtonReleaseEvent) {
        let Some(drag) = self.drag.take() else {
            return;
        };

        if drag.kind == DragKind::Resize {
            if let Some(c) = self.clients.get(&drag.window) {
                let (w, h) = (c.outer_w(), c.outer_h());
                self.x.warp_pointer(drag.window, (w - 1) as i16, (h - 1) as i16);
            }
        }
        self.x.ungrab_pointer();
        self.drain_crossings();

        let center = match self.clients.get(&drag.window) {
            Some(c) => c.center(),
            None => return,
        };
        let target = self.point_to_monitor(center);
        if target != self.sel_mon {
            self.send_to_monitor(drag.window, target);
            self.sel_mon = target;
            self.focus(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::Point;

    /// The move arithmetic: new position is the start rectangle shifted by
    /// the pointer delta
    #[test]
    fn move_delta_tracks_the_pointer() {
        let start_rect = Point::new(100, 200);
        let start_ptr = Point::new(500, 500);
        let motion = Point::new(540, 470);

        let nx = start_rect.x + (motion.x - start_ptr.x);
        let ny = start_rect.y + (motion.y - start_ptr.y);

        assert_eq!((nx, ny), (140, 170));
    }

    /// The resize arithmetic: the pointer sits on the bottom-right corner,
    /// so the new size is pointer minus origin minus both borders plus one
    #[test]
    fn resize_tracks_the_bottom_right_corner() {
        let (ocx, ocy, bw) = (100, 200, 1);
        let (px, py) = (740, 680);

        let nw = (px - ocx - 2 * bw + 1).max(1);
        let nh = (py - ocy - 2 * bw + 1).max(1);

        assert_eq!((nw, nh), (639, 479));
    }
}
