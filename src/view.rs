//! Per-tag state: one ordered client list and one focus stack

use x11rb::protocol::xproto::Window;

/// Lower bound of the master-area fraction
pub(crate) const MFACT_MIN: f32 = 0.1;
/// Upper bound of the master-area fraction
pub(crate) const MFACT_MAX: f32 = 0.9;

/// One of the nine workspaces of a [`Monitor`](crate::monitor::Monitor).
///
/// The view does not own [`Client`](crate::client::Client) records; it owns
/// two orderings over the window handles stored in the manager's registry:
/// `clients` is the display order (newest at the head, what the arrangers
/// walk) and `stack` is the focus history (most recently focused at the
/// head).
#[derive(Debug, Clone)]
pub(crate) struct View {
    /// Fraction of the window area given to the master client
    pub(crate) mfact:   f32,
    /// Index into the configured layout table
    pub(crate) layout:  usize,
    /// Display order, newest first
    pub(crate) clients: Vec<Window>,
    /// Focus history, most recently focused first
    pub(crate) stack:   Vec<Window>,
    /// The selected client; always the head of `stack` when present
    pub(crate) sel:     Option<Window>,
}

impl View {
    /// Create an empty [`View`]
    pub(crate) fn new(mfact: f32, layout: usize) -> Self {
        Self {
            mfact: mfact.clamp(MFACT_MIN, MFACT_MAX),
            layout,
            clients: Vec::new(),
            stack: Vec::new(),
            sel: None,
        }
    }

    /// Prepend a window to the client list
    pub(crate) fn attach(&mut self, window: Window) {
        self.clients.insert(0, window);
    }

    /// Remove a window from the client list
    pub(crate) fn detach(&mut self, window: Window) {
        self.clients.retain(|&w| w != window);
    }

    /// Prepend a window to the focus stack
    pub(crate) fn attach_stack(&mut self, window: Window) {
        self.stack.insert(0, window);
    }

    /// Remove a window from the focus stack. If it was the selected client,
    /// selection falls to the new head of the stack.
    pub(crate) fn detach_stack(&mut self, window: Window) {
        self.stack.retain(|&w| w != window);
        if self.sel == Some(window) {
            self.sel = self.stack.first().copied();
        }
    }

    /// Move an already-attached window to the head of the focus stack
    pub(crate) fn promote(&mut self, window: Window) {
        self.stack.retain(|&w| w != window);
        self.stack.insert(0, window);
    }

    /// Is the window on this view?
    pub(crate) fn contains(&self, window: Window) -> bool {
        self.clients.contains(&window)
    }

    /// Adjust the master fraction, clamped to its legal range
    pub(crate) fn set_mfact(&mut self, mfact: f32) {
        self.mfact = mfact.clamp(MFACT_MIN, MFACT_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::View;

    fn view() -> View {
        View::new(0.5, 0)
    }

    #[test]
    fn attach_prepends_detach_removes() {
        let mut v = view();
        v.attach(1);
        v.attach(2);
        v.attach(3);
        assert_eq!(v.clients, vec![3, 2, 1]);

        v.detach(2);
        assert_eq!(v.clients, vec![3, 1]);

        // attach after detach restores membership at the head
        v.attach(2);
        assert_eq!(v.clients, vec![2, 3, 1]);
    }

    #[test]
    fn detach_stack_repairs_selection() {
        let mut v = view();
        for w in [1, 2, 3] {
            v.attach(w);
            v.attach_stack(w);
        }
        v.sel = Some(3);

        v.detach_stack(3);
        assert_eq!(v.sel, Some(2));
        assert_eq!(v.stack, vec![2, 1]);

        v.detach_stack(1);
        assert_eq!(v.sel, Some(2));

        v.detach_stack(2);
        assert_eq!(v.sel, None);
        assert!(v.stack.is_empty());
    }

    #[test]
    fn promote_moves_to_head_without_duplicating() {
        let mut v = view();
        for w in [1, 2, 3] {
            v.attach_stack(w);
        }

        v.promote(1);
        assert_eq!(v.stack, vec![1, 3, 2]);
        v.promote(1);
        assert_eq!(v.stack, vec![1, 3, 2]);
    }

    #[test]
    fn mfact_is_clamped() {
        let mut v = view();
        v.set_mfact(0.05);
        assert_eq!(v.mfact, 0.1);
        v.set_mfact(0.95);
        assert_eq!(v.mfact, 0.9);
        v.set_mfact(0.55);
        assert_eq!(v.mfact, 0.55);
    }
}
