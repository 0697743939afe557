//! Input into the window manager: modifiers, buttons, and bindings

use anyhow::{anyhow, Result};
use x11rb::protocol::xproto::{Button as XButton, ModMask as XModMask};

/// Keysym values referenced by the default bindings
#[allow(dead_code)]
pub(crate) mod keysym {
    pub(crate) const XK_SPACE: u32 = 0x0020;
    pub(crate) const XK_COMMA: u32 = 0x002c;
    pub(crate) const XK_PERIOD: u32 = 0x002e;
    pub(crate) const XK_1: u32 = 0x0031;
    pub(crate) const XK_9: u32 = 0x0039;
    pub(crate) const XK_B: u32 = 0x0062;
    pub(crate) const XK_C: u32 = 0x0063;
    pub(crate) const XK_E: u32 = 0x0065;
    pub(crate) const XK_F: u32 = 0x0066;
    pub(crate) const XK_H: u32 = 0x0068;
    pub(crate) const XK_J: u32 = 0x006a;
    pub(crate) const XK_K: u32 = 0x006b;
    pub(crate) const XK_L: u32 = 0x006c;
    pub(crate) const XK_M: u32 = 0x006d;
    pub(crate) const XK_P: u32 = 0x0070;
    pub(crate) const XK_Q: u32 = 0x0071;
    pub(crate) const XK_R: u32 = 0x0072;
    pub(crate) const XK_T: u32 = 0x0074;
    pub(crate) const XK_W: u32 = 0x0077;
    pub(crate) const XK_RETURN: u32 = 0xff0d;
    pub(crate) const XK_NUM_LOCK: u32 = 0xff7f;
}

// ============================== ModMask =============================
// ====================================================================

/// Keycode modifier that is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ModMask {
    /// Left or right `shift` key
    Shift,
    /// Caps-lock
    Lock,
    /// Left or right `control` key
    Control,
    /// Modifier 1 as defined in `xmodmap` (usually `alt`)
    Mod1,
    /// Modifier 2 as defined in `xmodmap` (usually `num-lock`)
    Mod2,
    /// Modifier 3 as defined in `xmodmap` (usually blank)
    Mod3,
    /// Modifier 4 as defined in `xmodmap` (usually `super`)
    Mod4,
    /// Modifier 5 as defined in `xmodmap` (usually `mode_shift`)
    Mod5,
}

impl From<ModMask> for u16 {
    fn from(m: ModMask) -> Self {
        Self::from(match m {
            ModMask::Shift => XModMask::SHIFT,
            ModMask::Lock => XModMask::LOCK,
            ModMask::Control => XModMask::CONTROL,
            ModMask::Mod1 => XModMask::M1,
            ModMask::Mod2 => XModMask::M2,
            ModMask::Mod3 => XModMask::M3,
            ModMask::Mod4 => XModMask::M4,
            ModMask::Mod5 => XModMask::M5,
        })
    }
}

/// Fold a modifier list into the wire mask
pub(crate) fn mods_mask(mods: &[ModMask]) -> u16 {
    mods.iter().fold(0, |acc, &m| acc | u16::from(m))
}

/// Strip the lock modifiers before comparing a binding against an event.
/// Caps-lock and num-lock being held must not change what a chord means.
pub(crate) fn clean_mask(mask: u16, numlock: u16) -> u16 {
    mask & !(numlock | u16::from(XModMask::LOCK))
}

// ============================== Button ==============================
// ====================================================================

/// Available buttons on a mouse
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub(crate) enum Button {
    /// 1, Left-click
    Left,
    /// 2, Middle-click
    Middle,
    /// 3, Right-click
    Right,
    /// 4, Wheel-scroll up
    ScrollUp,
    /// 5, Wheel-scroll down
    ScrollDown,
}

impl From<Button> for XButton {
    fn from(b: Button) -> Self {
        match b {
            Button::Left => 1,
            Button::Middle => 2,
            Button::Right => 3,
            Button::ScrollUp => 4,
            Button::ScrollDown => 5,
        }
    }
}

impl TryFrom<u8> for Button {
    type Error = anyhow::Error;

    fn try_from(u: u8) -> Result<Self> {
        match u {
            1 => Ok(Self::Left),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Right),
            4 => Ok(Self::ScrollUp),
            5 => Ok(Self::ScrollDown),
            _ => Err(anyhow!("mouse button {} is unknown", u)),
        }
    }
}

// ============================== Action ==============================
// ====================================================================

/// Everything a binding can do, each carrying its typed argument
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    /// Cycle focus through the view's client list (`+1` forward, `-1` back)
    FocusStack(i32),
    /// Focus the next (`+1`) or previous (`-1`) monitor
    FocusMonitor(i32),
    /// Send the selected client to the next or previous monitor
    SendToMonitor(i32),
    /// Show or hide the bar on the selected monitor
    ToggleBar,
    /// Switch the selected view to the layout at this table index
    SetLayout(usize),
    /// Nudge the master fraction by this delta
    SetMfact(f32),
    /// Promote the selected tiled client to master
    Zoom,
    /// Select the view with this index
    ViewTag(usize),
    /// Move the selected client to the view with this index
    SendToView(usize),
    /// Close the selected client, politely if it allows it
    KillClient,
    /// Toggle the selected client between tiled and floating
    ToggleFloating,
    /// Start a pointer-driven move
    MoveMouse,
    /// Start a pointer-driven resize
    ResizeMouse,
    /// Fork off a child process
    Spawn(Vec<String>),
    /// Leave the event loop
    Quit,
}

// ============================= Bindings =============================
// ====================================================================

/// A key chord bound to an [`Action`]
#[derive(Debug, Clone)]
pub(crate) struct KeyBinding {
    /// Modifiers that must be held
    pub(crate) mods:   Vec<ModMask>,
    /// The keysym of the non-modifier key
    pub(crate) keysym: u32,
    /// What to do
    pub(crate) action: Action,
}

/// Where on the screen a button press landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClickRegion {
    /// One of the tag labels on the bar
    TagBar,
    /// The layout symbol on the bar
    LtSymbol,
    /// The status text on the bar
    StatusText,
    /// The window-title area on the bar
    WinTitle,
    /// A managed client window
    ClientWin,
    /// The root window
    RootWin,
}

/// A button press in a [`ClickRegion`] bound to an [`Action`]
#[derive(Debug, Clone)]
pub(crate) struct ButtonBinding {
    /// Region the press must land in
    pub(crate) click:  ClickRegion,
    /// Modifiers that must be held
    pub(crate) mods:   Vec<ModMask>,
    /// The button
    pub(crate) button: Button,
    /// What to do
    pub(crate) action: Action,
}

#[cfg(test)]
mod tests {
    use super::{clean_mask, mods_mask, Button, ModMask};
    use x11rb::protocol::xproto::ModMask as XModMask;

    #[test]
    fn lock_modifiers_are_stripped() {
        let numlock = u16::from(XModMask::M2);
        let chord = mods_mask(&[ModMask::Mod4, ModMask::Shift]);

        assert_eq!(clean_mask(chord | numlock, numlock), chord);
        assert_eq!(
            clean_mask(chord | u16::from(XModMask::LOCK), numlock),
            chord
        );
        assert_eq!(
            clean_mask(chord | numlock | u16::from(XModMask::LOCK), numlock),
            chord
        );
    }

    #[test]
    fn buttons_round_trip_through_the_wire_encoding() {
        for b in [
            Button::Left,
            Button::Middle,
            Button::Right,
            Button::ScrollUp,
            Button::ScrollDown,
        ] {
            assert_eq!(Button::try_from(u8::from(b)).unwrap(), b);
        }
        assert!(Button::try_from(9).is_err());
    }
}
