//! Configuration options

use crate::{
    input::{
        keysym::{self, XK_1},
        Action, Button, ButtonBinding, ClickRegion, KeyBinding,
        ModMask::{self, Mod4, Shift},
    },
    monitor::NUM_VIEWS,
};
use anyhow::{ensure, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

/// Configuration file name
const CONFIG_FILE: &str = "vwm.yml";

/// Modifier held by every default binding
const MODKEY: ModMask = Mod4;

// ============================== Colors ==============================

/// Border, foreground, and background colors for the two focus states
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Colors {
    /// Border of unfocused windows
    #[serde(alias = "normal-border")]
    pub(crate) normal_border: String,
    /// Bar background for unfocused elements
    #[serde(alias = "normal-bg")]
    pub(crate) normal_bg: String,
    /// Bar foreground for unfocused elements
    #[serde(alias = "normal-fg")]
    pub(crate) normal_fg: String,
    /// Border of the focused window
    #[serde(alias = "selected-border")]
    pub(crate) selected_border: String,
    /// Bar background for the selected elements
    #[serde(alias = "selected-bg")]
    pub(crate) selected_bg: String,
    /// Bar foreground for the selected elements
    #[serde(alias = "selected-fg")]
    pub(crate) selected_fg: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            normal_border:   String::from("#cccccc"),
            normal_bg:       String::from("#cccccc"),
            normal_fg:       String::from("#000000"),
            selected_border: String::from("#ff0000"),
            selected_bg:     String::from("#0066ff"),
            selected_fg:     String::from("#ffffff"),
        }
    }
}

/// Parse a `#rrggbb` color into a pixel value
pub(crate) fn pixel(color: &str) -> Result<u32> {
    let hex = color
        .strip_prefix('#')
        .with_context(|| format!("color {:?} must start with '#'", color))?;
    ensure!(hex.len() == 6, "color {:?} must be of the form #rrggbb", color);

    u32::from_str_radix(hex, 16).with_context(|| format!("color {:?} is not valid hex", color))
}

// ============================== Config ==============================

/// User configuration, immutable after startup.
///
/// Loaded from `$XDG_CONFIG_HOME/vwm/vwm.yml` when present; every field
/// falls back to a compiled default. The key and button tables are fixed at
/// compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Labels of the nine views
    pub(crate) tags: Vec<String>,

    /// Default factor of the master area size
    pub(crate) mfact: f32,
    /// Edge-magnet distance during interactive move/resize, in pixels
    pub(crate) snap: u32,
    /// Border pixel of windows
    #[serde(alias = "border-px")]
    pub(crate) border_px: u32,
    /// Whether monitors start with a bar
    #[serde(alias = "show-bar")]
    pub(crate) show_bar: bool,
    /// Whether the bar sits at the top of the screen
    #[serde(alias = "top-bar")]
    pub(crate) top_bar: bool,
    /// Respect size hints in tiled resizals too
    #[serde(alias = "resize-hints")]
    pub(crate) resize_hints: bool,

    /// Font descriptor handed to the draw collaborator
    pub(crate) font: String,
    /// Color scheme
    pub(crate) colors: Colors,

    /// Command spawned by the launcher binding
    pub(crate) launcher: Vec<String>,
    /// Command spawned by the terminal binding
    pub(crate) terminal: Vec<String>,

    /// Whether logs should also be written to a file
    #[serde(alias = "log-to-file")]
    pub(crate) log_to_file: bool,
    /// The directory to write the log to
    #[serde(alias = "log-dir")]
    pub(crate) log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags: (1..=NUM_VIEWS).map(|t| t.to_string()).collect(),
            mfact: 0.5,
            snap: 32,
            border_px: 1,
            show_bar: true,
            top_bar: true,
            resize_hints: false,
            font: String::from("-misc-fixed-medium-r-normal-*-10-*-*-*-*-*-iso10646-*"),
            colors: Colors::default(),
            launcher: vec![String::from("dmenu_run")],
            terminal: vec![String::from("alacritty")],
            log_to_file: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load the configuration from the given file, or from the default
    /// location, falling back to the compiled defaults when neither exists
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).or_else(Self::default_path);

        let config = match path {
            Some(p) if p.is_file() => {
                let raw = fs::read_to_string(&p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("failed to parse {}", p.display()))?
            },
            _ => Self::default(),
        };

        config.validate()
    }

    /// `$XDG_CONFIG_HOME/vwm/vwm.yml`
    fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.config_dir().join("vwm").join(CONFIG_FILE))
    }

    /// Reject configurations the engine cannot run with
    fn validate(mut self) -> Result<Self> {
        ensure!(
            self.tags.len() == NUM_VIEWS,
            "expected {} tags, found {}",
            NUM_VIEWS,
            self.tags.len()
        );
        pixel(&self.colors.normal_border).context("normal border color")?;
        pixel(&self.colors.selected_border).context("selected border color")?;

        self.mfact = self.mfact.clamp(crate::view::MFACT_MIN, crate::view::MFACT_MAX);

        Ok(self)
    }

    /// The key table
    pub(crate) fn keys(&self) -> Vec<KeyBinding> {
        let spawn = |argv: &[String]| Action::Spawn(argv.to_vec());

        let mut keys = vec![
            key(&[MODKEY], keysym::XK_P, spawn(&self.launcher)),
            key(&[MODKEY, Shift], keysym::XK_RETURN, spawn(&self.terminal)),
            key(&[MODKEY], keysym::XK_B, Action::ToggleBar),
            key(&[MODKEY], keysym::XK_J, Action::FocusStack(1)),
            key(&[MODKEY], keysym::XK_K, Action::FocusStack(-1)),
            key(&[MODKEY], keysym::XK_H, Action::SetMfact(-0.05)),
            key(&[MODKEY], keysym::XK_L, Action::SetMfact(0.05)),
            key(&[MODKEY], keysym::XK_RETURN, Action::Zoom),
            key(&[MODKEY, Shift], keysym::XK_C, Action::KillClient),
            key(&[MODKEY], keysym::XK_M, Action::SetLayout(0)),
            key(&[MODKEY], keysym::XK_T, Action::SetLayout(1)),
            key(&[MODKEY], keysym::XK_R, Action::SetLayout(2)),
            key(&[MODKEY], keysym::XK_F, Action::SetLayout(3)),
            key(&[MODKEY, Shift], keysym::XK_SPACE, Action::ToggleFloating),
            key(&[MODKEY], keysym::XK_W, Action::FocusMonitor(-1)),
            key(&[MODKEY], keysym::XK_E, Action::FocusMonitor(1)),
            key(&[MODKEY, Shift], keysym::XK_W, Action::SendToMonitor(-1)),
            key(&[MODKEY, Shift], keysym::XK_E, Action::SendToMonitor(1)),
            key(&[MODKEY, Shift], keysym::XK_Q, Action::Quit),
        ];

        for view in 0..NUM_VIEWS {
            let sym = XK_1 + view as u32;
            keys.push(key(&[MODKEY], sym, Action::ViewTag(view)));
            keys.push(key(&[MODKEY, Shift], sym, Action::SendToView(view)));
        }

        keys
    }

    /// The button table
    pub(crate) fn buttons(&self) -> Vec<ButtonBinding> {
        vec![
            button(ClickRegion::WinTitle, &[], Button::Middle, Action::Zoom),
            button(ClickRegion::ClientWin, &[MODKEY], Button::Left, Action::MoveMouse),
            button(
                ClickRegion::ClientWin,
                &[MODKEY],
                Button::Middle,
                Action::ToggleFloating,
            ),
            button(
                ClickRegion::ClientWin,
                &[MODKEY],
                Button::Right,
                Action::ResizeMouse,
            ),
            button(ClickRegion::TagBar, &[], Button::Left, Action::ViewTag(0)),
        ]
    }
}

/// Shorthand for one [`KeyBinding`]
fn key(mods: &[ModMask], keysym: u32, action: Action) -> KeyBinding {
    KeyBinding { mods: mods.to_vec(), keysym, action }
}

/// Shorthand for one [`ButtonBinding`]
fn button(click: ClickRegion, mods: &[ModMask], button: Button, action: Action) -> ButtonBinding {
    ButtonBinding { click, mods: mods.to_vec(), button, action }
}

#[cfg(test)]
mod tests {
    use super::{pixel, Config};
    use crate::{input::Action, monitor::NUM_VIEWS};

    #[test]
    fn defaults_are_sane() {
        let c = Config::default();

        assert_eq!(c.tags.len(), NUM_VIEWS);
        assert_eq!(c.mfact, 0.5);
        assert_eq!(c.snap, 32);
        assert_eq!(c.border_px, 1);
        assert!(c.show_bar && c.top_bar);
        assert!(!c.resize_hints);
    }

    #[test]
    fn yaml_overrides_defaults() {
        let c: Config = serde_yaml::from_str(
            "mfact: 0.55\nborder-px: 2\ntop-bar: false\ncolors:\n  normal-border: '#222222'\n",
        )
        .unwrap();

        assert_eq!(c.mfact, 0.55);
        assert_eq!(c.border_px, 2);
        assert!(!c.top_bar);
        assert_eq!(c.colors.normal_border, "#222222");
        // untouched fields keep their defaults
        assert_eq!(c.snap, 32);
    }

    #[test]
    fn pixel_parses_hex_colors() {
        assert_eq!(pixel("#ff0000").unwrap(), 0x00ff_0000);
        assert_eq!(pixel("#0066ff").unwrap(), 0x0000_66ff);
        assert!(pixel("red").is_err());
        assert!(pixel("#ff00").is_err());
    }

    #[test]
    fn every_view_has_a_pair_of_tag_bindings() {
        let keys = Config::default().keys();

        for view in 0..NUM_VIEWS {
            assert!(keys.iter().any(|k| k.action == Action::ViewTag(view)));
            assert!(keys.iter().any(|k| k.action == Action::SendToView(view)));
        }
    }
}
