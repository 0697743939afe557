//! Errors found throughout this crate

use thiserror::Error;
use x11rb::errors::ConnectError;

/// Errors that occur from interacting with the X-Server
#[derive(Debug, Error)]
pub(crate) enum Error {
    /// Failure to connect to the server
    #[error("failed to connect to the X11 server: {0}")]
    Connection(#[from] ConnectError),

    /// Another client already selected `SubstructureRedirect` on the root
    #[error("another window manager is already running")]
    OtherWm,

    /// No usable monitor could be derived from the server
    #[error("no monitors were found on screen {0}")]
    NoMonitors(usize),
}
