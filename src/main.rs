//! A dynamic tiling window manager with nine views per monitor
#![deny(
    clippy::all,
    clippy::complexity,
    clippy::correctness,
    clippy::perf,
    clippy::style,
    bad_style,
    improper_ctypes,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_abi,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    noop_method_call,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    semicolon_in_expressions_from_macros,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    while_true
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::similar_names,
    clippy::too_many_lines
)]
#![cfg_attr(
    any(test),
    allow(
        clippy::expect_used,
        clippy::panic,
        clippy::unwrap_used,
        clippy::wildcard_enum_match_arm,
    )
)]

mod bar;
mod cli;
mod client;
mod config;
mod error;
mod events;
mod geometry;
mod input;
mod layout;
mod monitor;
mod utils;
mod view;
mod wm;
mod xconnection;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use nix::sys::signal::{self, SigHandler, Signal};

use bar::NullPainter;
use cli::Opts;
use config::Config;
use wm::WindowManager;
use xconnection::XConn;

/// `name-version`, what `-v` prints and the fallback status text
const VERSION: &str = concat!("vwm-", env!("CARGO_PKG_VERSION"));

fn main() {
    let args = Opts::parse();
    if args.version {
        println!("{VERSION}");
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("{}: {e:#}", "[vwm fatal]".red().bold());
        std::process::exit(1);
    }
}

/// Bring the window manager up and hand it the event loop
fn run(args: &Opts) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    utils::initialize_logging(&config, args)?;

    // children must not linger as zombies
    unsafe { signal::signal(Signal::SIGCHLD, SigHandler::SigIgn) }
        .context("failed to ignore SIGCHLD")?;

    let (conn, screen) = XConn::connect()?;
    let x = XConn::new(conn, screen)?;

    let mut wm = WindowManager::new(x, config, Box::new(NullPainter))?;
    log::info!("{VERSION} up on screen {screen}");
    wm.run()
}
