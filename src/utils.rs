//! Various helper-utilities

use crate::{cli::Opts, config::Config};
use anyhow::{Context, Result};
use clap::crate_name;
use flexi_logger::{
    style, AdaptiveFormat, Age, Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, Level,
    Logger, Naming, Record, WriteMode,
};
use std::{
    borrow::Cow,
    env,
    io::{self, Write},
    panic,
    path::PathBuf,
};
use time::macros::format_description;

/// Initializes logging for this crate
pub(crate) fn initialize_logging(config: &Config, args: &Opts) -> Result<PathBuf> {
    /// Customize the format of the log (colored)
    fn colored_format(
        w: &mut dyn Write,
        _now: &mut DeferredNow,
        record: &Record,
    ) -> Result<(), io::Error> {
        let level = record.level();
        write!(
            w,
            "{:<5} [{}:{}]: {}",
            style(level).paint(level.to_string()),
            style(Level::Trace).paint(record.file().unwrap_or("<unnamed>")),
            record.line().unwrap_or(0),
            &record.args()
        )
    }

    /// Customize the format of the log (uncolored)
    fn uncolored_format(
        w: &mut dyn Write,
        now: &mut DeferredNow,
        record: &Record,
    ) -> Result<(), io::Error> {
        // Strip the ansi sequences from messages built with `colored` when
        // writing to a file. Also use a date
        write!(
            w,
            "[{:>}] {:<5} [{}:{}]: {}",
            now.now()
                .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            record.level(),
            record.file().unwrap_or("<unnamed>"),
            record.line().unwrap_or(0),
            String::from_utf8(strip_ansi_escapes::strip(
                record.args().to_string().as_bytes()
            )?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        )
    }

    // Python-style backtraces make errors from the X round-trips much
    // easier to place
    if cfg!(debug_assertions) {
        better_panic::install();
        panic::set_hook(Box::new(|panic_info| {
            better_panic::Settings::auto().create_panic_handler()(panic_info);
        }));
    }

    let log_dir = config.log_dir.as_ref().map_or_else(
        || env::temp_dir().join(crate_name!()),
        |dir| {
            PathBuf::from(
                shellexpand::full(&dir.display().to_string())
                    .unwrap_or_else(|_| Cow::from(dir.display().to_string()))
                    .to_string(),
            )
        },
    );

    let mut logger = Logger::try_with_str(env::var("VWM_LOG").unwrap_or_else(
        |_| match args.verbose {
            0 => String::from("info"),
            1 => String::from("debug"),
            _ => String::from("trace"),
        },
    ))
    .context("failed to build the logger specification")?
    .write_mode(WriteMode::BufferAndFlush)
    .adaptive_format_for_stderr(AdaptiveFormat::Custom(uncolored_format, colored_format));

    if config.log_to_file {
        logger = logger
            .duplicate_to_stderr(Duplicate::All)
            .rotate(
                Criterion::AgeOrSize(Age::Day, 50_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(2),
            )
            .log_to_file(FileSpec::default().basename(crate_name!()).directory(&log_dir))
            .format_for_files(uncolored_format);
    }

    // the handle must outlive the process or the flusher shuts down
    std::mem::forget(logger.start().context("failed to start the logger")?);

    Ok(log_dir)
}
