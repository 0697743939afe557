//! The command line arguments

use clap::{crate_description, Parser, ValueHint};
use std::path::PathBuf;

/// Options for the `vwm` program
#[derive(Parser, Default, Clone, Debug, PartialEq, Eq)]
#[clap(
    about = crate_description!(),
    disable_version_flag = true,
    max_term_width = 100
)]
pub(crate) struct Opts {
    /// Print version information and exit
    #[clap(short = 'v', long = "version")]
    pub(crate) version: bool,

    /// Display debugging messages on various levels
    #[clap(
        long,
        short = 'V',
        parse(from_occurrences),
        long_help = "\
        Set the verbosity level of the program. There are 2 extra levels after the default \
                     (INFO). If `-V` is used, DEBUG messages are displayed, and if `-VV` is used \
                     TRACE messages are displayed. The verbosity can also be set with the \
                     `VWM_LOG` environment variable"
    )]
    pub(crate) verbose: u8,

    /// Location of configuration file
    #[clap(
        long,
        short,
        value_name = "file",
        value_hint = ValueHint::FilePath,
        long_help = "\
        Specify the location of the configuration file. The default location is \
                     `$XDG_CONFIG_HOME/vwm/vwm.yml`"
    )]
    pub(crate) config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::Opts;
    use clap::Parser;

    #[test]
    fn version_flag_is_lowercase_v() {
        let opts = Opts::parse_from(["vwm", "-v"]);
        assert!(opts.version);
        assert_eq!(opts.verbose, 0);
    }

    #[test]
    fn verbosity_accumulates() {
        let opts = Opts::parse_from(["vwm", "-VV"]);
        assert_eq!(opts.verbose, 2);
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(Opts::try_parse_from(["vwm", "--frobnicate"]).is_err());
    }
}
