//! Command line interface definition
//!
//! mfsync takes exactly one positional token. Anything else, including
//! `--help`, prints the same usage text and exits non-zero.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: mfsync <--dry-run | DESTINATION>

Verify that every file listed in FILELIST is present in INPUTDIR and, given a
destination, copy exactly those files there (size-only sync).

Arguments:
  --dry-run      verify only; by checksum when CHECKMD5 is true
  DESTINATION    existing directory to copy the listed files into
  -h, --help     print this help

Settings (mfsync.toml, $MFSYNC_CONFIG, or environment):
  FILELIST       manifest: relative paths, or `<checksum>  <path>` lines
  INPUTDIR       source directory
  CHECKMD5       true to verify by checksum, false for existence only
  CHECKSUM_ALGO  md5 (default) or blake3
  TRANSFER       native (default) or rsync
";

/// Raw argument capture; interpretation happens in [`Invocation::from_args`]
#[derive(Parser, Debug)]
#[command(name = "mfsync")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    pub args: Vec<String>,
}

/// What the single positional token asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Run(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Verify only
    DryRun,
    /// Existence-check, then copy into the directory
    Materialize(PathBuf),
}

impl Invocation {
    /// Parse process arguments (including the program name)
    ///
    /// Returns `None` for a usage error: no token, two or more tokens, or
    /// arguments clap cannot capture. Tokens are counted before clap sees
    /// them, so a literal `--` counts as a token.
    pub fn parse_from<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if args.len() != 2 {
            return None;
        }
        let cli = Cli::try_parse_from(args).ok()?;
        Self::from_args(&cli.args)
    }

    #[must_use]
    pub fn from_args(args: &[String]) -> Option<Self> {
        let [token] = args else {
            return None;
        };
        Some(match token.as_str() {
            "--help" | "-h" => Self::Help,
            "--dry-run" => Self::Run(Command::DryRun),
            dir => Self::Run(Command::Materialize(PathBuf::from(dir))),
        })
    }
}
