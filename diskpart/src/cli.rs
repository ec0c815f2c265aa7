//! Command-line parsing.
//!
//! Accepts the classic `/s`, `/t`, `/?` spellings next to the dash forms.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use diskpart_core::ExitCode;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: diskpart [-s <script>] [-t <seconds>] [-? | -h] [--dry-run]";

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "diskpart")]
#[command(about = "DiskPart (Linux compatibility mode)")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Run the commands in SCRIPT, then exit
    #[arg(short = 's', value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Seconds to wait after the banner before reading commands
    #[arg(short = 't', value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Show usage and the list of commands
    #[arg(short = 'h', action = ArgAction::SetTrue)]
    pub help: bool,

    /// Log changes instead of making them
    #[arg(long)]
    pub dry_run: bool,
}

/// Map `/x` and `-?` spellings onto the flags clap knows.
fn normalize(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('/' | '-'), Some('?'), None) => OsString::from("-h"),
        (Some('/' | '-'), Some(c), None) if matches!(c.to_ascii_lowercase(), 's' | 't' | 'h') => {
            OsString::from(format!("-{}", c.to_ascii_lowercase()))
        }
        _ => arg,
    }
}

pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let program = args.next().unwrap_or_else(|| OsString::from("diskpart"));
    let mut takes_value = false;
    let args = args.map(|arg| {
        if std::mem::take(&mut takes_value) {
            return arg;
        }
        let arg = normalize(arg);
        takes_value = arg == "-s" || arg == "-t";
        arg
    });
    Cli::try_parse_from(std::iter::once(program).chain(args))
}

/// Stray words and unknown flags are syntax errors; bad or missing flag values are argument errors.
pub fn exit_code_for(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::UnknownArgument | ErrorKind::ArgumentConflict => ExitCode::Syntax,
        _ => ExitCode::CmdArg,
    }
}
