//! One module per group of related verbs.
//!
//! Every handler checks its preconditions in the same order: selection, arguments,
//! privilege, then device resolution. Only after all four pass is an operation
//! submitted.

pub mod create;
pub mod disk;
pub mod info;
pub mod list;
pub mod partition;
pub mod select;
pub mod vdisk;
pub mod volume;

use crate::args::ArgView;
use crate::errors::CommandError;
use crate::session::DeviceKind;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Size with the largest unit that keeps at least four significant digits below 10240.
pub(crate) fn format_size(bytes: u64) -> String {
    let mut value = bytes;
    let mut unit = 0;
    while value >= 10 * 1024 && unit < UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }
    format!("{} {}", value, UNITS[unit])
}

/// Leading `disk` / `volume` word; `default` when the first word is something else.
pub(crate) fn target_kind(args: &ArgView, default: DeviceKind) -> DeviceKind {
    args.positional(0)
        .and_then(DeviceKind::parse)
        .unwrap_or(default)
}

/// First positional word parsed as a kind, or a syntax error quoting `usage`.
pub(crate) fn required_kind(args: &ArgView, usage: &str) -> Result<DeviceKind, CommandError> {
    args.positional(0)
        .and_then(DeviceKind::parse)
        .ok_or_else(|| CommandError::syntax(usage))
}
