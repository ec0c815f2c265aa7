//! Interpreter settings: defaults, overridden from the command line.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROMPT: &str = "DISKPART> ";
pub const DEVICE_ROOT: &str = "/dev";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Prefix for device names given without a path.
    pub device_root: PathBuf,
    pub prompt: String,
    /// Log mutating operations instead of running them.
    pub dry_run: bool,
    /// Pause after the banner, before the first command.
    pub startup_delay: Duration,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            device_root: PathBuf::from(DEVICE_ROOT),
            prompt: DEFAULT_PROMPT.to_string(),
            dry_run: false,
            startup_delay: Duration::ZERO,
        }
    }
}

impl InterpreterConfig {
    /// Startup delay in whole seconds; negative values mean no delay.
    pub fn with_startup_delay_secs(mut self, secs: i64) -> Self {
        self.startup_delay = Duration::from_secs(secs.max(0) as u64);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
