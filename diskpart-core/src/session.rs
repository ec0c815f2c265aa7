//! Selected disk / partition / volume.

use crate::errors::CommandError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Disk,
    Partition,
    Volume,
}

impl DeviceKind {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "disk" => Some(DeviceKind::Disk),
            "partition" | "part" => Some(DeviceKind::Partition),
            "volume" | "vol" => Some(DeviceKind::Volume),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Disk => "disk",
            DeviceKind::Partition => "partition",
            DeviceKind::Volume => "volume",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DeviceKind::Disk => "Disk",
            DeviceKind::Partition => "Partition",
            DeviceKind::Volume => "Volume",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three selection slots. Each is only ever overwritten by a `select` of its own
/// kind; selecting a disk leaves the partition and volume slots alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    disk: Option<PathBuf>,
    partition: Option<PathBuf>,
    volume: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: DeviceKind) -> &mut Option<PathBuf> {
        match kind {
            DeviceKind::Disk => &mut self.disk,
            DeviceKind::Partition => &mut self.partition,
            DeviceKind::Volume => &mut self.volume,
        }
    }

    pub fn select(&mut self, kind: DeviceKind, path: PathBuf) {
        *self.slot_mut(kind) = Some(path);
    }

    pub fn get(&self, kind: DeviceKind) -> Option<&Path> {
        match kind {
            DeviceKind::Disk => self.disk.as_deref(),
            DeviceKind::Partition => self.partition.as_deref(),
            DeviceKind::Volume => self.volume.as_deref(),
        }
    }

    /// Selected device of `kind`, or the missing-selection syntax error.
    pub fn require(&self, kind: DeviceKind) -> Result<PathBuf, CommandError> {
        self.get(kind)
            .map(Path::to_path_buf)
            .ok_or(CommandError::MissingSelection(kind))
    }
}
