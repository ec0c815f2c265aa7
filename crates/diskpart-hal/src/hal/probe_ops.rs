//! Read-only device queries (lsblk, sysfs, losetup).

use crate::HalResult;
use std::path::{Path, PathBuf};

/// Device type as reported by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Disk,
    Part,
    Loop,
    Raid,
    Rom,
    Other(String),
}

impl BlockKind {
    /// Map an lsblk `TYPE` column value.
    pub fn from_lsblk(value: &str) -> Self {
        match value {
            "disk" => BlockKind::Disk,
            "part" => BlockKind::Part,
            "loop" => BlockKind::Loop,
            "rom" => BlockKind::Rom,
            v if v.starts_with("raid") => BlockKind::Raid,
            other => BlockKind::Other(other.to_string()),
        }
    }
}

/// One enumerated block device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub path: PathBuf,
    pub kind: BlockKind,
    pub size_bytes: u64,
    pub fstype: Option<String>,
    pub label: Option<String>,
    pub mountpoint: Option<PathBuf>,
    /// Canonical path of the kernel parent (partitions and md members).
    pub parent: Option<PathBuf>,
}

impl BlockDevice {
    pub fn new(path: impl Into<PathBuf>, kind: BlockKind, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            kind,
            size_bytes,
            fstype: None,
            label: None,
            mountpoint: None,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_fstype(mut self, fstype: impl Into<String>) -> Self {
        self.fstype = Some(fstype.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_mountpoint(mut self, mountpoint: impl Into<PathBuf>) -> Self {
        self.mountpoint = Some(mountpoint.into());
        self
    }

    /// A row that `list volume` shows: anything carrying a filesystem that is not a whole disk.
    pub fn is_volume(&self) -> bool {
        self.fstype.is_some()
            && matches!(
                self.kind,
                BlockKind::Part | BlockKind::Raid | BlockKind::Loop
            )
    }
}

/// Parent disk and 1-based partition number of a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLocation {
    pub disk: PathBuf,
    pub number: u32,
}

/// An attached loop device and the file behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopDevice {
    pub device: PathBuf,
    pub backing_file: PathBuf,
    pub read_only: bool,
}

pub trait BlockProbe {
    /// All block devices, in enumerator order.
    fn block_devices(&self) -> HalResult<Vec<BlockDevice>>;

    /// Parent disk and partition number; `HalError::NoParent` when `partition` is not one.
    fn partition_of(&self, partition: &Path) -> HalResult<PartitionLocation>;

    /// Byte offset where the partition starts on its disk.
    fn partition_start_bytes(&self, partition: &Path) -> HalResult<u64>;

    fn exists(&self, path: &Path) -> bool;

    /// Size in bytes of a regular file (vdisk backing files).
    fn file_size_bytes(&self, path: &Path) -> HalResult<u64>;

    /// Whether the current process may modify block devices.
    fn is_privileged(&self) -> bool;

    fn is_read_only(&self, device: &Path) -> HalResult<bool>;

    fn loop_devices(&self) -> HalResult<Vec<LoopDevice>>;
}
