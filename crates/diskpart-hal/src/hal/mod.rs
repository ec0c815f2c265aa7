//! HAL trait definitions and implementations.
//!
//! This module defines the operation descriptors and the traits that carry them out,
//! and provides both real (LinuxHal) and fake (FakeHal) implementations.

pub mod fake_hal;
pub mod format_ops;
pub mod linux_hal;
pub mod ops;
pub mod partition_ops;
pub mod probe_ops;

pub use fake_hal::FakeHal;
pub use format_ops::{FormatSpec, FsType};
pub use linux_hal::LinuxHal;
pub use ops::{DiskOp, RaidLevel};
pub use partition_ops::{Extent, PartedOp, TableKind};
pub use probe_ops::{BlockDevice, BlockKind, BlockProbe, LoopDevice, PartitionLocation};

use crate::HalResult;

/// Carries out world-touching operations.
pub trait DiskExecutor {
    /// Run one operation to completion, returning whatever the tool printed (trimmed).
    fn execute(&self, op: &DiskOp) -> HalResult<String>;
}

/// Complete HAL combining execution and probing.
pub trait DiskHal: DiskExecutor + BlockProbe {}

/// Automatically implement DiskHal for any type implementing all required traits.
impl<T> DiskHal for T where T: DiskExecutor + BlockProbe {}
