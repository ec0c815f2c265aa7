//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them and keeps a small
//! in-memory model of the device tree (partitions appear on `mkpart`, loop devices on
//! attach), allowing for CI-safe testing without root privileges or real hardware.

use super::{
    BlockDevice, BlockKind, BlockProbe, DiskExecutor, DiskOp, Extent, LoopDevice, PartedOp,
    PartitionLocation,
};
use crate::path::partition_path;
use crate::{HalError, HalResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MIB: u64 = 1024 * 1024;

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<DiskOp>,
    devices: Vec<BlockDevice>,
    /// Regular files that exist (vdisk backing files) and their sizes in bytes
    files: HashMap<PathBuf, u64>,
    loops: Vec<LoopDevice>,
    read_only: HashSet<PathBuf>,
    starts: HashMap<PathBuf, u64>,
    /// Programs whose ops fail instead of being applied
    failing: HashSet<&'static str>,
    unprivileged: bool,
}

impl FakeHalState {
    fn children_of(&self, disk: &Path) -> Vec<&BlockDevice> {
        self.devices
            .iter()
            .filter(|d| d.kind == BlockKind::Part && d.parent.as_deref() == Some(disk))
            .collect()
    }

    fn number_of(&self, partition: &Path) -> Option<PartitionLocation> {
        let row = self.devices.iter().find(|d| d.path == partition)?;
        if row.kind != BlockKind::Part {
            return None;
        }
        let disk = row.parent.clone()?;
        let disk_str = disk.to_string_lossy();
        let suffix = partition.to_string_lossy();
        let suffix = suffix.strip_prefix(disk_str.as_ref())?;
        let number: u32 = suffix.trim_start_matches('p').parse().ok()?;
        if number == 0 {
            return None;
        }
        Some(PartitionLocation { disk, number })
    }

    fn apply_parted(&mut self, disk: &Path, op: &PartedOp) {
        match op {
            PartedOp::MkLabel { .. } => {
                let children: Vec<PathBuf> =
                    self.children_of(disk).iter().map(|d| d.path.clone()).collect();
                self.devices.retain(|d| !children.contains(&d.path));
            }
            PartedOp::MkPart { start, end, .. } => {
                // parted hands out the lowest free number
                let taken: HashSet<u32> = self
                    .children_of(disk)
                    .iter()
                    .filter_map(|d| self.number_of(&d.path))
                    .map(|loc| loc.number)
                    .collect();
                let next = (1u32..).find(|n| !taken.contains(n)).unwrap_or(1);
                let path = PathBuf::from(partition_path(&disk.to_string_lossy(), next));
                let start_bytes = match start {
                    Extent::Mib(v) => v * MIB,
                    Extent::EndOfDisk => 0,
                };
                let size = match (start, end) {
                    (Extent::Mib(s), Extent::Mib(e)) => e.saturating_sub(*s) * MIB,
                    _ => 0,
                };
                self.starts.insert(path.clone(), start_bytes);
                let insert_at = self
                    .devices
                    .iter()
                    .rposition(|d| d.path == disk || d.parent.as_deref() == Some(disk))
                    .map(|i| i + 1)
                    .unwrap_or(self.devices.len());
                self.devices.insert(
                    insert_at,
                    BlockDevice::new(path, BlockKind::Part, size).with_parent(disk),
                );
            }
            PartedOp::Rm { part_num } => {
                let path = PathBuf::from(partition_path(&disk.to_string_lossy(), *part_num));
                self.devices.retain(|d| d.path != path);
            }
            PartedOp::SetFlag { .. } | PartedOp::ResizePart { .. } => {}
        }
    }

    fn apply(&mut self, op: &DiskOp) -> String {
        match op {
            DiskOp::Parted { disk, op } => self.apply_parted(disk, op),
            DiskOp::WipeSignatures { device } => {
                let children: Vec<PathBuf> = self
                    .children_of(device)
                    .iter()
                    .map(|d| d.path.clone())
                    .collect();
                self.devices.retain(|d| !children.contains(&d.path));
                if let Some(row) = self.devices.iter_mut().find(|d| &d.path == device) {
                    row.fstype = None;
                }
            }
            DiskOp::Mkfs { device, spec } => {
                if let Some(row) = self.devices.iter_mut().find(|d| &d.path == device) {
                    row.fstype = Some(spec.fs.name().to_string());
                    row.label = spec.label.clone();
                }
            }
            DiskOp::CreateBackingFile { path, size_mib, .. } => {
                self.files.insert(path.clone(), size_mib * MIB);
            }
            DiskOp::GrowBackingFile { path, size_mib } => {
                let size = self.files.entry(path.clone()).or_insert(0);
                *size = (*size).max(size_mib * MIB);
            }
            DiskOp::LoopAttach { image, read_only } => {
                let device = PathBuf::from(format!("/dev/loop{}", self.loops.len()));
                self.loops.push(LoopDevice {
                    device: device.clone(),
                    backing_file: image.clone(),
                    read_only: *read_only,
                });
                self.devices
                    .push(BlockDevice::new(device.clone(), BlockKind::Loop, 0));
                return device.display().to_string();
            }
            DiskOp::LoopDetach { device } => {
                self.loops.retain(|l| &l.device != device);
                self.devices.retain(|d| &d.path != device);
            }
            DiskOp::RaidCreate { array, .. } => {
                self.devices
                    .push(BlockDevice::new(array.clone(), BlockKind::Raid, 0));
            }
            DiskOp::SetReadOnly { device, read_only } => {
                if *read_only {
                    self.read_only.insert(device.clone());
                } else {
                    self.read_only.remove(device);
                }
            }
            DiskOp::DiskId { id, .. } => {
                return id.clone().unwrap_or_else(|| "0xfa4e0001".to_string());
            }
            DiskOp::Mount { device, target, .. } => {
                if let Some(row) = self.devices.iter_mut().find(|d| &d.path == device) {
                    row.mountpoint = Some(target.clone());
                }
            }
            DiskOp::Unmount { target } => {
                for row in self.devices.iter_mut() {
                    if row.mountpoint.as_deref() == Some(target.as_path()) {
                        row.mountpoint = None;
                    }
                }
            }
            _ => {}
        }
        String::new()
    }
}

/// Fake HAL implementation that records operations without executing them.
///
/// This is designed for testing and CI environments where real system
/// operations would fail or be dangerous. It starts privileged and empty.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
        }
    }

    /// Add a device row, in enumeration order.
    pub fn with_device(self, device: BlockDevice) -> Self {
        self.state.lock().unwrap().devices.push(device);
        self
    }

    pub fn with_disk(self, path: &str, size_bytes: u64) -> Self {
        self.with_device(BlockDevice::new(path, BlockKind::Disk, size_bytes))
    }

    /// Add partition `number` of `disk`, starting at `start_mib`.
    pub fn with_partition(self, disk: &str, number: u32, start_mib: u64, size_bytes: u64) -> Self {
        let path = PathBuf::from(partition_path(disk, number));
        self.state
            .lock()
            .unwrap()
            .starts
            .insert(path.clone(), start_mib * MIB);
        self.with_device(BlockDevice::new(path, BlockKind::Part, size_bytes).with_parent(disk))
    }

    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_sized_file(path, 0)
    }

    pub fn with_sized_file(self, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.into(), size_bytes);
        self
    }

    pub fn set_privileged(&self, privileged: bool) {
        self.state.lock().unwrap().unprivileged = !privileged;
    }

    /// Make every op carried out by `program` fail with a non-zero status.
    pub fn fail_program(&self, program: &'static str) {
        self.state.lock().unwrap().failing.insert(program);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<DiskOp> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&DiskOp) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Current device rows.
    pub fn devices(&self) -> Vec<BlockDevice> {
        self.state.lock().unwrap().devices.clone()
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        self.state.lock().unwrap().operations.clear();
    }
}

impl DiskExecutor for FakeHal {
    fn execute(&self, op: &DiskOp) -> HalResult<String> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(op.clone());

        if state.failing.contains(op.program()) {
            log::info!("FAKE HAL: {} (failing)", op);
            return Err(HalError::CommandFailed {
                program: op.program().to_string(),
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }

        log::info!("FAKE HAL: {}", op);
        Ok(state.apply(op))
    }
}

impl BlockProbe for FakeHal {
    fn block_devices(&self) -> HalResult<Vec<BlockDevice>> {
        Ok(self.state.lock().unwrap().devices.clone())
    }

    fn partition_of(&self, partition: &Path) -> HalResult<PartitionLocation> {
        self.state
            .lock()
            .unwrap()
            .number_of(partition)
            .ok_or_else(|| HalError::NoParent(partition.display().to_string()))
    }

    fn partition_start_bytes(&self, partition: &Path) -> HalResult<u64> {
        self.state
            .lock()
            .unwrap()
            .starts
            .get(partition)
            .copied()
            .ok_or_else(|| HalError::NoParent(partition.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.devices.iter().any(|d| d.path == path)
    }

    fn file_size_bytes(&self, path: &Path) -> HalResult<u64> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .copied()
            .ok_or_else(|| {
                HalError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    path.display().to_string(),
                ))
            })
    }

    fn is_privileged(&self) -> bool {
        !self.state.lock().unwrap().unprivileged
    }

    fn is_read_only(&self, device: &Path) -> HalResult<bool> {
        Ok(self.state.lock().unwrap().read_only.contains(device))
    }

    fn loop_devices(&self) -> HalResult<Vec<LoopDevice>> {
        Ok(self.state.lock().unwrap().loops.clone())
    }
}
