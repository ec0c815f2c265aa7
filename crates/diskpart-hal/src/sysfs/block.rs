//! Helpers related to block devices in sysfs.

use crate::{HalError, HalResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const SYS_CLASS_BLOCK: &str = "/sys/class/block";

pub fn device_basename(path: &Path) -> HalResult<String> {
    let name = path
        .file_name()
        .ok_or_else(|| HalError::Parse(format!("invalid device path {}", path.display())))?
        .to_string_lossy()
        .to_string();
    Ok(name)
}

/// Reads a sector count attribute (`size`, `start`) and converts it to bytes.
///
/// sysfs always expresses these in 512-byte sectors, whatever the logical block size.
pub fn sectors_attr_bytes(sys_block_dev_dir: &Path, attr: &str) -> HalResult<u64> {
    let raw = fs::read_to_string(sys_block_dev_dir.join(attr))?;
    let sectors: u64 = raw
        .trim()
        .parse()
        .map_err(|_| HalError::Parse(format!("bad {} value: {:?}", attr, raw.trim())))?;
    Ok(sectors.saturating_mul(512))
}

/// Partition number from `<dev>/partition`, `None` when the device is not a partition.
pub fn partition_number(sys_block_dev_dir: &Path) -> HalResult<Option<u32>> {
    let attr = sys_block_dev_dir.join("partition");
    if !attr.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(attr)?;
    let num: u32 = raw
        .trim()
        .parse()
        .map_err(|_| HalError::Parse(format!("bad partition number: {:?}", raw.trim())))?;
    Ok(Some(num))
}

/// Kernel name of the disk owning a partition.
///
/// Entries in `/sys/class/block` are symlinks into `/sys/devices/.../<disk>/<part>`, so the
/// parent directory of the resolved link is the disk.
pub fn parent_name(sys_block_dev_dir: &Path) -> HalResult<String> {
    let resolved: PathBuf = fs::canonicalize(sys_block_dev_dir)?;
    let parent = resolved
        .parent()
        .ok_or_else(|| HalError::NoParent(sys_block_dev_dir.display().to_string()))?;
    device_basename(parent)
}

pub fn is_read_only(sys_block_dev_dir: &Path) -> HalResult<bool> {
    let raw = fs::read_to_string(sys_block_dev_dir.join("ro"))?;
    Ok(raw.trim() == "1")
}
