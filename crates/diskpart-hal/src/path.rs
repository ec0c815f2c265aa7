use std::path::{Path, PathBuf};

/// Directory canonical device paths live under.
pub const DEVICE_ROOT: &str = "/dev";

/// Partition path helper for block devices. Disks whose name ends in a digit
/// (nvme0n1, mmcblk0, loop3, md0) take a `p` separator.
pub fn partition_path(disk: &str, num: u32) -> String {
    if disk.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{}p{}", disk, num)
    } else {
        format!("{}{}", disk, num)
    }
}

/// Canonical path for a device name: kept when already under `root`, otherwise joined to it.
pub fn device_path(root: &Path, name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.starts_with(root) {
        candidate.to_path_buf()
    } else {
        root.join(name.trim_start_matches('/'))
    }
}
