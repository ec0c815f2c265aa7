//! Device references: list index or device name → canonical path.

use crate::errors::CommandError;
use crate::session::DeviceKind;
use diskpart_hal::path::device_path;
use diskpart_hal::{BlockDevice, BlockKind, DiskHal, HalError, PartitionLocation};
use std::path::{Path, PathBuf};

pub struct Resolver<'a> {
    hal: &'a dyn DiskHal,
    root: &'a Path,
}

fn probe_failed(source: HalError) -> CommandError {
    CommandError::Hal {
        op: "enumerate block devices".to_string(),
        source,
    }
}

impl<'a> Resolver<'a> {
    pub fn new(hal: &'a dyn DiskHal, root: &'a Path) -> Self {
        Self { hal, root }
    }

    /// Devices counted by indices of `kind`, in enumerator order.
    ///
    /// `scope` restricts partitions to one disk's children.
    pub fn devices_of(
        &self,
        kind: DeviceKind,
        scope: Option<&Path>,
    ) -> Result<Vec<BlockDevice>, CommandError> {
        let rows = self.hal.block_devices().map_err(probe_failed)?;
        Ok(rows
            .into_iter()
            .filter(|d| match kind {
                DeviceKind::Disk => d.kind == BlockKind::Disk,
                DeviceKind::Partition => {
                    d.kind == BlockKind::Part
                        && scope.map_or(true, |disk| d.parent.as_deref() == Some(disk))
                }
                DeviceKind::Volume => d.is_volume(),
            })
            .collect())
    }

    /// Enumerated row for a path, if the enumerator reports one.
    pub fn row(&self, path: &Path) -> Result<Option<BlockDevice>, CommandError> {
        let rows = self.hal.block_devices().map_err(probe_failed)?;
        Ok(rows.into_iter().find(|d| d.path == path))
    }

    /// Turn a reference into a canonical path without checking that it exists.
    pub fn resolve(
        &self,
        kind: DeviceKind,
        reference: &str,
        scope: Option<&Path>,
    ) -> Result<PathBuf, CommandError> {
        let not_found = || CommandError::NotFound {
            kind,
            reference: reference.to_string(),
        };

        match reference.parse::<i64>() {
            Ok(index) if index > 0 => {
                let devices = self.devices_of(kind, scope)?;
                devices
                    .into_iter()
                    .nth((index - 1) as usize)
                    .map(|d| d.path)
                    .ok_or_else(not_found)
            }
            Ok(_) => Err(not_found()),
            Err(_) => Ok(device_path(self.root, reference)),
        }
    }

    /// [`resolve`](Self::resolve) followed by an existence check.
    pub fn resolve_existing(
        &self,
        kind: DeviceKind,
        reference: &str,
        scope: Option<&Path>,
    ) -> Result<PathBuf, CommandError> {
        let path = self.resolve(kind, reference, scope)?;
        if !self.exists(&path) {
            return Err(CommandError::DeviceNotFound(path));
        }
        Ok(path)
    }

    /// Parent disk and partition number, queried fresh each call.
    pub fn parent_and_number(&self, partition: &Path) -> Result<PartitionLocation, CommandError> {
        match self.hal.partition_of(partition) {
            Ok(loc) if loc.number > 0 => Ok(loc),
            Ok(_) | Err(HalError::NoParent(_)) => {
                Err(CommandError::NoParent(partition.to_path_buf()))
            }
            Err(source) => Err(CommandError::Hal {
                op: format!("locate parent of {}", partition.display()),
                source,
            }),
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.hal.exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskpart_hal::FakeHal;

    const GIB: u64 = 1 << 30;

    fn hal() -> FakeHal {
        FakeHal::new()
            .with_disk("/dev/sda", 100 * GIB)
            .with_partition("/dev/sda", 1, 1, GIB)
            .with_partition("/dev/sda", 2, 1025, GIB)
            .with_disk("/dev/sdb", 200 * GIB)
            .with_partition("/dev/sdb", 1, 1, GIB)
    }

    #[test]
    fn index_counts_only_rows_of_kind() {
        let hal = hal();
        let r = Resolver::new(&hal, Path::new("/dev"));
        assert_eq!(
            r.resolve(DeviceKind::Disk, "2", None).unwrap(),
            PathBuf::from("/dev/sdb")
        );
        assert_eq!(
            r.resolve(DeviceKind::Partition, "3", None).unwrap(),
            PathBuf::from("/dev/sdb1")
        );
    }

    #[test]
    fn out_of_range_and_non_positive_indices_are_not_found() {
        let hal = hal();
        let r = Resolver::new(&hal, Path::new("/dev"));
        for reference in ["3", "0", "-1"] {
            let err = r.resolve(DeviceKind::Disk, reference, None).unwrap_err();
            assert!(matches!(err, CommandError::NotFound { .. }), "{reference}");
        }
    }

    #[test]
    fn scope_limits_partition_indices_to_one_disk() {
        let hal = hal();
        let r = Resolver::new(&hal, Path::new("/dev"));
        assert_eq!(
            r.resolve(DeviceKind::Partition, "1", Some(Path::new("/dev/sdb")))
                .unwrap(),
            PathBuf::from("/dev/sdb1")
        );
        assert!(r
            .resolve(DeviceKind::Partition, "2", Some(Path::new("/dev/sdb")))
            .is_err());
    }

    #[test]
    fn names_are_prefixed_but_not_checked() {
        let hal = hal();
        let r = Resolver::new(&hal, Path::new("/dev"));
        assert_eq!(
            r.resolve(DeviceKind::Disk, "sdz", None).unwrap(),
            PathBuf::from("/dev/sdz")
        );
        let err = r
            .resolve_existing(DeviceKind::Disk, "/dev/sdz", None)
            .unwrap_err();
        assert!(matches!(err, CommandError::DeviceNotFound(_)));
    }

    #[test]
    fn parent_lookup_fails_for_whole_disk() {
        let hal = hal();
        let r = Resolver::new(&hal, Path::new("/dev"));
        let loc = r.parent_and_number(Path::new("/dev/sda2")).unwrap();
        assert_eq!(loc.disk, PathBuf::from("/dev/sda"));
        assert_eq!(loc.number, 2);
        assert!(matches!(
            r.parent_and_number(Path::new("/dev/sda")),
            Err(CommandError::NoParent(_))
        ));
    }
}
