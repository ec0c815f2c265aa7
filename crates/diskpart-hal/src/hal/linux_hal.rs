//! Linux HAL implementation using real system tools and syscalls.

use super::{
    BlockDevice, BlockProbe, DiskExecutor, DiskOp, LoopDevice, PartitionLocation, RaidLevel,
};
use crate::lsblk::{parse_lsblk_json, parse_losetup_json, LSBLK_COLUMNS};
use crate::path::DEVICE_ROOT;
use crate::sysfs::block::{self, SYS_CLASS_BLOCK};
use crate::{HalError, HalResult};
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    dry_run: bool,
    sys_block_dir: PathBuf,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new(false)
    }
}

impl LinuxHal {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            sys_block_dir: PathBuf::from(SYS_CLASS_BLOCK),
        }
    }

    /// Read sysfs attributes from somewhere other than `/sys/class/block`.
    pub fn with_sys_block_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sys_block_dir = dir.into();
        self
    }

    fn sys_dir_for(&self, device: &Path) -> HalResult<PathBuf> {
        Ok(self.sys_block_dir.join(block::device_basename(device)?))
    }
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);
const PARTED_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const WIPEFS_TIMEOUT: Duration = Duration::from_secs(60);
const DISCARD_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);
const FORMAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const FSCK_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
const LOSETUP_TIMEOUT: Duration = Duration::from_secs(30);
const MDADM_TIMEOUT: Duration = Duration::from_secs(60);
const SFDISK_TIMEOUT: Duration = Duration::from_secs(60);
const FILE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const ZERO_CHUNK: usize = 4 * 1024 * 1024;

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// Run `program args...` and return trimmed stdout, failing on a non-zero status.
fn run(program: &str, args: &[String], timeout: Duration) -> HalResult<String> {
    log::info!("exec: {} {}", program, args.join(" "));
    let mut cmd = Command::new(program);
    cmd.args(args);
    let output = output_with_timeout(program, &mut cmd, timeout)?;
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::DeviceBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

/// Overwrite every byte of `device` with zeros.
fn zero_fill(device: &Path) -> HalResult<()> {
    let mut out = fs::OpenOptions::new().write(true).open(device)?;
    let len = out.seek(SeekFrom::End(0))?;
    out.seek(SeekFrom::Start(0))?;

    let mut zeros = io::repeat(0).take(len);
    let mut buf = vec![0u8; ZERO_CHUNK];
    loop {
        let n = zeros.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }
    out.sync_all()?;
    Ok(())
}

impl LinuxHal {
    fn set_device_state(&self, device: &Path, online: bool) -> HalResult<()> {
        let state = self.sys_dir_for(device)?.join("device/state");
        let value = if online { "running" } else { "offline" };
        log::info!("write {} > {}", value, state.display());
        fs::write(&state, value).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => HalError::Other(format!(
                "{} has no device state control",
                device.display()
            )),
            io::ErrorKind::PermissionDenied => HalError::PermissionDenied,
            _ => HalError::Io(e),
        })
    }

    fn mount(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()> {
        fs::create_dir_all(target)?;
        nix::mount::mount(
            Some(device),
            target,
            fstype,
            nix::mount::MsFlags::empty(),
            None::<&str>,
        )
        .map_err(map_nix_err)
    }
}

impl DiskExecutor for LinuxHal {
    fn execute(&self, op: &DiskOp) -> HalResult<String> {
        if self.dry_run && !op.is_query() {
            log::info!("DRY RUN: {}", op);
            return Ok(String::new());
        }

        match op {
            DiskOp::Parted { disk, op } => {
                let mut args = vec!["-s".to_string(), display(disk)];
                args.extend(op.to_args());
                run("parted", &args, PARTED_TIMEOUT)
            }
            DiskOp::WipeSignatures { device } => {
                run("wipefs", &["-a".to_string(), display(device)], WIPEFS_TIMEOUT)
            }
            DiskOp::Discard { device } => {
                run("blkdiscard", &["-z".to_string(), display(device)], DISCARD_TIMEOUT)
            }
            DiskOp::ZeroFill { device } => {
                log::info!("zero-fill {}", device.display());
                zero_fill(device)?;
                Ok(String::new())
            }
            DiskOp::Mkfs { device, spec } => run(
                &spec.fs.mkfs_program(),
                &spec.to_args(&display(device)),
                FORMAT_TIMEOUT,
            ),
            DiskOp::Fsck { device, repair } => {
                let flag = if *repair { "-y" } else { "-n" };
                run("fsck", &[flag.to_string(), display(device)], FSCK_TIMEOUT)
            }
            DiskOp::LoopAttach { image, read_only } => {
                let mut args = vec!["--show".to_string(), "-f".to_string(), "-P".to_string()];
                if *read_only {
                    args.push("-r".to_string());
                }
                args.push(display(image));
                run("losetup", &args, LOSETUP_TIMEOUT)
            }
            DiskOp::LoopDetach { device } => {
                run("losetup", &["-d".to_string(), display(device)], LOSETUP_TIMEOUT)
            }
            DiskOp::CreateBackingFile {
                path,
                size_mib,
                preallocate,
            } => {
                let size = format!("{}M", size_mib);
                if *preallocate {
                    run(
                        "fallocate",
                        &["-l".to_string(), size, display(path)],
                        FILE_TIMEOUT,
                    )
                } else {
                    run(
                        "truncate",
                        &["-s".to_string(), size, display(path)],
                        FILE_TIMEOUT,
                    )
                }
            }
            DiskOp::GrowBackingFile { path, size_mib } => run(
                "truncate",
                &["-s".to_string(), format!(">{}M", size_mib), display(path)],
                FILE_TIMEOUT,
            ),
            DiskOp::RaidCreate {
                array,
                level,
                members,
            } => {
                let mut args = vec![
                    "--create".to_string(),
                    display(array),
                    "--run".to_string(),
                    format!("--level={}", level.as_mdadm()),
                    format!("--raid-devices={}", members.len()),
                ];
                if *level == RaidLevel::Mirror {
                    args.push("--metadata=1.2".to_string());
                }
                args.extend(members.iter().map(|m| display(m)));
                run("mdadm", &args, MDADM_TIMEOUT)
            }
            DiskOp::RaidAdd { array, member } => run(
                "mdadm",
                &[
                    "--manage".to_string(),
                    display(array),
                    "--add".to_string(),
                    display(member),
                ],
                MDADM_TIMEOUT,
            ),
            DiskOp::RaidRemove { array, member } => run(
                "mdadm",
                &[
                    "--manage".to_string(),
                    display(array),
                    "--fail".to_string(),
                    display(member),
                    "--remove".to_string(),
                    display(member),
                ],
                MDADM_TIMEOUT,
            ),
            DiskOp::Rescan { disk } => {
                let args: Vec<String> = disk.iter().map(|d| display(d)).collect();
                run("partprobe", &args, SETTLE_TIMEOUT)?;
                run("udevadm", &["settle".to_string()], SETTLE_TIMEOUT)
            }
            DiskOp::SetReadOnly { device, read_only } => {
                let flag = if *read_only { "--setro" } else { "--setrw" };
                run("blockdev", &[flag.to_string(), display(device)], PROBE_TIMEOUT)
            }
            DiskOp::SetDeviceState { device, online } => {
                self.set_device_state(device, *online)?;
                Ok(String::new())
            }
            DiskOp::DiskId { disk, id } => {
                let mut args = vec!["--disk-id".to_string(), display(disk)];
                args.extend(id.iter().cloned());
                run("sfdisk", &args, SFDISK_TIMEOUT)
            }
            DiskOp::PartType { disk, number, id } => run(
                "sfdisk",
                &[
                    "--part-type".to_string(),
                    display(disk),
                    number.to_string(),
                    id.clone(),
                ],
                SFDISK_TIMEOUT,
            ),
            DiskOp::PartAttrs {
                disk,
                number,
                attrs,
            } => run(
                "sfdisk",
                &[
                    "--part-attrs".to_string(),
                    display(disk),
                    number.to_string(),
                    attrs.clone(),
                ],
                SFDISK_TIMEOUT,
            ),
            DiskOp::Mount {
                device,
                target,
                fstype,
            } => {
                log::info!("mount {} -> {}", device.display(), target.display());
                self.mount(device, target, fstype.as_deref())?;
                Ok(String::new())
            }
            DiskOp::Unmount { target } => {
                log::info!("unmount {}", target.display());
                nix::mount::umount2(target, nix::mount::MntFlags::empty()).map_err(map_nix_err)?;
                Ok(String::new())
            }
        }
    }
}

impl BlockProbe for LinuxHal {
    fn block_devices(&self) -> HalResult<Vec<BlockDevice>> {
        let args = [
            "-J".to_string(),
            "-l".to_string(),
            "-b".to_string(),
            "-p".to_string(),
            "-o".to_string(),
            LSBLK_COLUMNS.to_string(),
        ];
        let stdout = run("lsblk", &args, PROBE_TIMEOUT)?;
        parse_lsblk_json(&stdout)
    }

    fn partition_of(&self, partition: &Path) -> HalResult<PartitionLocation> {
        let dir = self.sys_dir_for(partition)?;
        let no_parent = || HalError::NoParent(partition.display().to_string());
        let number = match block::partition_number(&dir) {
            Ok(Some(n)) if n > 0 => n,
            Ok(_) => return Err(no_parent()),
            Err(HalError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(no_parent())
            }
            Err(e) => return Err(e),
        };
        let disk = Path::new(DEVICE_ROOT).join(block::parent_name(&dir)?);
        Ok(PartitionLocation { disk, number })
    }

    fn partition_start_bytes(&self, partition: &Path) -> HalResult<u64> {
        block::sectors_attr_bytes(&self.sys_dir_for(partition)?, "start")
    }

    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn file_size_bytes(&self, path: &Path) -> HalResult<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn is_privileged(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn is_read_only(&self, device: &Path) -> HalResult<bool> {
        block::is_read_only(&self.sys_dir_for(device)?)
    }

    fn loop_devices(&self) -> HalResult<Vec<LoopDevice>> {
        let stdout = run(
            "losetup",
            &["-J".to_string(), "-l".to_string()],
            LOSETUP_TIMEOUT,
        )?;
        parse_losetup_json(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{Extent, PartedOp};
    use tempfile::tempdir;

    #[test]
    fn dry_run_skips_mutating_ops() {
        let hal = LinuxHal::new(true);
        let out = hal
            .execute(&DiskOp::Parted {
                disk: PathBuf::from("/dev/nonexistent-disk"),
                op: PartedOp::MkPart {
                    part_type: "primary".to_string(),
                    fs_type: None,
                    start: Extent::Mib(1),
                    end: Extent::EndOfDisk,
                },
            })
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn missing_tool_maps_to_command_not_found() {
        let err = run("diskpart-no-such-tool", &[], PROBE_TIMEOUT).unwrap_err();
        assert!(matches!(err, HalError::CommandNotFound(_)));
    }

    #[test]
    fn zero_fill_overwrites_regular_file() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("disk.img");
        fs::write(&image, vec![0xAAu8; 10_000]).unwrap();

        let hal = LinuxHal::new(false);
        hal.execute(&DiskOp::ZeroFill {
            device: image.clone(),
        })
        .unwrap();

        let data = fs::read(&image).unwrap();
        assert_eq!(data.len(), 10_000);
        assert!(data.iter().all(|b| *b == 0));
    }

    #[test]
    fn grow_backing_file_keeps_larger_image() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("vdisk.img");
        fs::write(&image, vec![0xAAu8; 8 * 1024 * 1024]).unwrap();

        let hal = LinuxHal::new(false);
        hal.execute(&DiskOp::GrowBackingFile {
            path: image.clone(),
            size_mib: 1,
        })
        .unwrap();

        assert_eq!(hal.file_size_bytes(&image).unwrap(), 8 * 1024 * 1024);
        assert!(fs::read(&image).unwrap().iter().all(|b| *b == 0xAA));
    }

    #[test]
    fn partition_of_reads_fake_sysfs() {
        let tmp = tempdir().unwrap();
        let part_dir = tmp.path().join("devices/vdb/vdb3");
        fs::create_dir_all(&part_dir).unwrap();
        fs::write(part_dir.join("partition"), "3\n").unwrap();
        fs::write(part_dir.join("start"), "4096\n").unwrap();
        let class = tmp.path().join("class");
        fs::create_dir_all(class.join("vdb")).unwrap();
        std::os::unix::fs::symlink(&part_dir, class.join("vdb3")).unwrap();

        let hal = LinuxHal::new(false).with_sys_block_dir(&class);
        let loc = hal.partition_of(Path::new("/dev/vdb3")).unwrap();
        assert_eq!(loc.disk, PathBuf::from("/dev/vdb"));
        assert_eq!(loc.number, 3);
        assert_eq!(
            hal.partition_start_bytes(Path::new("/dev/vdb3")).unwrap(),
            2 * 1024 * 1024
        );

        let err = hal.partition_of(Path::new("/dev/vdb")).unwrap_err();
        assert!(matches!(err, HalError::NoParent(_)));
        let err = hal.partition_of(Path::new("/dev/vdz9")).unwrap_err();
        assert!(matches!(err, HalError::NoParent(_)));
    }
}
