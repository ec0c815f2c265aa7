//! Operation descriptors handed to a [`DiskExecutor`](super::DiskExecutor).
//!
//! Every world-touching action the shell can take is one variant here, carrying typed
//! parameters. Backends decide how to carry it out; nothing upstream builds command lines.

use super::format_ops::FormatSpec;
use super::partition_ops::PartedOp;
use std::fmt;
use std::path::PathBuf;

/// md RAID level for a new array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidLevel {
    Stripe,
    Mirror,
    Parity,
}

impl RaidLevel {
    pub fn as_mdadm(&self) -> &'static str {
        match self {
            RaidLevel::Stripe => "0",
            RaidLevel::Mirror => "1",
            RaidLevel::Parity => "5",
        }
    }

    /// Smallest member count mdadm accepts for the level.
    pub fn min_members(&self) -> usize {
        match self {
            RaidLevel::Stripe | RaidLevel::Mirror => 2,
            RaidLevel::Parity => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskOp {
    Parted {
        disk: PathBuf,
        op: PartedOp,
    },
    WipeSignatures {
        device: PathBuf,
    },
    Discard {
        device: PathBuf,
    },
    ZeroFill {
        device: PathBuf,
    },
    Mkfs {
        device: PathBuf,
        spec: FormatSpec,
    },
    Fsck {
        device: PathBuf,
        repair: bool,
    },
    LoopAttach {
        image: PathBuf,
        read_only: bool,
    },
    LoopDetach {
        device: PathBuf,
    },
    CreateBackingFile {
        path: PathBuf,
        size_mib: u64,
        preallocate: bool,
    },
    /// Grow a backing file to at least `size_mib`; never shrinks it.
    GrowBackingFile {
        path: PathBuf,
        size_mib: u64,
    },
    RaidCreate {
        array: PathBuf,
        level: RaidLevel,
        members: Vec<PathBuf>,
    },
    RaidAdd {
        array: PathBuf,
        member: PathBuf,
    },
    RaidRemove {
        array: PathBuf,
        member: PathBuf,
    },
    Rescan {
        disk: Option<PathBuf>,
    },
    SetReadOnly {
        device: PathBuf,
        read_only: bool,
    },
    SetDeviceState {
        device: PathBuf,
        online: bool,
    },
    DiskId {
        disk: PathBuf,
        id: Option<String>,
    },
    PartType {
        disk: PathBuf,
        number: u32,
        id: String,
    },
    PartAttrs {
        disk: PathBuf,
        number: u32,
        attrs: String,
    },
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: Option<String>,
    },
    Unmount {
        target: PathBuf,
    },
}

impl DiskOp {
    /// Name of the tool (or facility) that carries the op out.
    pub fn program(&self) -> &'static str {
        match self {
            DiskOp::Parted { .. } => "parted",
            DiskOp::WipeSignatures { .. } => "wipefs",
            DiskOp::Discard { .. } => "blkdiscard",
            DiskOp::ZeroFill { .. } => "zero-fill",
            DiskOp::Mkfs { .. } => "mkfs",
            DiskOp::Fsck { .. } => "fsck",
            DiskOp::LoopAttach { .. } | DiskOp::LoopDetach { .. } => "losetup",
            DiskOp::CreateBackingFile {
                preallocate: true, ..
            } => "fallocate",
            DiskOp::CreateBackingFile { .. } | DiskOp::GrowBackingFile { .. } => "truncate",
            DiskOp::RaidCreate { .. } | DiskOp::RaidAdd { .. } | DiskOp::RaidRemove { .. } => {
                "mdadm"
            }
            DiskOp::Rescan { .. } => "partprobe",
            DiskOp::SetReadOnly { .. } => "blockdev",
            DiskOp::SetDeviceState { .. } => "sysfs",
            DiskOp::DiskId { .. } | DiskOp::PartType { .. } | DiskOp::PartAttrs { .. } => {
                "sfdisk"
            }
            DiskOp::Mount { .. } => "mount",
            DiskOp::Unmount { .. } => "umount",
        }
    }

    /// Whether the op only reads state; dry runs still execute these.
    pub fn is_query(&self) -> bool {
        matches!(self, DiskOp::DiskId { id: None, .. })
            || matches!(self, DiskOp::Fsck { repair: false, .. })
    }
}

impl fmt::Display for DiskOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskOp::Parted { disk, op } => {
                write!(f, "parted -s {} {}", disk.display(), op.to_args().join(" "))
            }
            DiskOp::WipeSignatures { device } => write!(f, "wipefs -a {}", device.display()),
            DiskOp::Discard { device } => write!(f, "blkdiscard -z {}", device.display()),
            DiskOp::ZeroFill { device } => write!(f, "zero-fill {}", device.display()),
            DiskOp::Mkfs { device, spec } => {
                write!(f, "mkfs.{} {}", spec.fs, device.display())
            }
            DiskOp::Fsck { device, repair } => {
                write!(
                    f,
                    "fsck {} {}",
                    if *repair { "-y" } else { "-n" },
                    device.display()
                )
            }
            DiskOp::LoopAttach { image, read_only } => write!(
                f,
                "losetup --show -f -P{} {}",
                if *read_only { " -r" } else { "" },
                image.display()
            ),
            DiskOp::LoopDetach { device } => write!(f, "losetup -d {}", device.display()),
            DiskOp::CreateBackingFile {
                path,
                size_mib,
                preallocate,
            } => write!(
                f,
                "{} {}MiB {}",
                if *preallocate { "fallocate" } else { "truncate" },
                size_mib,
                path.display()
            ),
            DiskOp::GrowBackingFile { path, size_mib } => {
                write!(f, "truncate -s >{}M {}", size_mib, path.display())
            }
            DiskOp::RaidCreate {
                array,
                level,
                members,
            } => write!(
                f,
                "mdadm --create {} --level={} ({} members)",
                array.display(),
                level.as_mdadm(),
                members.len()
            ),
            DiskOp::RaidAdd { array, member } => {
                write!(f, "mdadm {} --add {}", array.display(), member.display())
            }
            DiskOp::RaidRemove { array, member } => {
                write!(f, "mdadm {} --remove {}", array.display(), member.display())
            }
            DiskOp::Rescan { disk } => match disk {
                Some(d) => write!(f, "partprobe {}", d.display()),
                None => write!(f, "partprobe"),
            },
            DiskOp::SetReadOnly { device, read_only } => write!(
                f,
                "blockdev {} {}",
                if *read_only { "--setro" } else { "--setrw" },
                device.display()
            ),
            DiskOp::SetDeviceState { device, online } => write!(
                f,
                "set {} {}",
                device.display(),
                if *online { "online" } else { "offline" }
            ),
            DiskOp::DiskId { disk, id } => match id {
                Some(id) => write!(f, "sfdisk --disk-id {} {}", disk.display(), id),
                None => write!(f, "sfdisk --disk-id {}", disk.display()),
            },
            DiskOp::PartType { disk, number, id } => {
                write!(f, "sfdisk --part-type {} {} {}", disk.display(), number, id)
            }
            DiskOp::PartAttrs {
                disk,
                number,
                attrs,
            } => write!(
                f,
                "sfdisk --part-attrs {} {} {}",
                disk.display(),
                number,
                attrs
            ),
            DiskOp::Mount { device, target, .. } => {
                write!(f, "mount {} {}", device.display(), target.display())
            }
            DiskOp::Unmount { target } => write!(f, "umount {}", target.display()),
        }
    }
}
