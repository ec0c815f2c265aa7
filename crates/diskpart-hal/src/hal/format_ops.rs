//! Filesystem creation and checking.

use std::fmt;
use std::str::FromStr;

/// Filesystems `mkfs` can be asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    Ext4,
    Ext3,
    Ext2,
    Xfs,
    Btrfs,
    Vfat,
    Exfat,
    Ntfs,
}

impl FsType {
    pub const ALL: [FsType; 8] = [
        FsType::Ext4,
        FsType::Ext3,
        FsType::Ext2,
        FsType::Xfs,
        FsType::Btrfs,
        FsType::Vfat,
        FsType::Exfat,
        FsType::Ntfs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FsType::Ext4 => "ext4",
            FsType::Ext3 => "ext3",
            FsType::Ext2 => "ext2",
            FsType::Xfs => "xfs",
            FsType::Btrfs => "btrfs",
            FsType::Vfat => "vfat",
            FsType::Exfat => "exfat",
            FsType::Ntfs => "ntfs",
        }
    }

    pub fn mkfs_program(&self) -> String {
        format!("mkfs.{}", self.name())
    }

    /// Flag that sets the volume label for this mkfs flavour.
    fn label_flag(&self) -> &'static str {
        match self {
            FsType::Vfat | FsType::Exfat => "-n",
            _ => "-L",
        }
    }

    /// Flag that forces mkfs to overwrite an existing signature.
    fn force_flag(&self) -> Option<&'static str> {
        match self {
            FsType::Ext4 | FsType::Ext3 | FsType::Ext2 => Some("-F"),
            FsType::Xfs | FsType::Btrfs | FsType::Ntfs => Some("-f"),
            FsType::Vfat | FsType::Exfat => None,
        }
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ext4" => Ok(FsType::Ext4),
            "ext3" => Ok(FsType::Ext3),
            "ext2" => Ok(FsType::Ext2),
            "xfs" => Ok(FsType::Xfs),
            "btrfs" => Ok(FsType::Btrfs),
            "vfat" | "fat32" | "fat" => Ok(FsType::Vfat),
            "exfat" => Ok(FsType::Exfat),
            "ntfs" => Ok(FsType::Ntfs),
            other => Err(format!("unsupported filesystem: {}", other)),
        }
    }
}

/// Everything `mkfs` needs for one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fs: FsType,
    pub label: Option<String>,
    /// A non-quick ext* format initialises every inode table up front.
    pub quick: bool,
}

impl FormatSpec {
    pub fn new(fs: FsType) -> Self {
        Self {
            fs,
            label: None,
            quick: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    /// Arguments for `mkfs.<fs>`, device last.
    pub fn to_args(&self, device: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(flag) = self.fs.force_flag() {
            args.push(flag.to_string());
        }
        if self.fs == FsType::Vfat {
            args.push("-F".to_string());
            args.push("32".to_string());
        }
        if let Some(label) = &self.label {
            args.push(self.fs.label_flag().to_string());
            args.push(label.clone());
        }
        match (self.fs, self.quick) {
            (FsType::Ext4 | FsType::Ext3 | FsType::Ext2, false) => {
                args.push("-E".to_string());
                args.push("lazy_itable_init=0".to_string());
            }
            (FsType::Ntfs, true) => args.push("-Q".to_string()),
            _ => {}
        }
        args.push(device.to_string());
        args
    }
}
