//! Partition table edits (parted).

use std::fmt;

/// Position on a disk as understood by `parted` (`1MiB`, `100%`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Mib(u64),
    EndOfDisk,
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Mib(v) => write!(f, "{}MiB", v),
            Extent::EndOfDisk => write!(f, "100%"),
        }
    }
}

/// Partition table flavour for `mklabel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Gpt,
    Msdos,
}

impl TableKind {
    pub fn as_parted(&self) -> &'static str {
        match self {
            TableKind::Gpt => "gpt",
            TableKind::Msdos => "msdos",
        }
    }
}

/// A single `parted -s` operation on one disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartedOp {
    MkLabel {
        table: TableKind,
    },
    MkPart {
        /// Partition type on msdos tables, partition name on gpt tables.
        part_type: String,
        fs_type: Option<String>,
        start: Extent,
        end: Extent,
    },
    SetFlag {
        part_num: u32,
        flag: String,
        on: bool,
    },
    ResizePart {
        part_num: u32,
        end: Extent,
    },
    Rm {
        part_num: u32,
    },
}

impl PartedOp {
    /// Arguments following `parted -s <disk>`.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            PartedOp::MkLabel { table } => {
                vec!["mklabel".to_string(), table.as_parted().to_string()]
            }
            PartedOp::MkPart {
                part_type,
                fs_type,
                start,
                end,
            } => {
                let mut args = vec![
                    "-a".to_string(),
                    "optimal".to_string(),
                    "mkpart".to_string(),
                    part_type.clone(),
                ];
                if let Some(fs) = fs_type {
                    args.push(fs.clone());
                }
                args.push(start.to_string());
                args.push(end.to_string());
                args
            }
            PartedOp::SetFlag { part_num, flag, on } => vec![
                "set".to_string(),
                part_num.to_string(),
                flag.clone(),
                if *on { "on" } else { "off" }.to_string(),
            ],
            PartedOp::ResizePart { part_num, end } => vec![
                "resizepart".to_string(),
                part_num.to_string(),
                end.to_string(),
            ],
            PartedOp::Rm { part_num } => vec!["rm".to_string(), part_num.to_string()],
        }
    }
}
