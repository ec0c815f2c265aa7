//! `create partition|volume|vdisk`.

use super::vdisk;
use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::{DiskOp, Extent, PartedOp, RaidLevel};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const EFI_START_MIB: u64 = 1;
const EFI_SIZE_MIB: u64 = 100;
const MSR_START_MIB: u64 = 101;
const MSR_SIZE_MIB: u64 = 16;

pub fn run(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    match args.positional(0).map(str::to_ascii_lowercase).as_deref() {
        Some("partition") | Some("part") => partition(ctx, args),
        Some("volume") | Some("vol") => volume(ctx, args),
        Some("vdisk") => vdisk::create(ctx, args),
        _ => Err(CommandError::syntax(help::usage(Verb::Create))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartitionStyle {
    Primary,
    Extended,
    Logical,
    Efi,
    Msr,
}

impl PartitionStyle {
    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "primary" => Some(PartitionStyle::Primary),
            "extended" => Some(PartitionStyle::Extended),
            "logical" => Some(PartitionStyle::Logical),
            "efi" => Some(PartitionStyle::Efi),
            "msr" => Some(PartitionStyle::Msr),
            _ => None,
        }
    }

    /// `mkpart` call plus the flag to set on the new partition afterwards.
    fn plan(
        self,
        start: Option<u64>,
        size: Option<u64>,
    ) -> Result<(PartedOp, Option<&'static str>), CommandError> {
        let span = |default_start: u64,
                    default_size: Option<u64>|
         -> Result<(Extent, Extent), CommandError> {
            let start = start.unwrap_or(default_start);
            let end = match size.or(default_size) {
                Some(size) => Extent::Mib(start.checked_add(size).ok_or_else(|| {
                    CommandError::InvalidArgument {
                        key: "size",
                        value: size.to_string(),
                    }
                })?),
                None => Extent::EndOfDisk,
            };
            Ok((Extent::Mib(start), end))
        };
        let mkpart = |part_type: &str, fs_type: Option<&str>, (start, end): (Extent, Extent)| {
            PartedOp::MkPart {
                part_type: part_type.to_string(),
                fs_type: fs_type.map(str::to_string),
                start,
                end,
            }
        };
        Ok(match self {
            PartitionStyle::Primary => (mkpart("primary", None, span(1, None)?), None),
            PartitionStyle::Extended => (mkpart("extended", None, span(1, None)?), None),
            PartitionStyle::Logical => (mkpart("logical", None, span(1, None)?), None),
            PartitionStyle::Efi => (
                mkpart(
                    "EFI",
                    Some("fat32"),
                    span(EFI_START_MIB, Some(EFI_SIZE_MIB))?,
                ),
                Some("esp"),
            ),
            PartitionStyle::Msr => (
                mkpart("MSR", None, span(MSR_START_MIB, Some(MSR_SIZE_MIB))?),
                Some("msftres"),
            ),
        })
    }
}

/// Partition numbers currently on `disk`.
fn partition_numbers(ctx: &Context<'_>, disk: &Path) -> Result<BTreeSet<u32>, CommandError> {
    let resolver = ctx.resolver();
    Ok(resolver
        .devices_of(DeviceKind::Partition, Some(disk))?
        .iter()
        .filter_map(|child| resolver.parent_and_number(&child.path).ok())
        .map(|loc| loc.number)
        .collect())
}

fn partition(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let disk = ctx.session.require(DeviceKind::Disk)?;
    let style = args
        .positional(1)
        .and_then(PartitionStyle::parse)
        .ok_or_else(|| CommandError::syntax(help::usage(Verb::Create)))?;
    let size = args.mib("size")?;
    let start = match args.mib("start")? {
        Some(start) => Some(start),
        None => args.mib("offset")?,
    };
    let (mkpart, flag) = style.plan(start, size)?;
    ctx.require_privilege()?;

    let before = partition_numbers(ctx, &disk)?;
    ctx.submit(DiskOp::Parted {
        disk: disk.clone(),
        op: mkpart,
    })?;

    if let Some(flag) = flag {
        // the number parted handed out is the one that was not there before
        let created = partition_numbers(ctx, &disk)?
            .difference(&before)
            .next()
            .copied();
        match created {
            Some(part_num) => {
                ctx.submit(DiskOp::Parted {
                    disk,
                    op: PartedOp::SetFlag {
                        part_num,
                        flag: flag.to_string(),
                        on: true,
                    },
                })?;
            }
            None => log::warn!(
                "no new partition found on {} after mkpart; {} flag not set",
                disk.display(),
                flag
            ),
        }
    }
    writeln!(
        ctx.out,
        "DiskPart succeeded in creating the specified partition."
    )?;
    Ok(Outcome::Done)
}

fn raid_level(word: &str) -> Option<Option<RaidLevel>> {
    match word.to_ascii_lowercase().as_str() {
        "simple" => Some(None),
        "stripe" => Some(Some(RaidLevel::Stripe)),
        "mirror" => Some(Some(RaidLevel::Mirror)),
        "raid" => Some(Some(RaidLevel::Parity)),
        _ => None,
    }
}

/// First `/dev/mdN` that does not exist yet.
fn next_md_array(ctx: &Context<'_>) -> PathBuf {
    let resolver = ctx.resolver();
    (0u32..)
        .map(|n| ctx.device_root.join(format!("md{}", n)))
        .find(|path| !resolver.exists(path))
        .unwrap_or_else(|| ctx.device_root.join("md0"))
}

fn volume(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let level = args
        .positional(1)
        .and_then(raid_level)
        .ok_or_else(|| CommandError::syntax(help::usage(Verb::Create)))?;
    let raw = args.require("disk")?;
    let refs: Vec<&str> = raw.split(',').filter(|r| !r.is_empty()).collect();
    let wanted = level.map_or(1, |l| l.min_members());
    let count_ok = match level {
        None => refs.len() == 1,
        Some(_) => refs.len() >= wanted,
    };
    if !count_ok {
        return Err(CommandError::InvalidArgument {
            key: "disk",
            value: raw.to_string(),
        });
    }
    ctx.require_privilege()?;

    let resolver = ctx.resolver();
    let members = refs
        .iter()
        .map(|r| resolver.resolve_existing(DeviceKind::Disk, r, None))
        .collect::<Result<Vec<_>, _>>()?;

    match level {
        None => {
            let disk = members.into_iter().next().ok_or(CommandError::MissingArgument("disk"))?;
            ctx.submit(DiskOp::Parted {
                disk: disk.clone(),
                op: PartedOp::MkPart {
                    part_type: "primary".to_string(),
                    fs_type: None,
                    start: Extent::Mib(1),
                    end: Extent::EndOfDisk,
                },
            })?;
            writeln!(
                ctx.out,
                "DiskPart successfully created the volume on {}.",
                disk.display()
            )?;
        }
        Some(level) => {
            let array = next_md_array(ctx);
            ctx.submit(DiskOp::RaidCreate {
                array: array.clone(),
                level,
                members,
            })?;
            writeln!(
                ctx.out,
                "DiskPart successfully created the volume {}.",
                array.display()
            )?;
        }
    }
    Ok(Outcome::Done)
}
