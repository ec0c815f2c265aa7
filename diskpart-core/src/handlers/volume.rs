//! Commands on the selected volume: format, mount points, repair and RAID membership.

use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::session::DeviceKind;
use diskpart_hal::{DiskOp, FormatSpec, FsType};
use std::io::Write;
use std::path::{Path, PathBuf};

const MOUNT_BASE: &str = "/mnt";

/// `format [fs=<fs>] [label=<text>] [quick]`.
pub fn format(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let volume = ctx.session.require(DeviceKind::Volume)?;
    let fs = match args.lookup("fs") {
        None => FsType::Ext4,
        Some(raw) => raw
            .parse::<FsType>()
            .map_err(|_| CommandError::InvalidArgument {
                key: "fs",
                value: raw.to_string(),
            })?,
    };
    let mut spec = FormatSpec::new(fs).quick(args.has_flag("quick"));
    if let Some(label) = args.lookup("label").filter(|l| !l.is_empty()) {
        spec = spec.with_label(label);
    }
    ctx.require_privilege()?;

    ctx.submit(DiskOp::Mkfs {
        device: volume,
        spec,
    })?;
    writeln!(ctx.out, "DiskPart successfully formatted the volume.")?;
    Ok(Outcome::Done)
}

fn default_mount_point(volume: &Path) -> PathBuf {
    let name = volume
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "volume".to_string());
    Path::new(MOUNT_BASE).join(name)
}

pub fn assign(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    mount_point(ctx, args, true)
}

pub fn remove(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    mount_point(ctx, args, false)
}

/// Mount the selected volume, or unmount it from `mount=` / its current mount point.
fn mount_point(ctx: &mut Context<'_>, args: &ArgView, assign: bool) -> CommandResult {
    let volume = ctx.session.require(DeviceKind::Volume)?;
    let requested = args
        .lookup("mount")
        .filter(|m| !m.is_empty())
        .map(PathBuf::from);
    ctx.require_privilege()?;

    let row = ctx.resolver().row(&volume)?;
    if assign {
        let target = requested.unwrap_or_else(|| default_mount_point(&volume));
        ctx.submit(DiskOp::Mount {
            device: volume,
            target: target.clone(),
            fstype: row.and_then(|r| r.fstype),
        })?;
        writeln!(
            ctx.out,
            "DiskPart successfully assigned the mount point {}.",
            target.display()
        )?;
    } else {
        let target = requested
            .or_else(|| row.and_then(|r| r.mountpoint))
            .ok_or_else(|| CommandError::NotMounted(volume.clone()))?;
        ctx.submit(DiskOp::Unmount {
            target: target.clone(),
        })?;
        writeln!(
            ctx.out,
            "DiskPart successfully removed the mount point {}.",
            target.display()
        )?;
    }
    Ok(Outcome::Done)
}

/// `repair`: filesystem check with automatic repair.
pub fn repair(ctx: &mut Context<'_>, _args: &ArgView) -> CommandResult {
    let volume = ctx.session.require(DeviceKind::Volume)?;
    ctx.require_privilege()?;

    let report = ctx.submit(DiskOp::Fsck {
        device: volume,
        repair: true,
    })?;
    if !report.is_empty() {
        writeln!(ctx.out, "{}", report)?;
    }
    writeln!(ctx.out, "DiskPart successfully repaired the volume.")?;
    Ok(Outcome::Done)
}

pub fn add(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    change_member(ctx, args, true)
}

pub fn break_member(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    change_member(ctx, args, false)
}

/// `add disk=<ref>` / `break disk=<ref>` against the selected RAID volume.
fn change_member(ctx: &mut Context<'_>, args: &ArgView, add: bool) -> CommandResult {
    let array = ctx.session.require(DeviceKind::Volume)?;
    let reference = args.require("disk")?;
    ctx.require_privilege()?;

    let member = ctx
        .resolver()
        .resolve_existing(DeviceKind::Disk, reference, None)?;
    let op = if add {
        DiskOp::RaidAdd {
            array,
            member: member.clone(),
        }
    } else {
        DiskOp::RaidRemove {
            array,
            member: member.clone(),
        }
    };
    ctx.submit(op)?;
    writeln!(
        ctx.out,
        "DiskPart successfully {} {}.",
        if add { "added" } else { "broke off" },
        member.display()
    )?;
    Ok(Outcome::Done)
}
