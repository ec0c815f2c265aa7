//! Whole-disk commands: clean, convert, online/offline, rescan, uniqueid, attributes.

use super::{required_kind, target_kind};
use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::{DiskOp, PartedOp, TableKind};
use std::io::Write;

/// `clean [all]`.
pub fn clean(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let disk = ctx.session.require(DeviceKind::Disk)?;
    ctx.require_privilege()?;

    if args.has_flag("all") {
        if let Err(err) = ctx.submit(DiskOp::Discard {
            device: disk.clone(),
        }) {
            log::warn!("discard unavailable, zero-filling instead: {}", err);
            ctx.submit(DiskOp::ZeroFill {
                device: disk.clone(),
            })?;
        }
    } else {
        ctx.submit(DiskOp::WipeSignatures {
            device: disk.clone(),
        })?;
    }
    ctx.submit(DiskOp::Rescan { disk: Some(disk) })?;

    writeln!(ctx.out, "DiskPart succeeded in cleaning the disk.")?;
    Ok(Outcome::Done)
}

/// `convert gpt|mbr`.
pub fn convert(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let disk = ctx.session.require(DeviceKind::Disk)?;
    let table = match args.positional(0).map(str::to_ascii_lowercase).as_deref() {
        Some("gpt") => TableKind::Gpt,
        Some("mbr") | Some("msdos") => TableKind::Msdos,
        _ => return Err(CommandError::syntax(help::usage(Verb::Convert))),
    };
    ctx.require_privilege()?;

    ctx.submit(DiskOp::Parted {
        disk,
        op: PartedOp::MkLabel { table },
    })?;
    writeln!(
        ctx.out,
        "DiskPart successfully converted the selected disk to {} format.",
        match table {
            TableKind::Gpt => "GPT",
            TableKind::Msdos => "MBR",
        }
    )?;
    Ok(Outcome::Done)
}

pub fn online(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    set_state(ctx, args, true)
}

pub fn offline(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    set_state(ctx, args, false)
}

fn set_state(ctx: &mut Context<'_>, args: &ArgView, online: bool) -> CommandResult {
    let verb = if online { Verb::Online } else { Verb::Offline };
    let kind = match required_kind(args, help::usage(verb))? {
        DeviceKind::Partition => return Err(CommandError::syntax(help::usage(verb))),
        kind => kind,
    };
    let device = ctx.session.require(kind)?;
    ctx.require_privilege()?;

    ctx.submit(DiskOp::SetDeviceState { device, online })?;
    writeln!(
        ctx.out,
        "DiskPart successfully {} the selected {}.",
        if online { "onlined" } else { "offlined" },
        kind
    )?;
    Ok(Outcome::Done)
}

pub fn rescan(ctx: &mut Context<'_>, _args: &ArgView) -> CommandResult {
    ctx.require_privilege()?;
    ctx.submit(DiskOp::Rescan { disk: None })?;
    writeln!(ctx.out, "DiskPart has finished scanning your configuration.")?;
    Ok(Outcome::Done)
}

/// `uniqueid disk [id=<identifier>]`.
pub fn unique_id(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    if required_kind(args, help::usage(Verb::UniqueId))? != DeviceKind::Disk {
        return Err(CommandError::syntax(help::usage(Verb::UniqueId)));
    }
    let disk = ctx.session.require(DeviceKind::Disk)?;

    match args.lookup("id") {
        Some("") => Err(CommandError::MissingArgument("id")),
        Some(id) => {
            ctx.require_privilege()?;
            ctx.submit(DiskOp::DiskId {
                disk,
                id: Some(id.to_string()),
            })?;
            writeln!(ctx.out, "DiskPart successfully set the disk identifier.")?;
            Ok(Outcome::Done)
        }
        None => {
            let id = ctx.submit(DiskOp::DiskId { disk, id: None })?;
            writeln!(ctx.out, "Disk ID: {}", id)?;
            Ok(Outcome::Done)
        }
    }
}

/// `attributes [disk|volume] [set|clear readonly]`.
pub fn attributes(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let kind = match target_kind(args, DeviceKind::Disk) {
        DeviceKind::Partition => return Err(CommandError::syntax(help::usage(Verb::Attributes))),
        kind => kind,
    };
    let device = ctx.session.require(kind)?;

    let set = args.has_flag("set");
    if !set && !args.has_flag("clear") {
        let read_only = ctx
            .hal
            .is_read_only(&device)
            .map_err(|source| CommandError::Hal {
                op: format!("read attributes of {}", device.display()),
                source,
            })?;
        writeln!(
            ctx.out,
            "Current Read-only State : {}",
            if read_only { "Yes" } else { "No" }
        )?;
        return Ok(Outcome::Done);
    }
    if !args.has_flag("readonly") {
        return Err(CommandError::syntax(
            "Only the readonly attribute can be set or cleared.",
        ));
    }
    ctx.require_privilege()?;

    ctx.submit(DiskOp::SetReadOnly {
        device,
        read_only: set,
    })?;
    writeln!(
        ctx.out,
        "{} attributes {} successfully.",
        kind.title(),
        if set { "set" } else { "cleared" }
    )?;
    Ok(Outcome::Done)
}
