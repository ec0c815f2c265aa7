//! Edits to the selected partition: delete, resize, boot flag, type and GPT attributes.

use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::{DiskOp, Extent, PartedOp};
use std::io::Write;

const MIB: u64 = 1024 * 1024;

/// `delete partition [override]` and `delete volume`.
pub fn delete(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let kind = match args.positional(0).and_then(DeviceKind::parse) {
        Some(DeviceKind::Disk) => {
            return Err(CommandError::syntax(
                "delete disk is not supported; use clean on the selected disk instead.",
            ))
        }
        Some(kind) => kind,
        None => return Err(CommandError::syntax(help::usage(Verb::Delete))),
    };
    let target = ctx.session.require(kind)?;
    ctx.require_privilege()?;

    let loc = ctx.resolver().parent_and_number(&target)?;
    if args.has_flag("override") {
        log::debug!("delete {}: override requested", target.display());
    }
    ctx.submit(DiskOp::Parted {
        disk: loc.disk,
        op: PartedOp::Rm {
            part_num: loc.number,
        },
    })?;
    writeln!(ctx.out, "DiskPart successfully deleted the selected {}.", kind)?;
    Ok(Outcome::Done)
}

pub fn extend(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    resize(ctx, args, false)
}

pub fn shrink(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    resize(ctx, args, true)
}

/// Move the end of the selected partition to `start + size`, or to the end of the disk.
fn resize(ctx: &mut Context<'_>, args: &ArgView, shrinking: bool) -> CommandResult {
    let partition = ctx.session.require(DeviceKind::Partition)?;
    let size = match args.mib("size")? {
        Some(size) => Some(size),
        None => args.mib("desired")?,
    };
    if shrinking && size.is_none() {
        return Err(CommandError::MissingArgument("size"));
    }
    ctx.require_privilege()?;

    let loc = ctx.resolver().parent_and_number(&partition)?;
    let end = match size {
        Some(size) => {
            let start = ctx
                .hal
                .partition_start_bytes(&partition)
                .map_err(|source| CommandError::Hal {
                    op: format!("read start of {}", partition.display()),
                    source,
                })?;
            let end = (start / MIB).checked_add(size).ok_or_else(|| {
                CommandError::InvalidArgument {
                    key: "size",
                    value: size.to_string(),
                }
            })?;
            Extent::Mib(end)
        }
        None => Extent::EndOfDisk,
    };

    ctx.submit(DiskOp::Parted {
        disk: loc.disk,
        op: PartedOp::ResizePart {
            part_num: loc.number,
            end,
        },
    })?;
    writeln!(
        ctx.out,
        "DiskPart successfully {} the partition.",
        if shrinking { "shrunk" } else { "extended" }
    )?;
    Ok(Outcome::Done)
}

pub fn active(ctx: &mut Context<'_>, _args: &ArgView) -> CommandResult {
    set_boot_flag(ctx, true)
}

pub fn inactive(ctx: &mut Context<'_>, _args: &ArgView) -> CommandResult {
    set_boot_flag(ctx, false)
}

fn set_boot_flag(ctx: &mut Context<'_>, on: bool) -> CommandResult {
    let partition = ctx.session.require(DeviceKind::Partition)?;
    ctx.require_privilege()?;

    let loc = ctx.resolver().parent_and_number(&partition)?;
    ctx.submit(DiskOp::Parted {
        disk: loc.disk,
        op: PartedOp::SetFlag {
            part_num: loc.number,
            flag: "boot".to_string(),
            on,
        },
    })?;
    writeln!(
        ctx.out,
        "DiskPart marked the current partition as {}.",
        if on { "active" } else { "inactive" }
    )?;
    Ok(Outcome::Done)
}

/// `setid id=<type>`: partition type GUID, MBR type byte or sfdisk alias.
pub fn set_id(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let partition = ctx.session.require(DeviceKind::Partition)?;
    let id = args.require("id")?.to_string();
    ctx.require_privilege()?;

    let loc = ctx.resolver().parent_and_number(&partition)?;
    ctx.submit(DiskOp::PartType {
        disk: loc.disk,
        number: loc.number,
        id,
    })?;
    writeln!(ctx.out, "DiskPart successfully set the partition ID.")?;
    Ok(Outcome::Done)
}

/// Named sfdisk attributes for a GPT attribute mask.
///
/// Bits 3 to 47 are reserved by the GPT layout and rejected.
pub(crate) fn gpt_attribute_names(mask: u64) -> Option<String> {
    const RESERVED: u64 = ((1 << 48) - 1) & !0b111;
    if mask & RESERVED != 0 {
        return None;
    }
    let mut names = Vec::new();
    for (bit, name) in [
        (0, "RequiredPartition"),
        (1, "NoBlockIOProtocol"),
        (2, "LegacyBIOSBootable"),
    ] {
        if mask & (1 << bit) != 0 {
            names.push(name.to_string());
        }
    }
    names.extend(
        (48..64)
            .filter(|bit| mask & (1u64 << bit) != 0)
            .map(|bit| format!("GUID:{}", bit)),
    );
    Some(names.join(","))
}

/// `gpt attributes=<hex>`.
pub fn gpt(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let partition = ctx.session.require(DeviceKind::Partition)?;
    let raw = args.require("attributes")?;
    let invalid = || CommandError::InvalidArgument {
        key: "attributes",
        value: raw.to_string(),
    };
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    let mask = u64::from_str_radix(hex, 16).map_err(|_| invalid())?;
    let attrs = gpt_attribute_names(mask).ok_or_else(invalid)?;
    ctx.require_privilege()?;

    let loc = ctx.resolver().parent_and_number(&partition)?;
    ctx.submit(DiskOp::PartAttrs {
        disk: loc.disk,
        number: loc.number,
        attrs,
    })?;
    writeln!(
        ctx.out,
        "DiskPart successfully assigned the attributes to the selected GPT partition."
    )?;
    Ok(Outcome::Done)
}
