//! Virtual disks: file-backed loop devices.

use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::verbs::Verb;
use diskpart_hal::DiskOp;
use std::io::Write;
use std::path::{Path, PathBuf};

const MIB: u64 = 1024 * 1024;

/// `file=` as an absolute path, so it compares equal to what losetup reports.
fn backing_path(args: &ArgView) -> Result<PathBuf, CommandError> {
    let raw = Path::new(args.require("file")?);
    if raw.is_absolute() {
        return Ok(raw.to_path_buf());
    }
    Ok(std::env::current_dir()
        .map(|cwd| cwd.join(raw))
        .unwrap_or_else(|_| raw.to_path_buf()))
}

fn require_vdisk_word(args: &ArgView, verb: Verb) -> Result<(), CommandError> {
    match args.positional(0) {
        Some(word) if word.eq_ignore_ascii_case("vdisk") => Ok(()),
        _ => Err(CommandError::syntax(help::usage(verb))),
    }
}

/// `create vdisk file=<path> maximum=<MiB> [type=fixed|expandable]`.
pub fn create(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let path = backing_path(args)?;
    let size_mib = args
        .mib("maximum")?
        .ok_or(CommandError::MissingArgument("maximum"))?;
    let preallocate = match args.lookup("type").map(str::to_ascii_lowercase).as_deref() {
        None | Some("expandable") => false,
        Some("fixed") => true,
        Some(other) => {
            return Err(CommandError::InvalidArgument {
                key: "type",
                value: other.to_string(),
            })
        }
    };
    if ctx.resolver().exists(&path) {
        return Err(CommandError::AlreadyExists(path));
    }

    ctx.submit(DiskOp::CreateBackingFile {
        path,
        size_mib,
        preallocate,
    })?;
    writeln!(ctx.out, "DiskPart successfully created the virtual disk file.")?;
    Ok(Outcome::Done)
}

/// `expand vdisk file=<path> maximum=<MiB>`.
pub fn expand(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    require_vdisk_word(args, Verb::Expand)?;
    let path = backing_path(args)?;
    let size_mib = args
        .mib("maximum")?
        .ok_or(CommandError::MissingArgument("maximum"))?;
    if !ctx.resolver().exists(&path) {
        return Err(CommandError::DeviceNotFound(path));
    }
    let current = ctx
        .hal
        .file_size_bytes(&path)
        .map_err(|source| CommandError::Hal {
            op: format!("stat {}", path.display()),
            source,
        })?;
    if size_mib.checked_mul(MIB).is_some_and(|wanted| wanted < current) {
        return Err(CommandError::InvalidArgument {
            key: "maximum",
            value: format!(
                "{} (smaller than the current {} MiB)",
                size_mib,
                current.div_ceil(MIB)
            ),
        });
    }

    ctx.submit(DiskOp::GrowBackingFile { path, size_mib })?;
    writeln!(ctx.out, "DiskPart successfully expanded the virtual disk file.")?;
    Ok(Outcome::Done)
}

pub fn attach(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    set_attached(ctx, args, true)
}

pub fn detach(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    set_attached(ctx, args, false)
}

fn set_attached(ctx: &mut Context<'_>, args: &ArgView, attach: bool) -> CommandResult {
    require_vdisk_word(args, if attach { Verb::Attach } else { Verb::Detach })?;
    let path = backing_path(args)?;
    ctx.require_privilege()?;

    if attach {
        if !ctx.resolver().exists(&path) {
            return Err(CommandError::DeviceNotFound(path));
        }
        let device = ctx.submit(DiskOp::LoopAttach {
            image: path,
            read_only: args.has_flag("readonly"),
        })?;
        if device.is_empty() {
            writeln!(ctx.out, "DiskPart successfully attached the virtual disk file.")?;
        } else {
            writeln!(
                ctx.out,
                "DiskPart successfully attached the virtual disk file as {}.",
                device
            )?;
        }
        return Ok(Outcome::Done);
    }

    let attached: Vec<PathBuf> = ctx
        .hal
        .loop_devices()
        .map_err(|source| CommandError::Hal {
            op: "list loop devices".to_string(),
            source,
        })?
        .into_iter()
        .filter(|lo| lo.backing_file == path)
        .map(|lo| lo.device)
        .collect();
    if attached.is_empty() {
        return Err(CommandError::NotAttached(path));
    }
    for device in attached {
        ctx.submit(DiskOp::LoopDetach { device })?;
    }
    writeln!(ctx.out, "DiskPart successfully detached the virtual disk file.")?;
    Ok(Outcome::Done)
}
