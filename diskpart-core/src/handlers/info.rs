//! Read-only reports: `detail` and `filesystems`.

use super::{format_size, required_kind};
use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::{BlockDevice, FsType};
use std::io::Write;

fn write_row(out: &mut dyn Write, row: &BlockDevice) -> std::io::Result<()> {
    writeln!(out, "Device     : {}", row.path.display())?;
    writeln!(out, "Type       : {:?}", row.kind)?;
    writeln!(out, "Size       : {}", format_size(row.size_bytes))?;
    writeln!(
        out,
        "Filesystem : {}",
        row.fstype.as_deref().unwrap_or("(none)")
    )?;
    writeln!(out, "Label      : {}", row.label.as_deref().unwrap_or(""))?;
    writeln!(
        out,
        "Mounted at : {}",
        row.mountpoint
            .as_deref()
            .map(|m| m.display().to_string())
            .unwrap_or_default()
    )
}

/// `detail disk|partition|volume`.
pub fn detail(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let kind = required_kind(args, help::usage(Verb::Detail))?;
    let path = ctx.session.require(kind)?;

    let resolver = ctx.resolver();
    let row = resolver
        .row(&path)?
        .ok_or_else(|| CommandError::DeviceNotFound(path.clone()))?;
    write_row(ctx.out, &row)?;
    writeln!(
        ctx.out,
        "Read-only  : {}",
        if ctx.hal.is_read_only(&path).unwrap_or(false) {
            "Yes"
        } else {
            "No"
        }
    )?;

    match kind {
        DeviceKind::Disk => {
            let children = resolver.devices_of(DeviceKind::Partition, Some(&path))?;
            writeln!(ctx.out)?;
            if children.is_empty() {
                writeln!(ctx.out, "There are no partitions on this disk.")?;
            }
            for (i, child) in children.iter().enumerate() {
                writeln!(
                    ctx.out,
                    "  Partition {:<3} {:<20} {:>10}  {}",
                    i + 1,
                    child.path.display(),
                    format_size(child.size_bytes),
                    child.fstype.as_deref().unwrap_or("")
                )?;
            }
        }
        DeviceKind::Partition => {
            if let Ok(loc) = resolver.parent_and_number(&path) {
                writeln!(ctx.out, "Disk       : {}", loc.disk.display())?;
                writeln!(ctx.out, "Number     : {}", loc.number)?;
            }
        }
        DeviceKind::Volume => {}
    }
    Ok(Outcome::Done)
}

/// `filesystems`: current filesystem of the selected volume and what `format` accepts.
pub fn filesystems(ctx: &mut Context<'_>, _args: &ArgView) -> CommandResult {
    let volume = ctx.session.require(DeviceKind::Volume)?;
    let current = ctx
        .resolver()
        .row(&volume)?
        .and_then(|row| row.fstype)
        .unwrap_or_else(|| "RAW".to_string());

    writeln!(ctx.out, "Current File System")?;
    writeln!(ctx.out)?;
    writeln!(ctx.out, "  Type : {}", current)?;
    writeln!(ctx.out)?;
    writeln!(ctx.out, "File Systems Supported for Formatting")?;
    writeln!(ctx.out)?;
    for fs in FsType::ALL {
        let default = if fs == FsType::Ext4 { " (Default)" } else { "" };
        writeln!(ctx.out, "  Type : {}{}", fs, default)?;
    }
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::tokenizer::tokenize;
    use diskpart_hal::{BlockKind, FakeHal};
    use std::path::{Path, PathBuf};

    const GIB: u64 = 1 << 30;

    fn call(
        handler: crate::dispatcher::Handler,
        hal: &FakeHal,
        session: &mut Session,
        line: &str,
    ) -> (CommandResult, String) {
        let mut out = Vec::new();
        let mut ctx = Context {
            hal,
            session,
            out: &mut out,
            device_root: Path::new("/dev"),
        };
        let result = handler(&mut ctx, &ArgView::new(tokenize(line)));
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn detail_disk_lists_children() {
        let hal = FakeHal::new()
            .with_disk("/dev/sda", 10 * GIB)
            .with_partition("/dev/sda", 1, 1, GIB)
            .with_partition("/dev/sda", 2, 1025, GIB);
        let mut session = Session::new();
        session.select(DeviceKind::Disk, PathBuf::from("/dev/sda"));

        let (result, out) = call(detail, &hal, &mut session, "detail disk");
        result.unwrap();
        assert!(out.contains("Device     : /dev/sda"));
        assert!(out.contains("/dev/sda2"));
    }

    #[test]
    fn detail_without_selection_is_syntax() {
        let hal = FakeHal::new();
        let (result, _) = call(detail, &hal, &mut Session::new(), "detail partition");
        assert!(matches!(
            result,
            Err(CommandError::MissingSelection(DeviceKind::Partition))
        ));
    }

    #[test]
    fn filesystems_reports_current_type() {
        let hal = FakeHal::new().with_device(
            BlockDevice::new("/dev/sda1", BlockKind::Part, GIB)
                .with_parent("/dev/sda")
                .with_fstype("xfs"),
        );
        let mut session = Session::new();
        session.select(DeviceKind::Volume, PathBuf::from("/dev/sda1"));

        let (result, out) = call(filesystems, &hal, &mut session, "filesystems");
        result.unwrap();
        assert!(out.contains("Type : xfs"));
        assert!(out.contains("Type : ext4 (Default)"));
    }
}
