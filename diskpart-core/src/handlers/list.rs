//! `list disk|partition|volume|vdisk`.

use super::format_size;
use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::HalError;
use std::io::Write;
use std::path::Path;

pub fn run(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let target = args
        .positional(0)
        .ok_or_else(|| CommandError::syntax(help::usage(Verb::List)))?;
    if target.eq_ignore_ascii_case("vdisk") {
        return list_vdisks(ctx);
    }
    let kind = DeviceKind::parse(target)
        .ok_or_else(|| CommandError::syntax(format!("Unsupported list target: {}", target)))?;
    list_devices(ctx, kind)
}

fn list_devices(ctx: &mut Context<'_>, kind: DeviceKind) -> CommandResult {
    let scope = match kind {
        DeviceKind::Partition => ctx.session.get(DeviceKind::Disk).map(Path::to_path_buf),
        _ => None,
    };
    let rows = ctx.resolver().devices_of(kind, scope.as_deref())?;
    if rows.is_empty() {
        writeln!(ctx.out, "There are no {}s to show.", kind)?;
        return Ok(Outcome::Done);
    }

    let selected = ctx.session.get(kind).map(Path::to_path_buf);
    writeln!(
        ctx.out,
        "  {:<14} {:<20} {:>10}  {:<8} {:<12} Mount",
        format!("{} ###", kind.title()),
        "Device",
        "Size",
        "Fs",
        "Label"
    )?;
    writeln!(
        ctx.out,
        "  {:-<14} {:-<20} {:->10}  {:-<8} {:-<12} {:-<10}",
        "", "", "", "", "", ""
    )?;
    for (i, row) in rows.iter().enumerate() {
        let marker = if selected.as_deref() == Some(row.path.as_path()) {
            '*'
        } else {
            ' '
        };
        writeln!(
            ctx.out,
            "{} {:<14} {:<20} {:>10}  {:<8} {:<12} {}",
            marker,
            format!("{} {}", kind.title(), i + 1),
            row.path.display(),
            format_size(row.size_bytes),
            row.fstype.as_deref().unwrap_or(""),
            row.label.as_deref().unwrap_or(""),
            row.mountpoint
                .as_deref()
                .map(|m| m.display().to_string())
                .unwrap_or_default()
        )?;
    }
    Ok(Outcome::Done)
}

fn list_vdisks(ctx: &mut Context<'_>) -> CommandResult {
    let loops = ctx
        .hal
        .loop_devices()
        .map_err(|source: HalError| CommandError::Hal {
            op: "list loop devices".to_string(),
            source,
        })?;
    if loops.is_empty() {
        writeln!(ctx.out, "There are no virtual disks to show.")?;
        return Ok(Outcome::Done);
    }

    writeln!(ctx.out, "  {:<10} {:<14} {:<4} File", "VDisk ###", "Device", "RO")?;
    writeln!(ctx.out, "  {:-<10} {:-<14} {:-<4} {:-<20}", "", "", "", "")?;
    for (i, lo) in loops.iter().enumerate() {
        writeln!(
            ctx.out,
            "  {:<10} {:<14} {:<4} {}",
            format!("VDisk {}", i + 1),
            lo.device.display(),
            if lo.read_only { "Yes" } else { "No" },
            lo.backing_file.display()
        )?;
    }
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::tokenizer::tokenize;
    use diskpart_hal::{DiskExecutor, DiskOp, FakeHal};
    use std::path::PathBuf;

    const GIB: u64 = 1 << 30;

    fn list(hal: &FakeHal, session: &mut Session, line: &str) -> String {
        let mut out = Vec::new();
        let mut ctx = Context {
            hal,
            session,
            out: &mut out,
            device_root: Path::new("/dev"),
        };
        run(&mut ctx, &ArgView::new(tokenize(line))).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn marks_selected_disk() {
        let hal = FakeHal::new()
            .with_disk("/dev/sda", 100 * GIB)
            .with_disk("/dev/sdb", 200 * GIB);
        let mut session = Session::new();
        session.select(DeviceKind::Disk, PathBuf::from("/dev/sdb"));

        let out = list(&hal, &mut session, "list disk");
        let sdb = out.lines().find(|l| l.contains("/dev/sdb")).unwrap();
        let sda = out.lines().find(|l| l.contains("/dev/sda")).unwrap();
        assert!(sdb.starts_with('*'));
        assert!(sda.starts_with(' '));
        assert!(sdb.contains("200 GB"));
    }

    #[test]
    fn empty_volume_list_says_so() {
        let hal = FakeHal::new().with_disk("/dev/sda", GIB);
        let out = list(&hal, &mut Session::new(), "list volume");
        assert_eq!(out.trim(), "There are no volumes to show.");
    }

    #[test]
    fn vdisk_list_shows_backing_files() {
        let hal = FakeHal::new().with_file("/srv/a.img");
        hal.execute(&DiskOp::LoopAttach {
            image: PathBuf::from("/srv/a.img"),
            read_only: false,
        })
        .unwrap();
        let out = list(&hal, &mut Session::new(), "list vdisk");
        assert!(out.contains("/dev/loop0"));
        assert!(out.contains("/srv/a.img"));
    }

    #[test]
    fn unknown_target_is_syntax() {
        let hal = FakeHal::new();
        let mut session = Session::new();
        let mut out = Vec::new();
        let mut ctx = Context {
            hal: &hal,
            session: &mut session,
            out: &mut out,
            device_root: Path::new("/dev"),
        };
        let err = run(&mut ctx, &ArgView::new(tokenize("list spindles"))).unwrap_err();
        assert!(matches!(err, CommandError::Syntax(_)));
    }
}
