use diskpart_core::{DeviceKind, ExitCode, Interpreter, InterpreterConfig, Outcome};
use diskpart_hal::{DiskOp, Extent, FakeHal, FsType, PartedOp};
use std::io::Write;
use std::path::Path;

const GIB: u64 = 1 << 30;

fn two_disks() -> FakeHal {
    FakeHal::new()
        .with_disk("/dev/sda", 100 * GIB)
        .with_partition("/dev/sda", 1, 1, GIB)
        .with_partition("/dev/sda", 2, 1025, 10 * GIB)
        .with_disk("/dev/sdb", 200 * GIB)
        .with_partition("/dev/sdb", 1, 1, 50 * GIB)
}

fn run_script(hal: &FakeHal, script: &str) -> (ExitCode, String, String) {
    let mut file = tempfile::NamedTempFile::new().expect("temp script");
    file.write_all(script.as_bytes()).expect("write script");

    let mut shell = Interpreter::new(hal, InterpreterConfig::default());
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = shell.run_script(file.path(), &mut out, &mut err);
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn blank_and_comment_lines_do_nothing() {
    let hal = two_disks();
    let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
    let mut out = Vec::new();
    for line in ["", "    ", "\t", "# select disk 1", "rem clean all"] {
        assert_eq!(shell.execute_line(line, &mut out).unwrap(), Outcome::NoOp);
    }
    assert!(out.is_empty());
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn selecting_a_disk_scopes_partition_listing() {
    let hal = two_disks();
    let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
    let mut out = Vec::new();

    shell.execute_line("select disk 2", &mut out).unwrap();
    assert_eq!(shell.session().get(DeviceKind::Partition), None);
    assert_eq!(shell.session().get(DeviceKind::Volume), None);

    out.clear();
    shell.execute_line("list partition", &mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    assert!(listing.contains("/dev/sdb1"));
    assert!(!listing.contains("/dev/sda1"));
    assert!(!listing.contains("/dev/sda2"));
}

#[test]
fn missing_selection_is_a_syntax_error() {
    let hal = two_disks();
    hal.set_privileged(false);
    for line in [
        "extend size=100",
        "shrink size=100",
        "active",
        "delete partition",
        "assign mount=/mnt/x",
        "format fs=ext4 quick",
    ] {
        let (code, _, err) = run_script(&hal, line);
        assert_eq!(code, ExitCode::Syntax, "{line}");
        assert!(err.contains("select"), "{line}: {err}");
    }
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn unprivileged_mutation_is_a_service_error() {
    let hal = two_disks();
    hal.set_privileged(false);
    let (code, _, err) = run_script(&hal, "select disk 1\nclean\n");
    assert_eq!(code, ExitCode::Service);
    assert!(err.contains("sudo"));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn efi_and_msr_land_at_their_default_extents() {
    let hal = FakeHal::new().with_disk("/dev/nvme0n1", 500 * GIB);
    let (code, _, _) = run_script(
        &hal,
        "select disk 1\nconvert gpt\ncreate partition efi\ncreate partition msr\n",
    );
    assert_eq!(code, ExitCode::Ok);

    let parted: Vec<PartedOp> = hal
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            DiskOp::Parted { op, .. } => Some(op),
            _ => None,
        })
        .collect();
    assert!(matches!(
        parted[1],
        PartedOp::MkPart {
            start: Extent::Mib(1),
            end: Extent::Mib(101),
            ..
        }
    ));
    assert!(matches!(
        &parted[2],
        PartedOp::SetFlag { part_num: 1, flag, on: true } if flag == "esp"
    ));
    assert!(matches!(
        parted[3],
        PartedOp::MkPart {
            start: Extent::Mib(101),
            end: Extent::Mib(117),
            ..
        }
    ));
    assert!(hal
        .devices()
        .iter()
        .any(|d| d.path == Path::new("/dev/nvme0n1p2")));
}

#[test]
fn quoted_label_reaches_mkfs_intact() {
    let hal = two_disks();
    let (code, _, _) = run_script(
        &hal,
        "select volume sda2\nformat fs=ext4 label=\"My Disk\" quick\n",
    );
    assert_eq!(code, ExitCode::Ok);
    assert!(hal.has_operation(|op| matches!(
        op,
        DiskOp::Mkfs { spec, .. }
            if spec.fs == FsType::Ext4 && spec.label.as_deref() == Some("My Disk")
    )));
}

#[test]
fn script_stops_at_an_unknown_disk() {
    let hal = two_disks();
    let (code, out, _) = run_script(&hal, "select disk 99\nselect disk 1\nclean\n");
    assert_eq!(code, ExitCode::Service);
    assert!(!out.contains("is now the selected"));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn help_topics_are_verb_specific() {
    let hal = two_disks();
    let mut shell = Interpreter::new(&hal, InterpreterConfig::default());

    let mut format_help = Vec::new();
    shell.execute_line("help format", &mut format_help).unwrap();
    let mut select_help = Vec::new();
    shell.execute_line("HELP select", &mut select_help).unwrap();
    assert_ne!(format_help, select_help);
    assert!(String::from_utf8(format_help).unwrap().contains("fs="));

    let err = shell
        .execute_line("help nosuchverb", &mut Vec::new())
        .unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::Syntax);
}

#[test]
fn stub_verbs_succeed_and_unknown_verbs_fail() {
    let hal = two_disks();
    let (code, out, _) = run_script(&hal, "automount enable\nretain\n");
    assert_eq!(code, ExitCode::Ok);
    assert_eq!(out.matches("not yet implemented").count(), 2);

    let (code, _, _) = run_script(&hal, "defrag\n");
    assert_eq!(code, ExitCode::Syntax);
}

#[test]
fn full_provisioning_script() {
    let hal = FakeHal::new().with_disk("/dev/sdc", 64 * GIB);
    let script = "\
rem provision a data disk
select disk sdc
clean
convert gpt
create partition primary size=4096
select volume sdc1
format fs=xfs label=data quick
exit
";
    let (code, out, err) = run_script(&hal, script);
    assert_eq!(code, ExitCode::Ok, "{err}");
    assert!(out.contains("successfully formatted"));

    let ops = hal.operations();
    assert!(matches!(ops[0], DiskOp::WipeSignatures { .. }));
    assert!(matches!(
        ops.last().unwrap(),
        DiskOp::Mkfs { device, .. } if device == Path::new("/dev/sdc1")
    ));
}
