use std::io::Write;
use std::process::{Command, Output, Stdio};

fn diskpart(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_diskpart"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run diskpart binary")
}

fn script(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp script");
    file.write_all(contents.as_bytes()).expect("write script");
    file
}

#[test]
fn help_flags_print_command_list() {
    for flag in ["-?", "/?", "-h", "/h"] {
        let output = diskpart(&[flag]);
        assert_eq!(output.status.code(), Some(0), "{flag}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Available commands"), "{flag}");
        assert!(stdout.contains("SELECT"), "{flag}");
    }
}

#[test]
fn stray_argument_is_syntax_exit() {
    assert_eq!(diskpart(&["bogus"]).status.code(), Some(5));
    assert_eq!(diskpart(&["-x"]).status.code(), Some(5));
}

#[test]
fn missing_flag_value_is_cmd_arg_exit() {
    assert_eq!(diskpart(&["-s"]).status.code(), Some(2));
    assert_eq!(diskpart(&["-t", "later"]).status.code(), Some(2));
}

#[test]
fn unreadable_script_is_file_exit() {
    let output = diskpart(&["-s", "/nonexistent/diskpart/script.txt"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn script_prints_banner_and_help_topic() {
    let file = script("rem nothing to change\nhelp format\nexit\n");
    let path = file.path().to_str().unwrap();
    let output = diskpart(&["/s", path, "-t", "-4"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DiskPart (Linux compatibility mode)"));
    assert!(stdout.contains("Usage: format"));
}

#[test]
fn script_syntax_error_sets_exit_code() {
    let file = script("frobnicate disk\nexit\n");
    let output = diskpart(&["-s", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("frobnicate"));
}

#[test]
fn script_missing_selection_is_syntax() {
    let file = script("format fs=ext4 quick\n");
    let output = diskpart(&["--dry-run", "-s", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn interactive_mode_prompts_until_exit() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_diskpart"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn diskpart");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"nosuchverb\nhelp\nexit\n")
        .expect("write commands");
    let output = child.wait_with_output().expect("wait for diskpart");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("DISKPART> ").count(), 3);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown command"));
}
