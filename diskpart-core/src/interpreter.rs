//! Interactive and script-driven command loops.

use crate::config::InterpreterConfig;
use crate::dispatcher::{dispatch, Context};
use crate::errors::{CommandResult, ExitCode, Outcome};
use crate::session::Session;
use crate::tokenizer::tokenize;
use diskpart_hal::DiskHal;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub const BANNER: &str = "DiskPart (Linux compatibility mode)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
    Failed(ExitCode),
}

impl LoopState {
    pub fn exit_code(self) -> ExitCode {
        match self {
            LoopState::Running | LoopState::Terminated => ExitCode::Ok,
            LoopState::Failed(code) => code,
        }
    }
}

/// A script line carrying `noerr` keeps the script going when it fails.
fn continues_on_error(line: &str) -> bool {
    tokenize(line)
        .iter()
        .skip(1)
        .any(|t| t.eq_ignore_ascii_case("noerr"))
}

pub struct Interpreter<'h> {
    hal: &'h dyn DiskHal,
    session: Session,
    config: InterpreterConfig,
}

impl<'h> Interpreter<'h> {
    pub fn new(hal: &'h dyn DiskHal, config: InterpreterConfig) -> Self {
        Self {
            hal,
            session: Session::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn print_banner(out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", BANNER)?;
        writeln!(out)
    }

    /// Run one line against the session.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> CommandResult {
        let mut ctx = Context {
            hal: self.hal,
            session: &mut self.session,
            out,
            device_root: &self.config.device_root,
        };
        dispatch(&mut ctx, line)
    }

    fn step(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
        script: bool,
    ) -> LoopState {
        match self.execute_line(line, out) {
            Ok(Outcome::Exit) => LoopState::Terminated,
            Ok(_) => LoopState::Running,
            Err(e) => {
                let code = e.exit_code();
                log::warn!("'{}' failed: {}", line.trim(), e);
                if writeln!(err, "{}", e).is_err() || code == ExitCode::Fatal {
                    return LoopState::Failed(ExitCode::Fatal);
                }
                if script && !continues_on_error(line) {
                    LoopState::Failed(code)
                } else {
                    LoopState::Running
                }
            }
        }
    }

    /// Prompt, read, run until `exit` or end of input. Command errors never end the loop.
    pub fn run_interactive(
        &mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ExitCode {
        let mut lines = input.lines();
        loop {
            if write!(out, "{}", self.config.prompt)
                .and_then(|_| out.flush())
                .is_err()
            {
                return ExitCode::Fatal;
            }
            let line = match lines.next() {
                None => {
                    let _ = writeln!(out);
                    return ExitCode::Ok;
                }
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    log::error!("cannot read input: {}", e);
                    return ExitCode::Fatal;
                }
            };
            match self.step(&line, out, err, false) {
                LoopState::Running => {}
                state => return state.exit_code(),
            }
        }
    }

    /// Run script lines in order; the first failing line decides the exit code.
    pub fn run_script_from(
        &mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ExitCode {
        let mut state = LoopState::Running;
        for (index, line) in input.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = writeln!(err, "Cannot read script: {}", e);
                    state = LoopState::Failed(ExitCode::File);
                    break;
                }
            };
            log::debug!("script line {}: {}", index + 1, line);
            state = self.step(&line, out, err, true);
            if state != LoopState::Running {
                break;
            }
        }
        state.exit_code()
    }

    pub fn run_script(&mut self, path: &Path, out: &mut dyn Write, err: &mut dyn Write) -> ExitCode {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::error!("cannot open script {}: {}", path.display(), e);
                let _ = writeln!(err, "Cannot open script file {}: {}", path.display(), e);
                return ExitCode::File;
            }
        };
        self.run_script_from(BufReader::new(file), out, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DeviceKind;
    use diskpart_hal::FakeHal;
    use std::io::Cursor;

    const GIB: u64 = 1 << 30;

    fn hal() -> FakeHal {
        FakeHal::new()
            .with_disk("/dev/sda", 10 * GIB)
            .with_partition("/dev/sda", 1, 1, GIB)
    }

    #[test]
    fn interactive_survives_errors_and_stops_on_exit() {
        let hal = hal();
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let code = shell.run_interactive(
            Cursor::new("frobnicate\nselect disk 1\nexit\nclean\n"),
            &mut out,
            &mut err,
        );
        assert_eq!(code, ExitCode::Ok);
        assert!(String::from_utf8(err).unwrap().contains("Unknown command"));
        assert_eq!(
            shell.session().get(DeviceKind::Disk),
            Some(Path::new("/dev/sda"))
        );
        assert_eq!(hal.operation_count(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap().matches("DISKPART> ").count(),
            3
        );
    }

    #[test]
    fn interactive_end_of_input_is_clean() {
        let hal = hal();
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let code = shell.run_interactive(Cursor::new(""), &mut Vec::new(), &mut Vec::new());
        assert_eq!(code, ExitCode::Ok);
    }

    #[test]
    fn script_stops_at_first_error() {
        let hal = hal();
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let code = shell.run_script_from(
            Cursor::new("select disk 1\nselect partition 7\nclean\n"),
            &mut Vec::new(),
            &mut Vec::new(),
        );
        assert_eq!(code, ExitCode::Service);
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn noerr_lets_the_script_continue() {
        let hal = hal();
        hal.fail_program("fsck");
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let code = shell.run_script_from(
            Cursor::new("select volume sda1\nrepair noerr\nselect disk 1\nclean\n"),
            &mut Vec::new(),
            &mut Vec::new(),
        );
        assert_eq!(code, ExitCode::Ok);
        assert!(hal.has_operation(|op| matches!(op, diskpart_hal::DiskOp::WipeSignatures { .. })));
    }

    #[test]
    fn script_exit_is_success() {
        let hal = hal();
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let code = shell.run_script_from(
            Cursor::new("rem setup\n\nexit\nfrobnicate\n"),
            &mut Vec::new(),
            &mut Vec::new(),
        );
        assert_eq!(code, ExitCode::Ok);
    }

    #[test]
    fn missing_script_file_is_file_error() {
        let hal = hal();
        let mut shell = Interpreter::new(&hal, InterpreterConfig::default());
        let code = shell.run_script(
            Path::new("/nonexistent/diskpart-script.txt"),
            &mut Vec::new(),
            &mut Vec::new(),
        );
        assert_eq!(code, ExitCode::File);
    }
}
