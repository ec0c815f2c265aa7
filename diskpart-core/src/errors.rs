use crate::session::DeviceKind;
use crate::verbs::Verb;
use diskpart_hal::HalError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit status. Discriminants are the values the process exits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,
    Fatal = 1,
    CmdArg = 2,
    File = 3,
    Service = 4,
    Syntax = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitCode::Ok => "ok",
            ExitCode::Fatal => "fatal",
            ExitCode::CmdArg => "bad argument",
            ExitCode::File => "file",
            ExitCode::Service => "service",
            ExitCode::Syntax => "syntax",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Successful result of one command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran.
    Done,
    /// Blank line, comment or `rem`.
    NoOp,
    /// A verb the reference tool has that this shell accepts without effect.
    NotImplemented(Verb),
    /// `exit`.
    Exit,
}

pub type CommandResult = std::result::Result<Outcome, CommandError>;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Syntax(String),

    #[error("Unknown command: {0}")]
    UnknownVerb(String),

    #[error("There is no {0} selected. Select one with 'select {0}' first.")]
    MissingSelection(DeviceKind),

    #[error("Missing required argument: {0}=")]
    MissingArgument(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidArgument { key: &'static str, value: String },

    #[error("Access denied: this command needs administrator privileges. Re-run as root (for example with sudo).")]
    NotPrivileged,

    #[error("The {kind} you specified ({reference}) is not valid.")]
    NotFound { kind: DeviceKind, reference: String },

    #[error("Device not found: {}", .0.display())]
    DeviceNotFound(PathBuf),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Cannot locate the parent disk of {}", .0.display())]
    NoParent(PathBuf),

    #[error("{} is not attached", .0.display())]
    NotAttached(PathBuf),

    #[error("{} is not mounted", .0.display())]
    NotMounted(PathBuf),

    #[error("Operation failed ({op}): {source}")]
    Hal {
        op: String,
        #[source]
        source: HalError,
    },

    #[error("Cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CommandError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        CommandError::Syntax(msg.into())
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            CommandError::Syntax(_)
            | CommandError::UnknownVerb(_)
            | CommandError::MissingSelection(_)
            | CommandError::MissingArgument(_)
            | CommandError::InvalidArgument { .. } => ExitCode::Syntax,
            CommandError::NotPrivileged
            | CommandError::NotFound { .. }
            | CommandError::DeviceNotFound(_)
            | CommandError::AlreadyExists(_)
            | CommandError::NoParent(_)
            | CommandError::NotAttached(_)
            | CommandError::NotMounted(_)
            | CommandError::Hal { .. } => ExitCode::Service,
            CommandError::Output(_) => ExitCode::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_and_argument_errors_are_syntax() {
        assert_eq!(
            CommandError::MissingSelection(DeviceKind::Partition).exit_code(),
            ExitCode::Syntax
        );
        assert_eq!(
            CommandError::MissingArgument("size").exit_code(),
            ExitCode::Syntax
        );
        assert_eq!(
            CommandError::UnknownVerb("frobnicate".into()).exit_code(),
            ExitCode::Syntax
        );
    }

    #[test]
    fn privilege_and_device_errors_are_service() {
        assert_eq!(CommandError::NotPrivileged.exit_code(), ExitCode::Service);
        assert_eq!(
            CommandError::NotFound {
                kind: DeviceKind::Disk,
                reference: "99".into()
            }
            .exit_code(),
            ExitCode::Service
        );
        assert!(CommandError::NotPrivileged.to_string().contains("sudo"));
    }

    #[test]
    fn exit_code_values_are_stable() {
        assert_eq!(ExitCode::Ok.code(), 0);
        assert_eq!(ExitCode::Fatal.code(), 1);
        assert_eq!(ExitCode::CmdArg.code(), 2);
        assert_eq!(ExitCode::File.code(), 3);
        assert_eq!(ExitCode::Service.code(), 4);
        assert_eq!(ExitCode::Syntax.code(), 5);
    }
}
