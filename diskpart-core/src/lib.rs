//! Core of the diskpart shell.
//!
//! Lines are tokenized, routed to a handler by verb, and turned into [`diskpart_hal::DiskOp`]
//! descriptors that an injected executor carries out. All state lives in an
//! [`interpreter::Interpreter`] value.

pub mod args;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod help;
pub mod interpreter;
pub mod logging;
pub mod resolver;
pub mod session;
pub mod tokenizer;
pub mod verbs;

pub use config::InterpreterConfig;
pub use errors::{CommandError, CommandResult, ExitCode, Outcome};
pub use interpreter::{Interpreter, LoopState, BANNER};
pub use session::{DeviceKind, Session};
pub use verbs::Verb;
