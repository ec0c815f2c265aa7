//! Verb → handler routing and the per-command context handlers work against.

use crate::args::ArgView;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::handlers;
use crate::help;
use crate::resolver::Resolver;
use crate::session::Session;
use crate::tokenizer::tokenize;
use crate::verbs::Verb;
use diskpart_hal::{DiskHal, DiskOp};
use std::io::Write;
use std::path::Path;

pub type Handler = fn(&mut Context<'_>, &ArgView) -> CommandResult;

/// Everything a handler may touch while running one command.
pub struct Context<'a> {
    pub hal: &'a dyn DiskHal,
    pub session: &'a mut Session,
    pub out: &'a mut dyn Write,
    pub device_root: &'a Path,
}

impl<'a> Context<'a> {
    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.hal, self.device_root)
    }

    pub fn require_privilege(&self) -> Result<(), CommandError> {
        if self.hal.is_privileged() {
            Ok(())
        } else {
            Err(CommandError::NotPrivileged)
        }
    }

    /// Hand one operation to the executor; returns the tool's output.
    pub fn submit(&mut self, op: DiskOp) -> Result<String, CommandError> {
        log::debug!("submit: {}", op);
        self.hal.execute(&op).map_err(|source| {
            log::warn!("{} failed: {}", op, source);
            CommandError::Hal {
                op: op.to_string(),
                source,
            }
        })
    }
}

/// The handler registered for `verb`; `None` for verbs the dispatcher answers itself
/// and for the recognized-but-unimplemented catalog.
pub fn handler_for(verb: Verb) -> Option<Handler> {
    match verb {
        Verb::Active => Some(handlers::partition::active),
        Verb::Inactive => Some(handlers::partition::inactive),
        Verb::Add => Some(handlers::volume::add),
        Verb::Break => Some(handlers::volume::break_member),
        Verb::Assign => Some(handlers::volume::assign),
        Verb::Remove => Some(handlers::volume::remove),
        Verb::Attach => Some(handlers::vdisk::attach),
        Verb::Detach => Some(handlers::vdisk::detach),
        Verb::Expand => Some(handlers::vdisk::expand),
        Verb::Attributes => Some(handlers::disk::attributes),
        Verb::Clean => Some(handlers::disk::clean),
        Verb::Convert => Some(handlers::disk::convert),
        Verb::Online => Some(handlers::disk::online),
        Verb::Offline => Some(handlers::disk::offline),
        Verb::Rescan => Some(handlers::disk::rescan),
        Verb::UniqueId => Some(handlers::disk::unique_id),
        Verb::Create => Some(handlers::create::run),
        Verb::Delete => Some(handlers::partition::delete),
        Verb::Extend => Some(handlers::partition::extend),
        Verb::Shrink => Some(handlers::partition::shrink),
        Verb::SetId => Some(handlers::partition::set_id),
        Verb::Gpt => Some(handlers::partition::gpt),
        Verb::Detail => Some(handlers::info::detail),
        Verb::Filesystems => Some(handlers::info::filesystems),
        Verb::List => Some(handlers::list::run),
        Verb::Select => Some(handlers::select::run),
        Verb::Format => Some(handlers::volume::format),
        Verb::Repair => Some(handlers::volume::repair),
        Verb::Exit | Verb::Help | Verb::Rem => None,
        Verb::Automount
        | Verb::Compact
        | Verb::Dump
        | Verb::Import
        | Verb::Merge
        | Verb::Recover
        | Verb::Retain
        | Verb::San
        | Verb::Set => None,
    }
}

fn help(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    match args.positional(0) {
        None => write!(ctx.out, "{}", help::full_help())?,
        Some(word) => {
            let verb = Verb::parse(word).ok_or_else(|| {
                CommandError::syntax(format!("Unknown command for help: {}", word))
            })?;
            writeln!(ctx.out, "{}", help::usage(verb))?;
        }
    }
    Ok(Outcome::Done)
}

/// Run one input line.
pub fn dispatch(ctx: &mut Context<'_>, line: &str) -> CommandResult {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(Outcome::NoOp);
    }
    let args = ArgView::new(tokens);
    let verb = Verb::parse(args.verb())
        .ok_or_else(|| CommandError::UnknownVerb(args.verb().to_string()))?;
    log::debug!("dispatch: {} {:?}", verb, args.rest());

    match verb {
        Verb::Rem => Ok(Outcome::NoOp),
        Verb::Exit => Ok(Outcome::Exit),
        Verb::Help => help(ctx, &args),
        _ => match handler_for(verb) {
            Some(handler) => handler(ctx, &args),
            None => {
                writeln!(
                    ctx.out,
                    "Command '{}' is recognized but not yet implemented in Linux compatibility mode.",
                    verb
                )?;
                Ok(Outcome::NotImplemented(verb))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskpart_hal::FakeHal;

    fn run(hal: &FakeHal, line: &str) -> (CommandResult, String) {
        let mut session = Session::new();
        let mut out = Vec::new();
        let mut ctx = Context {
            hal,
            session: &mut session,
            out: &mut out,
            device_root: Path::new("/dev"),
        };
        let result = dispatch(&mut ctx, line);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn blank_comment_and_rem_are_no_ops() {
        let hal = FakeHal::new();
        for line in ["", "   ", "# clean all", "rem clean all", "REM"] {
            let (result, _) = run(&hal, line);
            assert_eq!(result.unwrap(), Outcome::NoOp, "{line:?}");
        }
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn exit_is_case_insensitive() {
        let hal = FakeHal::new();
        assert_eq!(run(&hal, "EXIT").0.unwrap(), Outcome::Exit);
    }

    #[test]
    fn unknown_verb_is_distinct_from_stub() {
        let hal = FakeHal::new();
        let (result, _) = run(&hal, "frobnicate disk");
        assert!(matches!(result, Err(CommandError::UnknownVerb(ref v)) if v == "frobnicate"));

        let (result, out) = run(&hal, "san policy=onlineall");
        assert_eq!(result.unwrap(), Outcome::NotImplemented(Verb::San));
        assert!(out.contains("recognized but not yet implemented"));
    }

    #[test]
    fn help_for_unknown_topic_is_syntax() {
        let hal = FakeHal::new();
        let (result, _) = run(&hal, "help nosuchverb");
        assert_eq!(
            result.unwrap_err().exit_code(),
            crate::errors::ExitCode::Syntax
        );
    }

    #[test]
    fn help_topic_prints_usage() {
        let hal = FakeHal::new();
        let (result, out) = run(&hal, "? format");
        assert_eq!(result.unwrap(), Outcome::Done);
        assert!(out.starts_with("Usage: format"));
    }

    #[test]
    fn every_implemented_verb_has_a_handler() {
        for verb in Verb::ALL {
            let dispatcher_owned = matches!(verb, Verb::Exit | Verb::Help | Verb::Rem);
            assert_eq!(
                handler_for(verb).is_some(),
                verb.is_implemented() && !dispatcher_owned,
                "{verb}"
            );
        }
    }
}
