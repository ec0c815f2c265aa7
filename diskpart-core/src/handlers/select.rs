//! `select disk|partition|volume <n|name>`.

use super::required_kind;
use crate::args::ArgView;
use crate::dispatcher::Context;
use crate::errors::{CommandError, CommandResult, Outcome};
use crate::help;
use crate::session::DeviceKind;
use crate::verbs::Verb;
use std::io::Write;
use std::path::Path;

pub fn run(ctx: &mut Context<'_>, args: &ArgView) -> CommandResult {
    let kind = required_kind(args, help::usage(Verb::Select))?;
    let reference = args
        .positional(1)
        .ok_or_else(|| CommandError::syntax(format!("Specify a {} number or name.", kind)))?;

    let scope = match kind {
        DeviceKind::Partition => ctx.session.get(DeviceKind::Disk).map(Path::to_path_buf),
        _ => None,
    };
    let path = ctx
        .resolver()
        .resolve_existing(kind, reference, scope.as_deref())?;

    log::info!("selected {} {}", kind, path.display());
    writeln!(
        ctx.out,
        "{} {} is now the selected {}.",
        kind.title(),
        path.display(),
        kind
    )?;
    ctx.session.select(kind, path);
    Ok(Outcome::Done)
}
