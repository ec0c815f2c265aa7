use anyhow::Context;
use diskpart_core::help::full_help;
use diskpart_core::{logging, ExitCode, Interpreter, InterpreterConfig};
use diskpart_hal::LinuxHal;
use log::LevelFilter;
use std::io::{self, Write};

mod cli;

fn main() -> std::process::ExitCode {
    match run() {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("diskpart: {:#}", err);
            ExitCode::Fatal.into()
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let code = cli::exit_code_for(&err);
            eprintln!("{}", err.render());
            eprintln!("{}", cli::USAGE);
            return Ok(code);
        }
    };
    logging::init(if cli.dry_run {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.help {
        writeln!(out, "{}\n", cli::USAGE).context("failed to write usage")?;
        write!(out, "{}", full_help()).context("failed to write help")?;
        return Ok(ExitCode::Ok);
    }

    let config = InterpreterConfig::default()
        .with_dry_run(cli.dry_run)
        .with_startup_delay_secs(cli.timeout.unwrap_or(0));
    Interpreter::print_banner(&mut out).context("failed to write banner")?;
    out.flush().context("failed to flush stdout")?;
    if !config.startup_delay.is_zero() {
        log::debug!("startup delay {:?}", config.startup_delay);
        std::thread::sleep(config.startup_delay);
    }

    let hal = LinuxHal::new(config.dry_run);
    let mut shell = Interpreter::new(&hal, config);
    let stderr = io::stderr();
    let mut err = stderr.lock();
    let code = match &cli.script {
        Some(path) => shell.run_script(path, &mut out, &mut err),
        None => shell.run_interactive(io::stdin().lock(), &mut out, &mut err),
    };
    log::debug!("exiting with {}", code);
    Ok(code)
}
