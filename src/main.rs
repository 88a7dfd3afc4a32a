use anyhow::{Context, Result};
use clap::Parser;
use ptyscript::logging::init_tracing;
use ptyscript::{script, PtyError, Session, SessionConfig, Step};
use std::path::PathBuf;
use std::time::Duration;

/// Run an interactive program on a pseudo-terminal and answer its prompts.
#[derive(Debug, Parser)]
#[command(name = "ptyscript", version)]
struct Cli {
    /// Session config file (default: $PTYSCRIPT_CONFIG or the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait for each expected prompt.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Seconds to wait for the program to exit after the last step.
    #[arg(long, default_value_t = 10)]
    wait_secs: u64,

    /// Step to run, in order: expect:TEXT, line:TEXT, send:TEXT, key:NAME,
    /// enter, answer:PROMPT=>RESPONSE.
    #[arg(long = "step", value_name = "STEP")]
    steps: Vec<Step>,

    /// Print output with escape sequences left in.
    #[arg(long)]
    raw: bool,

    /// Program to run.
    program: String,

    /// Arguments for the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::load_from(path),
        None => SessionConfig::load(),
    }
    .context("loading session config")?;

    let mut session = Session::spawn_with_config(&cli.program, &cli.args, config)
        .with_context(|| format!("starting {}", cli.program))?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    if let Err(err) = script::run(&mut session, &cli.steps, timeout) {
        eprintln!("{}", session.dump_output());
        session.close();
        return Err(err).context("running steps");
    }

    session.read_all(timeout);
    let output = if cli.raw {
        session.full_output()
    } else {
        session.full_clean_output()
    };
    print!("{output}");

    let code = match session.wait(Duration::from_secs(cli.wait_secs)) {
        Ok(exit) => exit.code(),
        Err(PtyError::WaitTimeout { timeout }) => {
            tracing::warn!(?timeout, "program still running, closing it");
            1
        }
        Err(err) => return Err(err).context("waiting for program"),
    };
    session.close();

    std::process::exit(i32::try_from(code).unwrap_or(1));
}
