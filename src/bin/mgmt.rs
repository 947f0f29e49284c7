//! Operator CLI: runs one command against a managed process.
//!
//! Usage:
//!   mgmt [-c CONFIG] [--strict] PROCESS COMMAND [ARGS...]
//!   mgmt -e HOST:PORT [--strict] COMMAND [ARGS...]
//!
//! `list` prints the process catalog. Attributes are read with no argument
//! and written with one.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mgmtplane::client::{Executor, Outcome, ResolveOptions};
use mgmtplane::config::ClientConfig;
use mgmtplane::endpoint::parse_address;
use mgmtplane::{Command, TcpConnection};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mgmt", about = "Run a management command against a process")]
struct Cli {
    /// Client config file (default: $MGMTPLANE_CONFIG or /etc/mgmtplane/mgmtplane.json)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Connect to HOST:PORT directly instead of looking up a process
    #[arg(short = 'e', long = "endpoint", value_name = "HOST:PORT")]
    endpoint: Option<String>,

    /// Only match commands with exactly the supplied number of arguments
    #[arg(long)]
    strict: bool,

    /// Connect and per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// [PROCESS] COMMAND [ARGS...]
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

fn main() {
    mgmtplane::init_logging("warn");
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let (address, words) = resolve_target(&cli)?;
    let Some((command, args)) = words.split_first() else {
        bail!("no command given");
    };

    let connection =
        TcpConnection::connect_with_timeout(&address, Duration::from_secs(cli.timeout))
            .with_context(|| format!("connecting to {address}"))?;
    let options = if cli.strict {
        ResolveOptions::strict()
    } else {
        ResolveOptions::default()
    };
    let mut executor = Executor::with_options(connection, options);
    let outcome = executor
        .execute(command, args, &mut prompt_for_candidate)
        .with_context(|| format!("running {command}"))?;
    report(&outcome);
    Ok(())
}

/// Split the positional words into the endpoint address and the command line.
fn resolve_target(cli: &Cli) -> Result<(String, &[String])> {
    if let Some(endpoint) = &cli.endpoint {
        return Ok((parse_address(endpoint)?, cli.words.as_slice()));
    }
    let Some((process, rest)) = cli.words.split_first() else {
        bail!("no process given");
    };
    if rest.is_empty() {
        bail!("no command given for process {process}");
    }
    let config = ClientConfig::load_or_default(cli.config.as_deref())?;
    let address = config.resolve_endpoint(process)?;
    Ok((address, rest))
}

fn prompt_for_candidate(candidates: &[Command]) -> usize {
    for (position, command) in candidates.iter().enumerate() {
        println!("{}.\t{}\t({})", position + 1, command, command.owner.display_name());
    }
    print!("Several commands match. Select the index of the command to execute: ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => line.trim().parse().unwrap_or(0),
        Err(_) => 0,
    }
}

fn report(outcome: &Outcome) {
    if outcome.is_failure() {
        eprintln!("{outcome}");
    } else if let Some(text) = outcome.render() {
        println!("{text}");
    }
}
