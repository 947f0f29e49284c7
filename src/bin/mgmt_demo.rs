//! Demo process: serves the sample beans until interrupted.
//!
//! The bound address is printed on stdout and published as an endpoint file
//! under `--name`, so `mgmt <name> list` finds it.

use anyhow::{Result, bail};
use clap::Parser;
use mgmtplane::config::ServerConfig;
use mgmtplane::sample::{CounterBean, HealthBean};
use mgmtplane::{Catalog, ManagementServer};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mgmt-demo", about = "Serve sample management beans")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:0")]
    bind: String,

    /// Process name used for the endpoint file
    #[arg(long, default_value = "mgmt-demo")]
    name: String,

    /// Directory for the endpoint file (default: system temp dir)
    #[arg(long)]
    endpoint_dir: Option<PathBuf>,
}

fn main() {
    mgmtplane::init_logging("info");
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    // Must happen before any thread is spawned so every thread inherits the mask.
    let signals = block_termination_signals()?;

    let catalog = Catalog::new();
    let counter = Arc::new(CounterBean::new());
    let database = Arc::new(HealthBean::new("Database"));
    let cache = Arc::new(HealthBean::new("Cache"));
    catalog.register(&counter)?;
    catalog.register(&database)?;
    catalog.register(&cache)?;

    let mut config = ServerConfig::default()
        .with_bind(cli.bind)
        .with_process_name(cli.name);
    if let Some(dir) = cli.endpoint_dir {
        config = config.with_endpoint_dir(dir);
    }
    let server = ManagementServer::start(&config, Arc::clone(&catalog))?;
    println!("{}", server.local_addr());

    let signal = wait_for(&signals)?;
    tracing::info!("Received signal {}, shutting down", signal);
    server.shutdown();
    Ok(())
}

#[cfg(unix)]
type SignalSet = libc::sigset_t;

#[cfg(unix)]
fn block_termination_signals() -> Result<SignalSet> {
    let mut set = unsafe { std::mem::zeroed::<libc::sigset_t>() };
    let rc = unsafe {
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGINT);
        libc::sigaddset(&mut set, libc::SIGTERM);
        libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut())
    };
    if rc != 0 {
        bail!("blocking termination signals failed with code {rc}");
    }
    Ok(set)
}

#[cfg(unix)]
fn wait_for(set: &SignalSet) -> Result<i32> {
    let mut signal = 0;
    let rc = unsafe { libc::sigwait(set, &mut signal) };
    if rc != 0 {
        bail!("waiting for termination signal failed with code {rc}");
    }
    Ok(signal)
}

#[cfg(not(unix))]
type SignalSet = ();

#[cfg(not(unix))]
fn block_termination_signals() -> Result<SignalSet> {
    Ok(())
}

#[cfg(not(unix))]
fn wait_for(_: &SignalSet) -> Result<i32> {
    loop {
        std::thread::park();
    }
}
