// Integration suite: catalog, client and transport exercised together, over
// both the in-process connection and a loopback TCP server.

mod support;

use anyhow::{Context, Result, ensure};
use mgmtplane::client::{Executor, Outcome, ResolveOptions};
use mgmtplane::config::{ClientConfig, GlobalConfig, ProcessConfig};
use mgmtplane::error::{ClientError, RegistrationError, RemoteError};
use mgmtplane::remote::{Connection, LocalConnection, TcpConnection};
use mgmtplane::sample::{CounterBean, HealthBean};
use mgmtplane::{Catalog, Command, OwnerName, WireValue};
use std::fs;
use std::process::Command as Process;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use support::{Counting, Gauge, Pacer, mgmt_binary, run_command, start_server, strings};
use tempfile::TempDir;

fn never(_: &[Command]) -> usize {
    panic!("resolution should not be ambiguous")
}

// Ensures a registered bean publishes one command per operation and merged
// attribute, and that registering the same name again changes nothing.
#[test]
fn listing_matches_exposed_features_and_ignores_reregistration() -> Result<()> {
    let catalog = Catalog::new();
    let counter = Arc::new(CounterBean::new());
    let owner = catalog.register(&counter)?;

    let commands: Vec<_> = catalog
        .list()
        .iter()
        .filter(|command| command.owner == owner)
        .cloned()
        .collect();
    // four operations, two merged attributes
    ensure!(commands.len() == 6, "unexpected commands {commands:?}");
    ensure!(commands.iter().filter(|c| c.is_attribute()).count() == 2);

    let before = catalog.list();
    catalog.register(&counter)?;
    catalog.register(&Arc::new(CounterBean::new()))?;
    ensure!(catalog.list() == before, "re-registration changed the catalog");
    Ok(())
}

// Ensures a getter-only attribute reads over TCP and a write attempt is
// refused on the client without reaching the server.
#[test]
fn getter_only_attribute_over_tcp() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = Catalog::new();
    let gauge = Arc::new(Gauge::new("Pressure"));
    catalog.register(&gauge)?;
    let server = start_server(&catalog, dir.path(), "gauges")?;

    let tcp = TcpConnection::connect(&server.local_addr().to_string())?;
    let mut executor = Executor::new(Counting::new(tcp));
    let listed = executor.refresh()?.commands().clone();
    let level = listed
        .iter()
        .find(|c| c.name == "level")
        .context("level attribute missing")?;
    ensure!(level.status == 1);

    let read = executor.execute("level", &[], &mut never)?;
    ensure!(read.render().as_deref() == Some("0"), "{read:?}");

    let write = executor.execute("level", &strings(&["5"]), &mut never)?;
    ensure!(matches!(write, Outcome::NotWritable { .. }), "{write:?}");
    ensure!(executor.connection().calls() == 1, "write reached the server");
    ensure!(gauge.reads.load(Ordering::SeqCst) == 1);

    let err = executor
        .connection()
        .set_attribute(&OwnerName::from("suite:type=Pressure"), "level", "5")
        .unwrap_err();
    ensure!(err.to_string().contains("not writable"), "{err}");
    Ok(())
}

// Ensures `name value` writes a zero-argument attribute by default and is
// not found in strict mode.
#[test]
fn single_argument_fallback_writes_attributes() -> Result<()> {
    let catalog = Catalog::new();
    let counter = Arc::new(CounterBean::new());
    catalog.register(&counter)?;
    let mut executor = Executor::new(LocalConnection::new(Arc::clone(&catalog)));

    let written = executor.execute("count", &strings(&["12"]), &mut never)?;
    ensure!(matches!(written, Outcome::Written { .. }), "{written:?}");
    ensure!(counter.count() == 12);

    let read = executor.execute("countZero", &[], &mut never)?;
    ensure!(read.render().as_deref() == Some("false"));

    let missing = executor.execute("count", &strings(&["1", "2"]), &mut never)?;
    ensure!(matches!(missing, Outcome::NotFound { .. }), "{missing:?}");

    let mut strict = Executor::with_options(LocalConnection::new(catalog), ResolveOptions::strict());
    let outcome = strict.execute("count", &strings(&["3"]), &mut never)?;
    ensure!(matches!(outcome, Outcome::NotFound { .. }), "{outcome:?}");
    ensure!(counter.count() == 12);
    Ok(())
}

// Ensures a command name shared by two beans goes through the chooser, and an
// out-of-range selection invokes nothing.
#[test]
fn shared_command_names_need_a_selection() -> Result<()> {
    let catalog = Catalog::new();
    let database = Arc::new(HealthBean::new("Database"));
    let cache = Arc::new(HealthBean::new("Cache"));
    catalog.register(&database)?;
    catalog.register(&cache)?;
    cache.set_status("DOWN");

    let mut executor = Executor::new(LocalConnection::new(catalog));
    let mut offered = 0;
    let first = executor.execute("status", &[], &mut |candidates: &[Command]| {
        offered = candidates.len();
        1
    })?;
    ensure!(offered == 2);
    ensure!(first.render().as_deref() == Some("\"OK\""), "{first:?}");

    let second = executor.execute("status", &[], &mut |_: &[Command]| 2)?;
    ensure!(second.render().as_deref() == Some("\"DOWN\""), "{second:?}");

    let neither = executor.execute("status", &[], &mut |_: &[Command]| 7)?;
    ensure!(neither.to_string() == "Index out of range");
    Ok(())
}

// Ensures the chosen overload's signature decides the argument conversion on
// both sides.
#[test]
fn overloaded_operation_uses_the_selected_signature() -> Result<()> {
    let catalog = Catalog::new();
    let counter = Arc::new(CounterBean::new());
    catalog.register(&counter)?;
    let mut executor = Executor::new(LocalConnection::new(catalog));

    executor.execute("increaseCount", &strings(&["5"]), &mut |c: &[Command]| {
        c.iter()
            .position(|command| command.args[0].ty.to_string() == "Long")
            .map_or(0, |i| i + 1)
    })?;
    executor.execute("increaseCount", &[], &mut never)?;
    ensure!(counter.count() == 6);

    // 3_000_000_000 fits a Long but not an Integer.
    let err = executor
        .execute("increaseCount", &strings(&["3000000000"]), &mut |c: &[Command]| {
            c.iter()
                .position(|command| command.args[0].ty.to_string() == "Integer")
                .map_or(0, |i| i + 1)
        })
        .unwrap_err();
    ensure!(matches!(err, ClientError::Conversion(_)), "{err:?}");
    ensure!(counter.count() == 6);

    let recent = executor.execute("recentCounts", &strings(&["5"]), &mut never)?;
    match recent {
        Outcome::Invoked { value, .. } => ensure!(
            value == WireValue::Array(vec![WireValue::Int(0), WireValue::Int(5)]),
            "{value:?}"
        ),
        other => anyhow::bail!("unexpected {other:?}"),
    }
    Ok(())
}

// Ensures a bean with undescribed operation parameters is rejected without
// touching the beans already registered.
#[test]
fn broken_bean_does_not_disturb_registered_ones() -> Result<()> {
    let catalog = Catalog::new();
    let healthy = Arc::new(Gauge::new("Healthy"));
    catalog.register(&healthy)?;
    let before = catalog.list();

    let err = catalog.register(&Arc::new(Gauge::broken("Broken"))).unwrap_err();
    ensure!(matches!(err, RegistrationError::MissingParamMetadata { index: 0, .. }));
    ensure!(catalog.list() == before);
    ensure!(!catalog.is_registered("suite:type=Broken"));

    let mut executor = Executor::new(LocalConnection::new(catalog));
    let read = executor.execute("level", &[], &mut never)?;
    ensure!(read.render().as_deref() == Some("0"));
    Ok(())
}

// Ensures concurrent registrations of one name publish its commands exactly
// once.
#[test]
fn concurrent_registration_is_atomic_per_bean() -> Result<()> {
    let catalog = Catalog::new();
    let barrier = Arc::new(Barrier::new(16));
    let names = [
        "A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7", "B0", "B1", "B2", "B3", "B4", "B5", "B6",
        "B7",
    ];
    let workers: Vec<_> = names
        .iter()
        .map(|name| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            // Every A thread registers the same name; B names are unique.
            let shared = if name.starts_with('B') { *name } else { "Shared" };
            thread::spawn(move || {
                barrier.wait();
                let gauge = Arc::new(Gauge::new(shared));
                let owner = catalog.register(&gauge);
                (owner, gauge)
            })
        })
        .collect();
    let mut keep = Vec::new();
    for worker in workers {
        let (owner, gauge) = worker.join().map_err(|_| anyhow::anyhow!("worker panicked"))?;
        owner?;
        keep.push(gauge);
    }

    let list = catalog.list();
    // registry + "Shared" once + eight B gauges, one attribute each
    ensure!(list.len() == 1 + 1 + 8, "catalog has {} commands", list.len());
    let shared = list
        .iter()
        .filter(|c| c.owner.as_str() == "suite:type=Shared")
        .count();
    ensure!(shared == 1);
    Ok(())
}

// Ensures a client finds a server by process name through its endpoint file
// and falls back to configured arguments once the file is gone.
#[test]
fn endpoint_discovery_by_process_name() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = Catalog::new();
    catalog.register(&Arc::new(CounterBean::new()))?;
    let server = start_server(&catalog, dir.path(), "billing")?;

    let config = ClientConfig {
        global: GlobalConfig {
            temp: Some(dir.path().to_path_buf()),
        },
        processes: vec![ProcessConfig {
            name: "billing".into(),
            args: "--mgmt-port 1".into(),
        }],
    };
    let address = config.resolve_endpoint("billing")?;
    ensure!(address == server.local_addr().to_string());

    let connection = TcpConnection::connect(&address)?;
    ensure!(connection.list()? == catalog.list());

    let endpoint = dir.path().join("billing.mgmt");
    server.shutdown();
    ensure!(!endpoint.exists(), "endpoint file left behind");
    ensure!(config.resolve_endpoint("billing")? == "127.0.0.1:1");
    Ok(())
}

// Ensures the mgmt binary lists, writes, invokes and prompts against a running
// server.
#[test]
fn cli_runs_commands_against_a_live_process() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = Catalog::new();
    let counter = Arc::new(CounterBean::new());
    catalog.register(&counter)?;
    catalog.register(&Arc::new(HealthBean::new("Database")))?;
    catalog.register(&Arc::new(HealthBean::new("Cache")))?;
    let _server = start_server(&catalog, dir.path(), "demo")?;

    let config_path = dir.path().join("mgmt.json");
    fs::write(
        &config_path,
        serde_json::to_string(&ClientConfig {
            global: GlobalConfig {
                temp: Some(dir.path().to_path_buf()),
            },
            processes: Vec::new(),
        })?,
    )?;

    let mgmt = |args: &[&str], stdin: &str| -> Result<String> {
        let mut cmd = Process::new(mgmt_binary());
        cmd.arg("-c").arg(&config_path).arg("demo").args(args);
        let output = run_command(cmd, stdin)?;
        Ok(String::from_utf8(output.stdout)?)
    };

    let listing = mgmt(&["list"], "")?;
    ensure!(listing.starts_with("Registry:\n"), "{listing}");
    ensure!(listing.contains("CounterBean:\n"), "{listing}");
    ensure!(listing.contains("\tcommand: increaseCount\n"), "{listing}");

    mgmt(&["count", "41"], "")?;
    mgmt(&["increaseCount"], "")?;
    ensure!(mgmt(&["count"], "")?.trim() == "42");
    ensure!(counter.count() == 42);

    let status = mgmt(&["status"], "2\n")?;
    ensure!(status.contains("1.\tstatus\t"), "{status}");
    ensure!(status.trim_end().ends_with("\"OK\""), "{status}");

    let unknown = {
        let mut cmd = Process::new(mgmt_binary());
        cmd.arg("-c").arg(&config_path).arg("demo").arg("nosuch");
        run_command(cmd, "")?
    };
    ensure!(String::from_utf8(unknown.stderr)?.contains("Command not found: nosuch"));
    Ok(())
}

// Ensures a reply that arrives after the client gave up is never taken as the
// answer to a later request on the same connection.
#[test]
fn timed_out_connection_is_not_reused() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = Catalog::new();
    catalog.register(&Arc::new(Pacer {
        delay: Duration::from_millis(600),
    }))?;
    let server = start_server(&catalog, dir.path(), "pacer")?;
    let address = server.local_addr().to_string();
    let owner = OwnerName::from("suite:type=Pacer");

    let connection = TcpConnection::connect_with_timeout(&address, Duration::from_millis(200))?;
    ensure!(connection.invoke(&owner, "slow", &[], &[]).is_err());
    ensure!(!connection.is_open());

    // Give the late reply time to land on the abandoned socket.
    thread::sleep(Duration::from_millis(700));
    let err = connection.invoke(&owner, "fast", &[], &[]).unwrap_err();
    ensure!(matches!(err, RemoteError::Closed), "{err:?}");

    let fresh = TcpConnection::connect(&address)?;
    ensure!(fresh.invoke(&owner, "fast", &[], &[])? == "fast reply");
    Ok(())
}
