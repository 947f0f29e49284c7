#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use mgmtplane::bean::{Managed, MethodSpec};
use mgmtplane::config::ServerConfig;
use mgmtplane::error::RemoteError;
use mgmtplane::remote::Connection;
use mgmtplane::{Catalog, ManagementServer, OwnerName, TypeDescriptor};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub fn mgmt_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mgmt"))
}

/// Run a command, feeding `stdin`, and require success.
pub fn run_command(mut cmd: Command, stdin: &str) -> Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if let Some(mut input) = child.stdin.take() {
        input.write_all(stdin.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn start_server(catalog: &Arc<Catalog>, endpoint_dir: &Path, name: &str) -> Result<ManagementServer> {
    let config = ServerConfig::default()
        .with_process_name(name)
        .with_endpoint_dir(endpoint_dir);
    ManagementServer::start(&config, Arc::clone(catalog))
}

/// Read-only gauge whose only other method is an operation missing its
/// parameter metadata when `broken` is set.
pub struct Gauge {
    pub name: &'static str,
    pub broken: bool,
    pub reads: AtomicUsize,
}

impl Gauge {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            broken: false,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn broken(name: &'static str) -> Self {
        Self {
            broken: true,
            ..Self::new(name)
        }
    }
}

impl Managed for Gauge {
    fn description(&self) -> &str {
        "Test gauge"
    }

    fn methods(&self) -> Vec<MethodSpec<Self>> {
        let mut methods = vec![MethodSpec::getter("getLevel", "Current level", |g: &Gauge| {
            g.reads.fetch_add(1, Ordering::SeqCst) as i64
        })];
        if self.broken {
            methods.push(
                MethodSpec::new("calibrate", "Calibrate")
                    .bare_param::<f64>()
                    .handler(|_: &Gauge, _| Ok(())),
            );
        }
        methods
    }

    fn namespace(&self) -> OwnerName {
        OwnerName::from(format!("suite:type={}", self.name))
    }
}

/// Bean with one operation that answers after `delay` and one that answers
/// at once.
pub struct Pacer {
    pub delay: Duration,
}

impl Managed for Pacer {
    fn description(&self) -> &str {
        "Slow and fast replies"
    }

    fn methods(&self) -> Vec<MethodSpec<Self>> {
        vec![
            MethodSpec::new("slow", "Reply after a delay").handler(|pacer: &Pacer, _| {
                thread::sleep(pacer.delay);
                Ok("slow reply".to_string())
            }),
            MethodSpec::new("fast", "Reply at once")
                .handler(|_: &Pacer, _| Ok("fast reply".to_string())),
        ]
    }

    fn namespace(&self) -> OwnerName {
        OwnerName::from("suite:type=Pacer")
    }
}

/// Wraps a connection and counts every call other than the catalog download.
pub struct Counting<C> {
    pub inner: C,
    pub calls: AtomicUsize,
}

impl<C> Counting<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C: Connection> Connection for Counting<C> {
    fn get_attribute(&self, owner: &OwnerName, name: &str) -> Result<String, RemoteError> {
        if !owner.is_registry() {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.get_attribute(owner, name)
    }

    fn set_attribute(&self, owner: &OwnerName, name: &str, value: &str) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_attribute(owner, name, value)
    }

    fn invoke(
        &self,
        owner: &OwnerName,
        name: &str,
        args: &[String],
        signature: &[TypeDescriptor],
    ) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.invoke(owner, name, args, signature)
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
