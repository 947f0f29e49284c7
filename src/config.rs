//! Client and server configuration.
//!
//! The client reads a JSON file listing known processes so an operator can
//! address a process by name. The server side is configured in code through
//! [`ServerConfig`].

use crate::endpoint::{default_endpoint_dir, parse_address, read_endpoint};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "MGMTPLANE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mgmtplane/mgmtplane.json";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const HOST_FLAG: &str = "--mgmt-host";
pub const PORT_FLAG: &str = "--mgmt-port";
/// How long a server connection may sit without a complete request.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Directory holding endpoint files. Defaults to the system temp dir.
    #[serde(default)]
    pub temp: Option<PathBuf>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// A known process and the command line it is started with.
pub struct ProcessConfig {
    pub name: String,
    #[serde(default)]
    pub args: String,
}

impl ProcessConfig {
    /// Value following `flag` in the argument string (`--flag value` or
    /// `--flag=value`).
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        let mut words = self.args.split_whitespace();
        while let Some(word) = words.next() {
            if word == flag {
                return words.next();
            }
            if let Some(value) = word.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
                return Some(value);
            }
        }
        None
    }

    /// `host:port` built from the management flags in `args`.
    pub fn address(&self) -> Result<String> {
        let host = self.arg_value(HOST_FLAG).unwrap_or(DEFAULT_HOST);
        let Some(port) = self.arg_value(PORT_FLAG) else {
            bail!("process {} has no {} in its arguments", self.name, PORT_FLAG);
        };
        parse_address(&format!("{host}:{port}"))
            .with_context(|| format!("process {} arguments", self.name))
    }
}

impl ClientConfig {
    /// Load a config file. Missing or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load an explicitly requested file, or the default one if it exists.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::default_path();
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// `$MGMTPLANE_CONFIG` when set, else the system-wide path.
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn process(&self, name: &str) -> Option<&ProcessConfig> {
        self.processes.iter().find(|process| process.name == name)
    }

    pub fn endpoint_dir(&self) -> PathBuf {
        self.global.temp.clone().unwrap_or_else(default_endpoint_dir)
    }

    /// Address of a named process: its published endpoint file first, then
    /// the management flags in its configured arguments.
    pub fn resolve_endpoint(&self, process_name: &str) -> Result<String> {
        if let Some(address) = read_endpoint(&self.endpoint_dir(), process_name)? {
            return Ok(address);
        }
        match self.process(process_name) {
            Some(process) => process.address(),
            None => bail!(
                "no endpoint published for process {} in {} and no configuration entry for it",
                process_name,
                self.endpoint_dir().display()
            ),
        }
    }
}

/// How a process serves its catalog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    /// When set, the bound address is published as an endpoint file.
    pub process_name: Option<String>,
    pub endpoint_dir: PathBuf,
    /// Read timeout on accepted connections; an idle client is disconnected.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("{DEFAULT_HOST}:0"),
            process_name: None,
            endpoint_dir: default_endpoint_dir(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn with_endpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.endpoint_dir = dir.into();
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}
