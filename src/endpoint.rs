//! Endpoint discovery files.
//!
//! A serving process writes `<dir>/<process name>.mgmt` containing exactly its
//! `host:port`, and removes it again on shutdown. Clients that only know the
//! process name read the address back from the same directory.

use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ENDPOINT_SUFFIX: &str = "mgmt";

/// Default discovery directory: the system temp dir.
pub fn default_endpoint_dir() -> PathBuf {
    env::temp_dir()
}

pub fn endpoint_path(dir: &Path, process_name: &str) -> PathBuf {
    dir.join(format!("{process_name}.{ENDPOINT_SUFFIX}"))
}

/// Guard for a published endpoint file; the file is removed on drop.
#[derive(Debug)]
pub struct EndpointFile {
    path: PathBuf,
}

impl EndpointFile {
    /// Write the endpoint file, replacing any stale one.
    ///
    /// Publication is best effort: a failure is logged and `None` returned so
    /// the server keeps running without discovery.
    pub fn publish(dir: &Path, process_name: &str, address: &str) -> Option<Self> {
        let path = endpoint_path(dir, process_name);
        match fs::write(&path, address) {
            Ok(()) => {
                tracing::info!("Published endpoint {} at {}", address, path.display());
                Some(Self { path })
            }
            Err(err) => {
                tracing::warn!("Failed to write endpoint file {}: {}", path.display(), err);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EndpointFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to remove endpoint file {}: {}", self.path.display(), err);
            }
        }
    }
}

/// Read the address published by `process_name`, if any.
pub fn read_endpoint(dir: &Path, process_name: &str) -> Result<Option<String>> {
    let path = endpoint_path(dir, process_name);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("reading endpoint file {}", path.display()));
        }
    };
    let address = contents.trim();
    if address.is_empty() {
        bail!("endpoint file {} is empty", path.display());
    }
    parse_address(address)
        .with_context(|| format!("endpoint file {}", path.display()))
        .map(Some)
}

/// Validate a `host:port` address and return it normalized (trimmed).
pub fn parse_address(address: &str) -> Result<String> {
    let address = address.trim();
    let Some((host, port)) = address.rsplit_once(':') else {
        bail!("address {address:?} must be host:port");
    };
    if host.is_empty() {
        bail!("address {address:?} has no host");
    }
    port.parse::<u16>()
        .with_context(|| format!("address {address:?} has an invalid port"))?;
    Ok(address.to_string())
}
