//! Process-embeddable remote management plane.
//!
//! A process registers its beans (objects implementing [`Managed`]) with one
//! [`Catalog`]. The catalog turns each bean into attribute and operation
//! [`Command`]s, and a remote client downloads that catalog, resolves an
//! operator's command by name and argument count, converts string arguments
//! with the published [`TypeDescriptor`]s and calls back into the bean.
//!
//! Modules, leaf first: `wire` (types and the string codec), `bean`
//! (descriptor tables, extraction, bridges), `catalog` (command records and
//! the registry), `client` (resolution and execution), `remote` (the
//! connection seam and a TCP transport), `endpoint` and `config` (discovery).

pub mod bean;
pub mod catalog;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod remote;
pub mod sample;
pub mod wire;

pub use bean::{Args, DynamicBean, Managed, MethodSpec};
pub use catalog::{
    ArgumentDescriptor, Catalog, Command, CommandFeature, CommandIndex, CommandList,
    NamespaceHandle, OwnerName, REGISTRY_NAME,
};
pub use client::{Chooser, Executor, Outcome, Resolution, ResolveOptions};
pub use config::{ClientConfig, ServerConfig};
pub use endpoint::EndpointFile;
pub use error::{ClientError, ConversionError, InvokeError, RegistrationError, RemoteError};
pub use remote::{Connection, LocalConnection, ManagementServer, TcpConnection};
pub use wire::{BaseType, Opaque, TypeDescriptor, Wire, WireValue};

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`, falling back
/// to `default_directive` (e.g. `"info"`). Calling it twice is harmless.
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
