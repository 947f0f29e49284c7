//! Transport between a client and a serving process.
//!
//! The client core only needs a [`Connection`]. [`LocalConnection`] serves an
//! in-process catalog directly; [`TcpConnection`] speaks the line-delimited
//! JSON protocol in `protocol` to a [`ManagementServer`].

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{DEFAULT_TIMEOUT, TcpConnection};
pub use protocol::{Request, Response};
pub use server::ManagementServer;

use crate::catalog::{Catalog, CommandList, OwnerName};
use crate::error::RemoteError;
use crate::wire::TypeDescriptor;
use std::sync::Arc;

/// Remote calls the client issues. Values are wire strings.
pub trait Connection {
    fn get_attribute(&self, owner: &OwnerName, name: &str) -> Result<String, RemoteError>;

    fn set_attribute(&self, owner: &OwnerName, name: &str, value: &str) -> Result<(), RemoteError>;

    fn invoke(
        &self,
        owner: &OwnerName,
        name: &str,
        args: &[String],
        signature: &[TypeDescriptor],
    ) -> Result<String, RemoteError>;

    /// The full catalog, read from the registry's `list` attribute.
    fn list(&self) -> Result<CommandList, RemoteError> {
        let json = self.get_attribute(&OwnerName::registry(), "list")?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Connection to a catalog in the same process.
#[derive(Clone)]
pub struct LocalConnection {
    catalog: Arc<Catalog>,
}

impl LocalConnection {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Connection for LocalConnection {
    fn get_attribute(&self, owner: &OwnerName, name: &str) -> Result<String, RemoteError> {
        self.catalog
            .get_attribute(owner.as_str(), name)
            .map_err(|err| RemoteError::Server(err.to_string()))
    }

    fn set_attribute(&self, owner: &OwnerName, name: &str, value: &str) -> Result<(), RemoteError> {
        self.catalog
            .set_attribute(owner.as_str(), name, value)
            .map_err(|err| RemoteError::Server(err.to_string()))
    }

    fn invoke(
        &self,
        owner: &OwnerName,
        name: &str,
        args: &[String],
        signature: &[TypeDescriptor],
    ) -> Result<String, RemoteError> {
        self.catalog
            .invoke(owner.as_str(), name, args, Some(signature))
            .map_err(|err| RemoteError::Server(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_connection_lists_the_catalog() {
        let catalog = Catalog::new();
        let connection = LocalConnection::new(Arc::clone(&catalog));
        assert_eq!(connection.list().unwrap(), catalog.list());

        let err = connection
            .get_attribute(&OwnerName::from("missing:type=X"), "value")
            .unwrap_err();
        assert!(matches!(err, RemoteError::Server(_)));
    }
}
