//! The per-process command catalog.
//!
//! One [`Catalog`] is created per process and passed to whoever registers
//! beans. It owns the bridges (keyed by owner name), the namespace handles and
//! the flat command list that clients download. The catalog registers itself
//! under [`REGISTRY_NAME`] so its `list` attribute is always command zero.
//!
//! Lock order is bridges, then namespaces, then commands.

use crate::bean::spec::MethodSpec;
use crate::bean::{Bridge, DynamicBean, Managed};
use crate::catalog::identity::{OwnerName, REGISTRY_NAME};
use crate::catalog::model::{ArgumentDescriptor, Command, CommandList};
use crate::error::{InvokeError, RegistrationError};
use crate::wire::{Opaque, TypeDescriptor};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type SharedCommands = Arc<RwLock<Vec<Command>>>;

/// Registry of every exposed attribute and operation in the process.
pub struct Catalog {
    bridges: RwLock<HashMap<OwnerName, Arc<dyn DynamicBean>>>,
    namespaces: RwLock<HashMap<OwnerName, Arc<NamespaceHandle>>>,
    commands: SharedCommands,
}

impl Catalog {
    /// Create a catalog with its own `list` attribute already published.
    pub fn new() -> Arc<Self> {
        let catalog = Arc::new(Self {
            bridges: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(HashMap::new()),
            commands: Arc::new(RwLock::new(Vec::new())),
        });
        if let Err(err) = catalog.register(&catalog) {
            tracing::error!("Failed to register {}: {}", REGISTRY_NAME, err);
        }
        catalog
    }

    /// Register a bean under its namespace.
    ///
    /// Registering a name that is already present is a logged no-op. The
    /// bridge and its commands become visible together; an extraction error
    /// leaves the catalog untouched.
    pub fn register<T: Managed>(&self, object: &Arc<T>) -> Result<OwnerName, RegistrationError> {
        let owner = object.namespace();
        if owner.as_str().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let bridge = Bridge::new(object, owner.clone())?;
        let commands = bridge.commands();

        let mut bridges = self.bridges.write();
        if bridges.contains_key(&owner) {
            tracing::warn!("{} is already registered; ignoring", owner);
            return Ok(owner);
        }
        bridges.insert(owner.clone(), Arc::new(bridge));
        let count = commands.len();
        self.register_namespace(owner.clone()).publish(commands);
        drop(bridges);

        tracing::info!("Registered {} with {} command(s)", owner, count);
        Ok(owner)
    }

    /// Get or create the handle for `owner`. Concurrent callers receive the
    /// same handle.
    pub fn register_namespace(&self, owner: impl Into<OwnerName>) -> Arc<NamespaceHandle> {
        let owner = owner.into();
        if let Some(handle) = self.namespaces.read().get(&owner) {
            return Arc::clone(handle);
        }
        let mut namespaces = self.namespaces.write();
        let handle = namespaces.entry(owner.clone()).or_insert_with(|| {
            Arc::new(NamespaceHandle {
                owner,
                commands: Arc::clone(&self.commands),
                live: AtomicBool::new(true),
            })
        });
        Arc::clone(handle)
    }

    /// Remove a bean, its namespace and its commands. Returns whether anything
    /// was registered under `name`.
    pub fn deregister(&self, name: &str) -> Result<bool, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if name == REGISTRY_NAME {
            return Err(RegistrationError::ReservedName(name.to_string()));
        }

        let mut bridges = self.bridges.write();
        let removed_bridge = bridges.remove(name).is_some();
        let handle = self.namespaces.write().remove(name);
        let removed_namespace = handle.is_some();
        let mut commands = self.commands.write();
        // Retired under the commands lock so no append can slip in after the purge.
        if let Some(handle) = &handle {
            handle.live.store(false, Ordering::SeqCst);
        }
        let before = commands.len();
        commands.retain(|command| command.owner.as_str() != name);
        let removed_commands = before - commands.len();
        drop(commands);
        drop(bridges);

        let removed = removed_bridge || removed_namespace || removed_commands > 0;
        if removed {
            tracing::info!("Deregistered {} ({} command(s))", name, removed_commands);
        }
        Ok(removed)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.bridges.read().contains_key(name)
    }

    /// Consistent snapshot of every published command, in publication order.
    pub fn list(&self) -> CommandList {
        CommandList::new(self.commands.read().clone())
    }

    pub fn bridge(&self, owner: &str) -> Option<Arc<dyn DynamicBean>> {
        self.bridges.read().get(owner).cloned()
    }

    pub fn get_attribute(&self, owner: &str, name: &str) -> Result<String, InvokeError> {
        self.require(owner)?.get_attribute(name)
    }

    pub fn set_attribute(&self, owner: &str, name: &str, value: &str) -> Result<(), InvokeError> {
        self.require(owner)?.set_attribute(name, value)
    }

    pub fn invoke(
        &self,
        owner: &str,
        name: &str,
        args: &[String],
        signature: Option<&[TypeDescriptor]>,
    ) -> Result<String, InvokeError> {
        self.require(owner)?.invoke(name, args, signature)
    }

    // The bridge is cloned out so no lock is held while the bean runs.
    fn require(&self, owner: &str) -> Result<Arc<dyn DynamicBean>, InvokeError> {
        self.bridge(owner)
            .ok_or_else(|| InvokeError::UnknownOwner(owner.to_string()))
    }
}

impl Managed for Catalog {
    fn description(&self) -> &str {
        "Registry of all commands"
    }

    fn methods(&self) -> Vec<MethodSpec<Self>> {
        vec![
            MethodSpec::new("getList", "List all commands")
                .handler(|catalog: &Catalog, _| Ok(Opaque::json(&catalog.list())?)),
        ]
    }

    fn namespace(&self) -> OwnerName {
        OwnerName::registry()
    }
}

/// Write access to one namespace's slice of the command list.
///
/// A handle is retired when its namespace is deregistered; appends through a
/// retired handle are dropped and return `false`.
#[derive(Debug)]
pub struct NamespaceHandle {
    owner: OwnerName,
    commands: SharedCommands,
    live: AtomicBool,
}

impl NamespaceHandle {
    pub fn owner(&self) -> &OwnerName {
        &self.owner
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn add_operation(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        args: Vec<ArgumentDescriptor>,
        returns: TypeDescriptor,
    ) -> bool {
        let command = Command::operation(self.owner.clone(), name, description, returns, args);
        self.publish(vec![command])
    }

    pub fn add_attribute(
        &self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        description: impl Into<String>,
        readable: bool,
        writable: bool,
    ) -> bool {
        let command =
            Command::attribute(self.owner.clone(), name, description, ty, readable, writable);
        self.publish(vec![command])
    }

    /// Append a batch of commands in one step.
    pub fn publish(&self, batch: Vec<Command>) -> bool {
        let mut commands = self.commands.write();
        if !self.is_live() {
            tracing::warn!(
                "{} is no longer registered; dropping {} command(s)",
                self.owner,
                batch.len()
            );
            return false;
        }
        commands.extend(batch);
        true
    }
}
