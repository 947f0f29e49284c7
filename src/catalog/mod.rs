//! Command catalog wiring.
//!
//! `model` holds the serializable command records, `identity` the owner names
//! they are grouped under, `repository` the live per-process [`Catalog`], and
//! `index` the client-side lookup built from a downloaded [`CommandList`].

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{OwnerName, REGISTRY_NAME};
pub use index::CommandIndex;
pub use model::{
    ArgumentDescriptor, Command, CommandFeature, CommandList, ReturnDescriptor, STATUS_READABLE,
    STATUS_WRITABLE,
};
pub use repository::{Catalog, NamespaceHandle};
