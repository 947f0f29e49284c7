//! Managed beans.
//!
//! A bean is any application object that implements [`Managed`]: it describes
//! itself and hands the registry a table of methods. `extract` classifies that
//! table into attributes and operations; `bridge` serves wire-level requests
//! against it.

pub mod bridge;
pub mod extract;
pub mod spec;

pub use bridge::{Bridge, DynamicBean};
pub use extract::{AttributeDescriptor, BeanDescriptors, MethodKind, OperationDescriptor};
pub use spec::{Args, Handler, MethodBuilder, MethodSpec, ParamMeta, ParamSpec};

use crate::catalog::identity::OwnerName;

/// An object whose attributes and operations can be exposed remotely.
pub trait Managed: Send + Sync + Sized + 'static {
    /// Human-readable description of the bean.
    fn description(&self) -> &str;

    /// Exposed methods. Getters are `get*`/`is*` with no parameters, setters
    /// are `set*` with one parameter and no return value, anything else is an
    /// operation and must describe every parameter.
    fn methods(&self) -> Vec<MethodSpec<Self>>;

    /// Namespace the bean's commands are published under.
    fn namespace(&self) -> OwnerName {
        OwnerName::of::<Self>()
    }
}
