use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Reserved owner under which the catalog publishes itself.
pub const REGISTRY_NAME: &str = "mgmtplane:type=Registry";

/// Namespace a bean's commands are grouped under (e.g.
/// `myapp::pricing:type=QuoteCache`).
///
/// Derived from the bean's module path and simple type name unless the bean
/// supplies its own.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerName(pub String);

impl OwnerName {
    /// Owner name for a Rust type: `<module path>:type=<SimpleName>`.
    pub fn of<T: ?Sized>() -> Self {
        Self::from_type_name(std::any::type_name::<T>())
    }

    pub fn from_type_name(type_name: &str) -> Self {
        // Generic parameters carry their own paths; only the outer type counts.
        let outer = type_name.split('<').next().unwrap_or(type_name);
        match outer.rsplit_once("::") {
            Some((module, simple)) => Self(format!("{module}:type={simple}")),
            None => Self(format!("default:type={outer}")),
        }
    }

    pub fn registry() -> Self {
        Self(REGISTRY_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form shown to operators: everything after the first `=`.
    pub fn display_name(&self) -> &str {
        match self.0.split_once('=') {
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }

    pub fn is_registry(&self) -> bool {
        self.0 == REGISTRY_NAME
    }
}

impl fmt::Display for OwnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OwnerName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for OwnerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
