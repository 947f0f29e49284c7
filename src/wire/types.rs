//! Closed set of wire-transmissible types.
//!
//! Every attribute, argument and return value in the catalog is described by a
//! [`TypeDescriptor`]: one of the base tags below plus an array flag. The
//! descriptor travels with each command so clients can convert plain strings
//! before any remote call is made.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Base type tag. `Object` is the catch-all for values with no scalar mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BaseType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Object,
    Void,
}

impl BaseType {
    pub const ALL: [BaseType; 10] = [
        BaseType::Boolean,
        BaseType::Byte,
        BaseType::Short,
        BaseType::Integer,
        BaseType::Long,
        BaseType::Float,
        BaseType::Double,
        BaseType::String,
        BaseType::Object,
        BaseType::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Boolean => "Boolean",
            BaseType::Byte => "Byte",
            BaseType::Short => "Short",
            BaseType::Integer => "Integer",
            BaseType::Long => "Long",
            BaseType::Float => "Float",
            BaseType::Double => "Double",
            BaseType::String => "String",
            BaseType::Object => "Object",
            BaseType::Void => "Void",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|base| base.as_str().eq_ignore_ascii_case(value))
    }
}

/// Base type plus array flag. Equality is structural.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TypeDescriptor {
    pub base: BaseType,
    pub is_array: bool,
}

impl TypeDescriptor {
    pub const VOID: TypeDescriptor = TypeDescriptor::scalar(BaseType::Void);
    pub const OBJECT: TypeDescriptor = TypeDescriptor::scalar(BaseType::Object);

    pub const fn scalar(base: BaseType) -> Self {
        Self {
            base,
            is_array: false,
        }
    }

    pub const fn array(base: BaseType) -> Self {
        Self {
            base,
            is_array: true,
        }
    }

    /// Descriptor for a native Rust type.
    ///
    /// Types without a scalar mapping are exposed through
    /// [`Opaque`](crate::wire::Opaque) and report `Object`.
    pub fn of<T: crate::wire::Wire>() -> Self {
        T::descriptor()
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseType::Void && !self.is_array
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl FromStr for TypeDescriptor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (name, is_array) = match trimmed.strip_suffix("[]") {
            Some(name) => (name, true),
            None => (trimmed, false),
        };
        let base = BaseType::from_str(name).ok_or_else(|| format!("unknown type {value:?}"))?;
        Ok(Self { base, is_array })
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
