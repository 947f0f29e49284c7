//! Typed wire representation.
//!
//! `types` holds the closed descriptor set shared with the catalog; `value`
//! holds the string codec and the [`Wire`] mapping for native Rust types.

pub mod types;
pub mod value;

pub use types::{BaseType, TypeDescriptor};
pub use value::{Element, Opaque, Wire, WireValue, decode, decode_result, encode, render};
