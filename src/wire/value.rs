//! Native values and their textual wire form.
//!
//! Everything that crosses the management boundary is a string. [`decode`]
//! turns a string into a [`WireValue`] according to a [`TypeDescriptor`],
//! [`encode`] does the reverse, and [`render`] produces the operator-facing
//! form (strings quoted). The [`Wire`] trait maps concrete Rust types onto
//! this model so bean handlers stay strongly typed.

use crate::error::ConversionError;
use crate::wire::{BaseType, TypeDescriptor};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Dynamically typed native value.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Object(String),
    Void,
    Array(Vec<WireValue>),
}

impl WireValue {
    /// Short name of the variant, used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Bool(_) => "Boolean",
            WireValue::Byte(_) => "Byte",
            WireValue::Short(_) => "Short",
            WireValue::Int(_) => "Integer",
            WireValue::Long(_) => "Long",
            WireValue::Float(_) => "Float",
            WireValue::Double(_) => "Double",
            WireValue::Str(_) => "String",
            WireValue::Object(_) => "Object",
            WireValue::Void => "Void",
            WireValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Parse a wire string as an argument or attribute value of type `ty`.
///
/// `Object` has no textual form, so typed arguments of that kind fail here
/// rather than at registration time.
pub fn decode(ty: &TypeDescriptor, input: &str) -> Result<WireValue, ConversionError> {
    if !ty.is_array {
        return decode_scalar(ty, input);
    }

    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| ConversionError::MissingBrackets {
            ty: *ty,
            input: input.to_string(),
        })?;
    if inner.trim().is_empty() {
        return Ok(WireValue::Array(Vec::new()));
    }

    inner
        .split(',')
        .map(|element| decode_scalar(ty, element.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map(WireValue::Array)
}

/// Parse a value returned by a remote call.
///
/// Unlike [`decode`], `Object` results are accepted verbatim: they can be
/// displayed even though they cannot be sent back as arguments.
pub fn decode_result(ty: &TypeDescriptor, input: &str) -> Result<WireValue, ConversionError> {
    match ty.base {
        BaseType::Object => Ok(WireValue::Object(input.to_string())),
        BaseType::Void if !ty.is_array => Ok(WireValue::Void),
        _ => decode(ty, input),
    }
}

/// Canonical wire form. Arrays are `[e1,e2,...]`; void is empty.
pub fn encode(value: &WireValue) -> String {
    match value {
        WireValue::Bool(v) => v.to_string(),
        WireValue::Byte(v) => v.to_string(),
        WireValue::Short(v) => v.to_string(),
        WireValue::Int(v) => v.to_string(),
        WireValue::Long(v) => v.to_string(),
        WireValue::Float(v) => v.to_string(),
        WireValue::Double(v) => v.to_string(),
        WireValue::Str(v) | WireValue::Object(v) => v.clone(),
        WireValue::Void => String::new(),
        WireValue::Array(items) => bracketed(items, encode),
    }
}

/// Operator-facing form: like [`encode`] but strings are double-quoted.
pub fn render(value: &WireValue) -> String {
    match value {
        WireValue::Str(v) => format!("\"{v}\""),
        WireValue::Array(items) => bracketed(items, render),
        other => encode(other),
    }
}

fn bracketed(items: &[WireValue], each: fn(&WireValue) -> String) -> String {
    let inner = items.iter().map(each).collect::<Vec<_>>().join(",");
    format!("[{inner}]")
}

fn decode_scalar(ty: &TypeDescriptor, input: &str) -> Result<WireValue, ConversionError> {
    match ty.base {
        BaseType::Boolean => parse_bool(ty, input).map(WireValue::Bool),
        BaseType::Byte => parse_number(ty, input).map(WireValue::Byte),
        BaseType::Short => parse_number(ty, input).map(WireValue::Short),
        BaseType::Integer => parse_number(ty, input).map(WireValue::Int),
        BaseType::Long => parse_number(ty, input).map(WireValue::Long),
        BaseType::Float => parse_number(ty, input).map(WireValue::Float),
        BaseType::Double => parse_number(ty, input).map(WireValue::Double),
        BaseType::String => Ok(WireValue::Str(input.to_string())),
        BaseType::Void => Ok(WireValue::Void),
        BaseType::Object => Err(ConversionError::Unsupported(*ty)),
    }
}

fn parse_bool(ty: &TypeDescriptor, input: &str) -> Result<bool, ConversionError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConversionError::Parse {
            ty: *ty,
            input: input.to_string(),
            reason: "expected true or false".to_string(),
        })
    }
}

fn parse_number<N>(ty: &TypeDescriptor, input: &str) -> Result<N, ConversionError>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    input
        .trim()
        .parse::<N>()
        .map_err(|err| ConversionError::Parse {
            ty: *ty,
            input: input.to_string(),
            reason: err.to_string(),
        })
}

/// Rust types that can cross the management boundary.
pub trait Wire: Sized {
    fn descriptor() -> TypeDescriptor;
    fn into_wire(self) -> WireValue;
    fn from_wire(value: WireValue) -> Result<Self, ConversionError>;
}

/// Marker for types allowed as array elements.
pub trait Element: Wire {}

fn mismatch<T: Wire>(found: &WireValue) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: T::descriptor(),
        found: found.kind().to_string(),
    }
}

macro_rules! scalar_wire {
    ($native:ty, $base:ident, $variant:ident) => {
        impl Wire for $native {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::scalar(BaseType::$base)
            }

            fn into_wire(self) -> WireValue {
                WireValue::$variant(self)
            }

            fn from_wire(value: WireValue) -> Result<Self, ConversionError> {
                match value {
                    WireValue::$variant(v) => Ok(v),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }

        impl Element for $native {}
    };
}

scalar_wire!(bool, Boolean, Bool);
scalar_wire!(i8, Byte, Byte);
scalar_wire!(i16, Short, Short);
scalar_wire!(i32, Integer, Int);
scalar_wire!(i64, Long, Long);
scalar_wire!(f32, Float, Float);
scalar_wire!(f64, Double, Double);
scalar_wire!(String, String, Str);

impl Wire for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::VOID
    }

    fn into_wire(self) -> WireValue {
        WireValue::Void
    }

    fn from_wire(value: WireValue) -> Result<Self, ConversionError> {
        match value {
            WireValue::Void => Ok(()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Element> Wire for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor().base)
    }

    fn into_wire(self) -> WireValue {
        WireValue::Array(self.into_iter().map(Wire::into_wire).collect())
    }

    fn from_wire(value: WireValue) -> Result<Self, ConversionError> {
        match value {
            WireValue::Array(items) => items.into_iter().map(T::from_wire).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// Value with no scalar mapping, carried as its textual form.
///
/// Reported as `Object`: readable remotely, but never accepted as a typed
/// argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opaque(pub String);

impl Opaque {
    pub fn new(value: impl fmt::Display) -> Self {
        Self(value.to_string())
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self)
    }
}

impl Wire for Opaque {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::OBJECT
    }

    fn into_wire(self) -> WireValue {
        WireValue::Object(self.0)
    }

    fn from_wire(value: WireValue) -> Result<Self, ConversionError> {
        match value {
            WireValue::Object(text) => Ok(Self(text)),
            _ => Err(ConversionError::Unsupported(TypeDescriptor::OBJECT)),
        }
    }
}
