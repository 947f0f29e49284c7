//! Descriptor tables a bean hands to the registry.
//!
//! Instead of discovering methods at runtime, a bean lists them explicitly as
//! [`MethodSpec`] values: name, description, parameter metadata, return type
//! and a bound handler. The extractor then classifies each entry as getter,
//! setter or operation by name and shape.

use crate::error::ConversionError;
use crate::wire::{TypeDescriptor, Wire, WireValue};
use std::fmt;
use std::sync::Arc;

/// Bound call into the bean. Receives already-decoded arguments.
pub type Handler<T> = Arc<dyn Fn(&T, &Args) -> anyhow::Result<WireValue> + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamMeta {
    pub name: String,
    pub description: String,
}

/// One declared parameter. Operations require `meta`; accessors may omit it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamSpec {
    pub ty: TypeDescriptor,
    pub meta: Option<ParamMeta>,
}

/// A method a bean exposes, before classification.
pub struct MethodSpec<T> {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub returns: TypeDescriptor,
    pub handler: Handler<T>,
}

impl<T> Clone for MethodSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            params: self.params.clone(),
            returns: self.returns,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for MethodSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> MethodSpec<T> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> MethodBuilder<T> {
        MethodBuilder {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            _bean: std::marker::PhantomData,
        }
    }

    /// `get*`/`is*` accessor returning `R`.
    pub fn getter<R, F>(name: impl Into<String>, description: impl Into<String>, read: F) -> Self
    where
        R: Wire,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self::new(name, description).handler(move |bean, _| Ok(read(bean)))
    }

    /// `set*` accessor taking `V`.
    pub fn setter<V, F>(name: impl Into<String>, description: impl Into<String>, write: F) -> Self
    where
        V: Wire,
        F: Fn(&T, V) + Send + Sync + 'static,
    {
        Self::new(name, description)
            .bare_param::<V>()
            .handler(move |bean, args| {
                write(bean, args.get::<V>(0)?);
                Ok(())
            })
    }
}

/// Builder returned by [`MethodSpec::new`]; finished by [`MethodBuilder::handler`].
pub struct MethodBuilder<T> {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    _bean: std::marker::PhantomData<fn(&T)>,
}

impl<T: 'static> MethodBuilder<T> {
    /// Declare a described parameter.
    pub fn param<P: Wire>(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            ty: P::descriptor(),
            meta: Some(ParamMeta {
                name: name.into(),
                description: description.into(),
            }),
        });
        self
    }

    /// Declare a parameter with no metadata. Only valid on setters.
    pub fn bare_param<P: Wire>(mut self) -> Self {
        self.params.push(ParamSpec {
            ty: P::descriptor(),
            meta: None,
        });
        self
    }

    /// Bind the implementation. The return type is taken from `R`.
    pub fn handler<R, F>(self, call: F) -> MethodSpec<T>
    where
        R: Wire,
        F: Fn(&T, &Args) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        MethodSpec {
            name: self.name,
            description: self.description,
            params: self.params,
            returns: R::descriptor(),
            handler: Arc::new(move |bean, args| call(bean, args).map(Wire::into_wire)),
        }
    }
}

/// Decoded arguments passed to a handler.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: Vec<WireValue>,
}

impl Args {
    pub fn new(values: Vec<WireValue>) -> Self {
        Self { values }
    }

    /// Typed positional access.
    pub fn get<T: Wire>(&self, index: usize) -> Result<T, ConversionError> {
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or(ConversionError::MissingArgument(index))?;
        T::from_wire(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
