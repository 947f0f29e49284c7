//! Generic invocation contract over a registered bean.
//!
//! A [`Bridge`] holds only a weak reference to its bean; the application owns
//! the bean's lifetime. All inputs and outputs are wire strings, decoded and
//! encoded with the descriptors captured at registration.

use crate::bean::Managed;
use crate::bean::extract::{BeanDescriptors, OperationDescriptor, extract};
use crate::bean::spec::{Args, Handler};
use crate::catalog::identity::OwnerName;
use crate::catalog::model::Command;
use crate::error::{InvokeError, RegistrationError};
use crate::wire::{TypeDescriptor, decode, encode};
use std::sync::{Arc, Weak};

/// Type-erased view of a registered bean.
pub trait DynamicBean: Send + Sync {
    fn owner(&self) -> &OwnerName;

    fn description(&self) -> &str;

    fn commands(&self) -> Vec<Command>;

    fn get_attribute(&self, name: &str) -> Result<String, InvokeError>;

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), InvokeError>;

    /// Invoke an operation. `signature` picks between overloads with equal
    /// arity; without it the arity alone must identify one operation.
    fn invoke(
        &self,
        name: &str,
        args: &[String],
        signature: Option<&[TypeDescriptor]>,
    ) -> Result<String, InvokeError>;
}

pub struct Bridge<T> {
    owner: OwnerName,
    object: Weak<T>,
    descriptors: BeanDescriptors<T>,
}

impl<T: Managed> Bridge<T> {
    pub fn new(object: &Arc<T>, owner: OwnerName) -> Result<Self, RegistrationError> {
        let descriptors = extract(&owner, object.description(), object.methods())?;
        Ok(Self {
            owner,
            object: Arc::downgrade(object),
            descriptors,
        })
    }

    fn call(&self, handler: &Handler<T>, args: &Args) -> Result<String, InvokeError> {
        let object = self
            .object
            .upgrade()
            .ok_or_else(|| InvokeError::BeanDropped(self.owner.to_string()))?;
        let value = handler(&*object, args).map_err(|err| InvokeError::Failed(format!("{err:#}")))?;
        Ok(encode(&value))
    }

    fn select(
        &self,
        name: &str,
        arity: usize,
        signature: Option<&[TypeDescriptor]>,
    ) -> Result<&OperationDescriptor<T>, InvokeError> {
        let mut matching = self
            .descriptors
            .operations
            .iter()
            .filter(|op| op.name == name && op.args.len() == arity)
            .filter(|op| signature.is_none_or(|sig| op.signature() == sig));

        let first = matching.next().ok_or_else(|| InvokeError::UnknownOperation {
            name: name.to_string(),
            arity,
        })?;
        if matching.next().is_some() {
            return Err(InvokeError::AmbiguousOperation {
                name: name.to_string(),
                arity,
            });
        }
        Ok(first)
    }
}

impl<T: Managed> DynamicBean for Bridge<T> {
    fn owner(&self) -> &OwnerName {
        &self.owner
    }

    fn description(&self) -> &str {
        &self.descriptors.description
    }

    fn commands(&self) -> Vec<Command> {
        self.descriptors.commands(&self.owner)
    }

    fn get_attribute(&self, name: &str) -> Result<String, InvokeError> {
        let attr = self
            .descriptors
            .attribute(name)
            .ok_or_else(|| InvokeError::UnknownAttribute(name.to_string()))?;
        let getter = attr
            .getter
            .as_ref()
            .ok_or_else(|| InvokeError::NotReadable(name.to_string()))?;
        self.call(getter, &Args::default())
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), InvokeError> {
        let attr = self
            .descriptors
            .attribute(name)
            .ok_or_else(|| InvokeError::UnknownAttribute(name.to_string()))?;
        let setter = attr
            .setter
            .as_ref()
            .ok_or_else(|| InvokeError::NotWritable(name.to_string()))?;
        let decoded = decode(&attr.ty, value)?;
        self.call(setter, &Args::new(vec![decoded]))?;
        Ok(())
    }

    fn invoke(
        &self,
        name: &str,
        args: &[String],
        signature: Option<&[TypeDescriptor]>,
    ) -> Result<String, InvokeError> {
        let op = self.select(name, args.len(), signature)?;
        let decoded = op
            .args
            .iter()
            .zip(args)
            .map(|(arg, text)| decode(&arg.ty, text))
            .collect::<Result<Vec<_>, _>>()?;
        self.call(&op.handler, &Args::new(decoded))
    }
}
