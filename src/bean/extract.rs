//! Capability extraction: turns a bean's method table into attribute and
//! operation descriptors.
//!
//! Classification is by name and shape only:
//! - getter: no parameters, non-void return, `get`/`is` prefix
//! - setter: one parameter, void return, `set` prefix
//! - everything else is an operation, and every operation parameter must carry
//!   a name and description
//!
//! Getter and setter for the same attribute name merge into one attribute, and
//! must agree on its type.

use crate::bean::spec::{Handler, MethodSpec};
use crate::catalog::identity::OwnerName;
use crate::catalog::model::{ArgumentDescriptor, Command};
use crate::error::RegistrationError;
use crate::wire::TypeDescriptor;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    Getter,
    Setter,
    Operation,
}

/// Classify a method by name prefix, parameter count and return type.
pub fn classify(name: &str, param_count: usize, returns: &TypeDescriptor) -> MethodKind {
    if param_count == 0 && !returns.is_void() && (name.starts_with("get") || name.starts_with("is"))
    {
        MethodKind::Getter
    } else if param_count == 1 && returns.is_void() && name.starts_with("set") {
        MethodKind::Setter
    } else {
        MethodKind::Operation
    }
}

/// Attribute name for an accessor: prefix stripped, first letter lower-cased.
pub fn attribute_name(method: &str) -> String {
    let stem = if method.starts_with("is") {
        &method[2..]
    } else {
        method.get(3..).unwrap_or_default()
    };
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct AttributeDescriptor<T> {
    pub name: String,
    pub ty: TypeDescriptor,
    pub description: String,
    pub is_boolean_getter: bool,
    pub getter: Option<Handler<T>>,
    pub setter: Option<Handler<T>>,
    getter_description: Option<String>,
    setter_description: Option<String>,
    setter_ty: Option<TypeDescriptor>,
}

impl<T> AttributeDescriptor<T> {
    fn new(name: String, ty: TypeDescriptor) -> Self {
        Self {
            name,
            ty,
            description: String::new(),
            is_boolean_getter: false,
            getter: None,
            setter: None,
            getter_description: None,
            setter_description: None,
            setter_ty: None,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    fn finish(&mut self, owner: &OwnerName) -> Result<(), RegistrationError> {
        if let Some(setter) = self.setter_ty {
            if self.is_readable() && setter != self.ty {
                return Err(RegistrationError::AttributeTypeMismatch {
                    owner: owner.to_string(),
                    attribute: self.name.clone(),
                    getter: self.ty,
                    setter,
                });
            }
        }
        let prefix = match (self.is_readable(), self.is_writable()) {
            (true, true) => "Read & Write: ",
            (true, false) => "Read Only: ",
            _ => "Write Only: ",
        };
        let mut description = prefix.to_string();
        if let Some(text) = &self.getter_description {
            description.push_str(text);
            if self.setter_description.is_some() {
                description.push('\n');
            }
        }
        if let Some(text) = &self.setter_description {
            description.push_str(text);
        }
        self.description = description;
        Ok(())
    }
}

pub struct OperationDescriptor<T> {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgumentDescriptor>,
    pub returns: TypeDescriptor,
    pub handler: Handler<T>,
}

impl<T> OperationDescriptor<T> {
    pub fn signature(&self) -> Vec<TypeDescriptor> {
        self.args.iter().map(|arg| arg.ty).collect()
    }
}

/// Everything the bridge needs to serve one bean.
pub struct BeanDescriptors<T> {
    pub description: String,
    pub attributes: Vec<AttributeDescriptor<T>>,
    pub operations: Vec<OperationDescriptor<T>>,
}

impl<T> BeanDescriptors<T> {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor<T>> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Catalog entries: operations in declaration order, then attributes in
    /// order of first appearance.
    pub fn commands(&self, owner: &OwnerName) -> Vec<Command> {
        let operations = self.operations.iter().map(|op| {
            Command::operation(
                owner.clone(),
                op.name.clone(),
                op.description.clone(),
                op.returns,
                op.args.clone(),
            )
        });
        let attributes = self.attributes.iter().map(|attr| {
            Command::attribute(
                owner.clone(),
                attr.name.clone(),
                attr.description.clone(),
                attr.ty,
                attr.is_readable(),
                attr.is_writable(),
            )
        });
        operations.chain(attributes).collect()
    }
}

/// Build descriptors for one bean. Fails as a whole on the first operation
/// parameter without metadata.
pub fn extract<T>(
    owner: &OwnerName,
    description: &str,
    methods: Vec<MethodSpec<T>>,
) -> Result<BeanDescriptors<T>, RegistrationError> {
    let mut attributes: Vec<AttributeDescriptor<T>> = Vec::new();
    let mut operations = Vec::new();

    for method in methods {
        match classify(&method.name, method.params.len(), &method.returns) {
            MethodKind::Getter => {
                let name = attribute_name(&method.name);
                let attr = attribute_slot(&mut attributes, name, method.returns);
                // The getter fixes the type; a disagreeing setter is rejected in `finish`.
                attr.ty = method.returns;
                attr.is_boolean_getter = method.name.starts_with("is");
                attr.getter_description = Some(method.description);
                attr.getter = Some(method.handler);
            }
            MethodKind::Setter => {
                let name = attribute_name(&method.name);
                let attr = attribute_slot(&mut attributes, name, method.params[0].ty);
                attr.setter_ty = Some(method.params[0].ty);
                attr.setter_description = Some(method.description);
                attr.setter = Some(method.handler);
            }
            MethodKind::Operation => {
                let mut args = Vec::with_capacity(method.params.len());
                for (index, param) in method.params.iter().enumerate() {
                    let meta = param.meta.as_ref().ok_or_else(|| {
                        RegistrationError::MissingParamMetadata {
                            owner: owner.to_string(),
                            method: method.name.clone(),
                            index,
                        }
                    })?;
                    args.push(ArgumentDescriptor::new(
                        meta.name.clone(),
                        meta.description.clone(),
                        param.ty,
                    ));
                }
                operations.push(OperationDescriptor {
                    name: method.name,
                    description: method.description,
                    args,
                    returns: method.returns,
                    handler: method.handler,
                });
            }
        }
    }

    for attr in &mut attributes {
        attr.finish(owner)?;
    }

    Ok(BeanDescriptors {
        description: description.to_string(),
        attributes,
        operations,
    })
}

fn attribute_slot<T>(
    attributes: &mut Vec<AttributeDescriptor<T>>,
    name: String,
    ty: TypeDescriptor,
) -> &mut AttributeDescriptor<T> {
    let position = match attributes.iter().position(|attr| attr.name == name) {
        Some(position) => position,
        None => {
            attributes.push(AttributeDescriptor::new(name, ty));
            attributes.len() - 1
        }
    };
    &mut attributes[position]
}
