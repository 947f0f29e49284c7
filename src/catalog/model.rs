//! Serializable command records.
//!
//! A [`Command`] is the catalog-resident description of one attribute or one
//! operation. The whole catalog travels to clients as a [`CommandList`], and
//! clients index it by [`CommandFeature`] (name plus argument count).

use crate::catalog::identity::OwnerName;
use crate::wire::TypeDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status bit set on readable attributes.
pub const STATUS_READABLE: u8 = 0b01;
/// Status bit set on writable attributes.
pub const STATUS_WRITABLE: u8 = 0b10;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// One named, described, typed operation parameter.
pub struct ArgumentDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl ArgumentDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ty,
        }
    }
}

impl fmt::Display for ArgumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}|{}|{}>", self.name, self.ty, self.description)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ReturnDescriptor {
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// Catalog entry for one attribute or operation.
///
/// `status` is `0` for operations; attributes set [`STATUS_READABLE`] and/or
/// [`STATUS_WRITABLE`]. For attributes `returns` carries the attribute type and
/// `args` is always empty.
pub struct Command {
    pub owner: OwnerName,
    pub name: String,
    pub description: String,
    pub returns: ReturnDescriptor,
    #[serde(default)]
    pub args: Vec<ArgumentDescriptor>,
    pub status: u8,
}

impl Command {
    pub fn operation(
        owner: OwnerName,
        name: impl Into<String>,
        description: impl Into<String>,
        returns: TypeDescriptor,
        args: Vec<ArgumentDescriptor>,
    ) -> Self {
        Self {
            owner,
            name: name.into(),
            description: description.into(),
            returns: ReturnDescriptor { ty: returns },
            args,
            status: 0,
        }
    }

    pub fn attribute(
        owner: OwnerName,
        name: impl Into<String>,
        description: impl Into<String>,
        ty: TypeDescriptor,
        readable: bool,
        writable: bool,
    ) -> Self {
        let mut status = 0;
        if readable {
            status |= STATUS_READABLE;
        }
        if writable {
            status |= STATUS_WRITABLE;
        }
        Self {
            owner,
            name: name.into(),
            description: description.into(),
            returns: ReturnDescriptor { ty },
            args: Vec::new(),
            status,
        }
    }

    pub fn is_attribute(&self) -> bool {
        self.status != 0
    }

    pub fn is_readable(&self) -> bool {
        self.status & STATUS_READABLE != 0
    }

    pub fn is_writable(&self) -> bool {
        self.status & STATUS_WRITABLE != 0
    }

    /// Lookup key: name plus argument count, detached from the owner.
    pub fn feature(&self) -> CommandFeature {
        CommandFeature::new(self.name.clone(), self.args.len())
    }

    /// Argument types in order, sent along with invocations to pick overloads.
    pub fn signature(&self) -> Vec<TypeDescriptor> {
        self.args.iter().map(|arg| arg.ty).collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t", self.name)?;
        for arg in &self.args {
            write!(f, "<{}, {}> ", arg.name, arg.ty)?;
        }
        Ok(())
    }
}

/// `(name, argument count)` key shared by every command that could answer a
/// request with that shape.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CommandFeature {
    pub name: String,
    pub arg_count: usize,
}

impl CommandFeature {
    pub fn new(name: impl Into<String>, arg_count: usize) -> Self {
        Self {
            name: name.into(),
            arg_count,
        }
    }
}

/// Ordered snapshot of the catalog.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandList {
    pub commands: Vec<Command>,
}

impl CommandList {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Commands grouped by owner, owners in order of first appearance.
    pub fn by_owner(&self) -> Vec<(&OwnerName, Vec<&Command>)> {
        let mut groups: Vec<(&OwnerName, Vec<&Command>)> = Vec::new();
        for command in &self.commands {
            match groups.iter_mut().find(|(owner, _)| *owner == &command.owner) {
                Some((_, list)) => list.push(command),
                None => groups.push((&command.owner, vec![command])),
            }
        }
        groups
    }
}

impl fmt::Display for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (owner, commands) in self.by_owner() {
            writeln!(f, "{}:", owner.display_name())?;
            for command in commands {
                writeln!(f, "\tcommand: {}", command.name)?;
                let args = command
                    .args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "\t\targs: [{args}]")?;
                if !command.returns.ty.is_void() {
                    writeln!(f, "\t\treturns: {}", command.returns.ty)?;
                }
            }
        }
        Ok(())
    }
}
