//! Error taxonomy shared by the registry, the bridges and the client.
//!
//! Each layer gets its own enum so callers can tell a registration problem
//! (fatal to one bean) from a conversion problem (the remote call is never
//! issued) from a transport failure (always wrapped as an unexpected remote
//! error).

use crate::wire::TypeDescriptor;
use std::io;
use thiserror::Error;

/// A wire string could not be turned into a native value (or vice versa).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("cannot parse {input:?} as {ty}: {reason}")]
    Parse {
        ty: TypeDescriptor,
        input: String,
        reason: String,
    },

    #[error("{ty} value must be written as [e1,e2,...], got {input:?}")]
    MissingBrackets { ty: TypeDescriptor, input: String },

    #[error("{0} values cannot be converted from text")]
    Unsupported(TypeDescriptor),

    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: TypeDescriptor,
        found: String,
    },

    #[error("argument {0} was not supplied")]
    MissingArgument(usize),
}

/// Registration of a single bean failed; the rest of the catalog is untouched.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(
        "operation {method} on {owner}: parameter {index} needs a name and description; only getters and setters may omit them"
    )]
    MissingParamMetadata {
        owner: String,
        method: String,
        index: usize,
    },

    #[error(
        "attribute {attribute} on {owner}: getter returns {getter} but setter takes {setter}"
    )]
    AttributeTypeMismatch {
        owner: String,
        attribute: String,
        getter: TypeDescriptor,
        setter: TypeDescriptor,
    },

    #[error("no name specified")]
    EmptyName,

    #[error("{0} is reserved for the command registry")]
    ReservedName(String),
}

/// Server-side failure while serving an attribute read/write or an invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("no bean registered under {0}")]
    UnknownOwner(String),

    #[error("unknown attribute {0}")]
    UnknownAttribute(String),

    #[error("attribute {0} is not readable")]
    NotReadable(String),

    #[error("attribute {0} is not writable")]
    NotWritable(String),

    #[error("unknown operation {name} taking {arity} argument(s)")]
    UnknownOperation { name: String, arity: usize },

    #[error("operation {name} is overloaded for {arity} argument(s); a signature is required")]
    AmbiguousOperation { name: String, arity: usize },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("bean behind {0} is no longer alive")]
    BeanDropped(String),

    #[error("{0}")]
    Failed(String),
}

/// Anything that went wrong on the way to or inside the remote process.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("unable to connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o failure talking to the management endpoint")]
    Io(#[from] io::Error),

    #[error("malformed management message")]
    Protocol(#[from] serde_json::Error),

    #[error("management endpoint closed the connection")]
    Closed,

    #[error("{0}")]
    Server(String),
}

/// Client-side failures that abort a command.
///
/// Reported-but-harmless conditions (unknown command, read-only attribute,
/// bad selection) are not errors; see [`crate::client::Outcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("{command} takes {expected} argument(s), got {supplied}")]
    ArgumentCount {
        command: String,
        expected: usize,
        supplied: usize,
    },

    #[error("unexpected remote error")]
    Remote(#[from] RemoteError),
}
