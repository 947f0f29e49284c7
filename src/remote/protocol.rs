//! Request and response messages.
//!
//! Each message is one JSON object on its own line. Requests are tagged by
//! `op`, responses by `status`.

use crate::catalog::Catalog;
use crate::error::{InvokeError, RemoteError};
use crate::wire::TypeDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    GetAttribute {
        owner: String,
        name: String,
    },
    SetAttribute {
        owner: String,
        name: String,
        value: String,
    },
    Invoke {
        owner: String,
        name: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<Vec<TypeDescriptor>>,
    },
}

impl Request {
    /// Serve the request against a local catalog.
    pub fn dispatch(&self, catalog: &Catalog) -> Response {
        let result = match self {
            Request::GetAttribute { owner, name } => catalog.get_attribute(owner, name).map(Some),
            Request::SetAttribute { owner, name, value } => {
                catalog.set_attribute(owner, name, value).map(|()| None)
            }
            Request::Invoke {
                owner,
                name,
                args,
                signature,
            } => catalog
                .invoke(owner, name, args, signature.as_deref())
                .map(Some),
        };
        Response::from(result)
    }

    pub fn owner(&self) -> &str {
        match self {
            Request::GetAttribute { owner, .. }
            | Request::SetAttribute { owner, .. }
            | Request::Invoke { owner, .. } => owner,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Request::GetAttribute { name, .. }
            | Request::SetAttribute { name, .. }
            | Request::Invoke { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok {
        #[serde(default)]
        value: Option<String>,
    },
    Err {
        message: String,
    },
}

impl Response {
    pub fn into_value(self) -> Result<Option<String>, RemoteError> {
        match self {
            Response::Ok { value } => Ok(value),
            Response::Err { message } => Err(RemoteError::Server(message)),
        }
    }
}

impl From<Result<Option<String>, InvokeError>> for Response {
    fn from(result: Result<Option<String>, InvokeError>) -> Self {
        match result {
            Ok(value) => Response::Ok { value },
            Err(err) => Response::Err {
                message: err.to_string(),
            },
        }
    }
}
