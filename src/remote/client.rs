//! TCP side of the line protocol.

use crate::catalog::OwnerName;
use crate::error::RemoteError;
use crate::remote::Connection;
use crate::remote::protocol::{Request, Response};
use crate::wire::TypeDescriptor;
use parking_lot::Mutex;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Connect and per-round-trip read/write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

struct Channel {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

/// One persistent connection to a [`ManagementServer`](crate::remote::ManagementServer).
///
/// Any transport or framing failure drops the channel: a late reply could
/// otherwise be read as the answer to the next request. Every later call then
/// fails with [`RemoteError::Closed`].
pub struct TcpConnection {
    address: String,
    channel: Mutex<Option<Channel>>,
}

impl TcpConnection {
    pub fn connect(address: &str) -> Result<Self, RemoteError> {
        Self::connect_with_timeout(address, DEFAULT_TIMEOUT)
    }

    pub fn connect_with_timeout(address: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let stream = open(address, timeout).map_err(|source| RemoteError::Connect {
            addr: address.to_string(),
            source,
        })?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        tracing::debug!("Connected to {}", address);
        Ok(Self {
            address: address.to_string(),
            channel: Mutex::new(Some(Channel {
                reader,
                writer: stream,
            })),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one request and wait for its response.
    pub fn round_trip(&self, request: &Request) -> Result<Response, RemoteError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let mut guard = self.channel.lock();
        let Some(channel) = guard.as_mut() else {
            return Err(RemoteError::Closed);
        };
        let result = channel.exchange(&line);
        if let Err(err) = &result {
            tracing::warn!("Dropping connection to {}: {}", self.address, err);
            *guard = None;
        }
        result
    }

    /// Whether the channel is still usable.
    pub fn is_open(&self) -> bool {
        self.channel.lock().is_some()
    }
}

impl Channel {
    fn exchange(&mut self, line: &str) -> Result<Response, RemoteError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(RemoteError::Closed);
        }
        Ok(serde_json::from_str(reply.trim_end())?)
    }
}

fn open(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing")
    }))
}

impl Connection for TcpConnection {
    fn get_attribute(&self, owner: &OwnerName, name: &str) -> Result<String, RemoteError> {
        let value = self
            .round_trip(&Request::GetAttribute {
                owner: owner.to_string(),
                name: name.to_string(),
            })?
            .into_value()?;
        Ok(value.unwrap_or_default())
    }

    fn set_attribute(&self, owner: &OwnerName, name: &str, value: &str) -> Result<(), RemoteError> {
        self.round_trip(&Request::SetAttribute {
            owner: owner.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        })?
        .into_value()?;
        Ok(())
    }

    fn invoke(
        &self,
        owner: &OwnerName,
        name: &str,
        args: &[String],
        signature: &[TypeDescriptor],
    ) -> Result<String, RemoteError> {
        let value = self
            .round_trip(&Request::Invoke {
                owner: owner.to_string(),
                name: name.to_string(),
                args: args.to_vec(),
                signature: Some(signature.to_vec()),
            })?
            .into_value()?;
        Ok(value.unwrap_or_default())
    }
}
