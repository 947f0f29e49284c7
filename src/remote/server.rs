//! Serves a catalog over TCP.
//!
//! One thread accepts connections and each connection gets its own thread.
//! Requests on a connection are answered in order.

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::endpoint::EndpointFile;
use crate::remote::protocol::{Request, Response};
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest request line accepted, newline excluded.
pub const MAX_REQUEST_BYTES: usize = 1 << 20;

pub struct ManagementServer {
    local_addr: SocketAddr,
    stopping: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    endpoint: Option<EndpointFile>,
}

impl ManagementServer {
    /// Bind, publish the endpoint file (when a process name is configured) and
    /// start accepting connections.
    pub fn start(config: &ServerConfig, catalog: Arc<Catalog>) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind)
            .with_context(|| format!("binding management server to {}", config.bind))?;
        let local_addr = listener
            .local_addr()
            .context("reading management server address")?;

        let stopping = Arc::new(AtomicBool::new(false));
        let idle_timeout = config.idle_timeout;
        let acceptor = {
            let stopping = Arc::clone(&stopping);
            thread::Builder::new()
                .name("mgmt-accept".into())
                .spawn(move || accept_loop(listener, catalog, stopping, idle_timeout))
                .context("spawning management accept thread")?
        };

        let endpoint = config.process_name.as_deref().and_then(|name| {
            EndpointFile::publish(&config.endpoint_dir, name, &local_addr.to_string())
        });
        tracing::info!("Management server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            stopping,
            acceptor: Some(acceptor),
            endpoint,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn endpoint(&self) -> Option<&EndpointFile> {
        self.endpoint.as_ref()
    }

    /// Stop accepting, remove the endpoint file and wait for the acceptor.
    /// Connections already open finish on their own threads.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(acceptor) = self.acceptor.take() else {
            return;
        };
        self.stopping.store(true, Ordering::SeqCst);
        // Wake the blocking accept.
        let _ = TcpStream::connect(self.local_addr);
        if acceptor.join().is_err() {
            tracing::warn!("Management accept thread panicked");
        }
        self.endpoint = None;
        tracing::info!("Management server on {} stopped", self.local_addr);
    }
}

impl Drop for ManagementServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    catalog: Arc<Catalog>,
    stopping: Arc<AtomicBool>,
    idle_timeout: Duration,
) {
    for stream in listener.incoming() {
        if stopping.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                if let Err(err) = stream.set_read_timeout(Some(idle_timeout)) {
                    tracing::warn!("Failed to set idle timeout on connection: {}", err);
                    continue;
                }
                let catalog = Arc::clone(&catalog);
                let spawned = thread::Builder::new()
                    .name("mgmt-conn".into())
                    .spawn(move || serve_connection(stream, &catalog));
                if let Err(err) = spawned {
                    tracing::warn!("Failed to spawn connection thread: {}", err);
                }
            }
            Err(err) => tracing::warn!("Failed to accept management connection: {}", err),
        }
    }
}

fn serve_connection(stream: TcpStream, catalog: &Catalog) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    if let Err(err) = handle_requests(stream, catalog, &peer) {
        tracing::debug!("Connection from {} ended: {:#}", peer, err);
    }
}

fn handle_requests(stream: TcpStream, catalog: &Catalog, peer: &str) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone().context("cloning connection")?);
    let mut writer = stream;
    let mut line = Vec::new();
    loop {
        line.clear();
        let limit = (MAX_REQUEST_BYTES + 1) as u64;
        let read = (&mut reader)
            .take(limit)
            .read_until(b'\n', &mut line)
            .context("reading request")?;
        if read == 0 {
            return Ok(());
        }

        let response = if line.last() != Some(&b'\n') && line.len() > MAX_REQUEST_BYTES {
            reader
                .skip_until(b'\n')
                .context("skipping oversized request")?;
            Response::Err {
                message: format!("malformed request: longer than {MAX_REQUEST_BYTES} bytes"),
            }
        } else {
            match std::str::from_utf8(&line) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => match serde_json::from_str::<Request>(text) {
                    Ok(request) => {
                        tracing::debug!("{} -> {} {}", peer, request.owner(), request.name());
                        request.dispatch(catalog)
                    }
                    Err(err) => Response::Err {
                        message: format!("malformed request: {err}"),
                    },
                },
                Err(err) => Response::Err {
                    message: format!("malformed request: {err}"),
                },
            }
        };
        let mut reply = serde_json::to_string(&response).context("encoding response")?;
        reply.push('\n');
        writer.write_all(reply.as_bytes()).context("writing response")?;
        writer.flush().context("flushing response")?;
    }
}
