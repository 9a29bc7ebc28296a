//! Minimal client: one connection, one request, one response.

use std::net::SocketAddr;
use tokio::net::TcpStream;

use crate::protocol::{FrameError, FramedStream, Request, Response};

/// Talks to an auth server at a fixed address.
#[derive(Debug, Clone, Copy)]
pub struct AuthClient {
    addr: SocketAddr,
}

impl AuthClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Open a connection, send `request` and wait for its response.
    pub async fn send(&self, request: &Request) -> Result<Response, FrameError> {
        let stream = TcpStream::connect(self.addr).await?;
        let mut channel = FramedStream::new(stream);
        channel.send(request).await?;
        let response: Response = channel.recv().await?;
        tracing::debug!(addr = %self.addr, tag = response.tag(), "Response received");
        Ok(response)
    }
}
