// MIT License - Copyright (c) 2026 Peter Wright
// Transport layer

pub mod direct;
pub mod session;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Endpoint;

/// Opens byte streams to relays and IP receivers.
///
/// The engine only needs an ordered, reliable byte stream. Production uses
/// [`direct::TcpConnector`]; tests plug in in-memory pipes.
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a stream to `endpoint`. Timeouts are applied by the caller.
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}
