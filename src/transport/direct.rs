// MIT License - Copyright (c) 2026 Peter Wright
// Plain TCP connector

use std::future::Future;
use std::io;

use tokio::net::TcpStream;
use tracing::{debug, error, info};

use crate::config::Endpoint;
use crate::transport::Connector;

/// Direct TCP connector to the relay or IP receiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = io::Result<TcpStream>> + Send {
        let addr = endpoint.to_string();
        async move {
            info!("Connecting to {}", addr);
            let stream = TcpStream::connect(&addr).await.map_err(|e| {
                error!("TCP connect to {} failed: {}", addr, e);
                e
            })?;
            // Frames are small and strictly request/response
            stream.set_nodelay(true)?;
            debug!("TCP socket connected to {}", addr);
            Ok(stream)
        }
    }
}
