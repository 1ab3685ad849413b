//! Network infrastructure — implements `PortProbe` and `NetworkProbe`.

use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{NetworkProbe, PortProbe};

/// Production probe backed by real sockets.
pub struct SocketProbe;

impl PortProbe for SocketProbe {
    /// A port counts as bound when a wildcard listener cannot be opened on it.
    fn is_bound(&self, port: u16) -> bool {
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).is_err()
    }
}

impl NetworkProbe for SocketProbe {
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool> {
        let addr = format!("{host}:{port}");
        let result = tokio::task::spawn_blocking(move || {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid address {addr}: {e}"))?;
            Ok::<bool, anyhow::Error>(
                TcpStream::connect_timeout(&addr, Duration::from_secs(3)).is_ok(),
            )
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))??;
        Ok(result)
    }
}
