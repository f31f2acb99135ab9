//! Listener setup and the go-plugin handshake line.

use crate::config::plugin::PROTOCOL_VERSION;
use crate::errors::{ProviderError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tracing::debug;

/// go-plugin core protocol version
pub const CORE_PROTOCOL_VERSION: u32 = 1;

/// Bind a loopback listener, inside `port_range` when one is given.
pub async fn bind_listener(port_range: Option<(u16, u16)>) -> Result<TcpListener> {
    let Some((min, max)) = port_range else {
        return Ok(TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?);
    };

    for port in min..=max {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port, error = %e, "Port unavailable"),
        }
    }

    Err(ProviderError::transport(format!(
        "Couldn't bind plugin TCP listener in range {}-{}",
        min, max
    )))
}

/// The line Terraform reads from stdout to find the plugin.
///
/// `1|6|tcp|127.0.0.1:PORT|grpc`, followed by `|CERT` under auto-mTLS.
pub fn handshake_line(addr: SocketAddr, server_cert: Option<&str>) -> String {
    let mut line = format!("{}|{}|tcp|{}|grpc", CORE_PROTOCOL_VERSION, PROTOCOL_VERSION, addr);
    if let Some(cert) = server_cert {
        line.push('|');
        line.push_str(cert);
    }
    line
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachConfig {
    protocol: &'static str,
    protocol_version: u32,
    pid: u32,
    test: bool,
    addr: ReattachAddr,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachAddr {
    network: &'static str,
    string: String,
}

/// `TF_REATTACH_PROVIDERS` value for a provider served in debug mode
pub fn reattach_config(provider_address: &str, addr: SocketAddr, pid: u32) -> Result<String> {
    let config = ReattachConfig {
        protocol: "grpc",
        protocol_version: PROTOCOL_VERSION,
        pid,
        test: true,
        addr: ReattachAddr { network: "tcp", string: addr.to_string() },
    };

    let providers = BTreeMap::from([(provider_address, config)]);
    serde_json::to_string(&providers)
        .map_err(|e| ProviderError::internal(format!("Failed to encode reattach configuration: {}", e)))
}
