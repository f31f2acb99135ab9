//! # Plugin Server
//!
//! Runs the provider as a go-plugin gRPC server. In managed mode Terraform
//! starts the binary, reads the handshake line from stdout and later asks the
//! plugin to stop through `GRPCController/Shutdown`. In debug mode the binary
//! is started by hand and prints a `TF_REATTACH_PROVIDERS` value instead.

pub mod controller;
pub mod handshake;
pub mod tls;

pub use controller::{Controller, HealthService};
pub use handshake::{bind_listener, handshake_line, reattach_config};
pub use tls::{PinnedClientCertVerifier, ServerIdentity};

use crate::config::plugin::PluginEnv;
use crate::errors::{ProviderError, Result};
use crate::provider::SupabaseVaultProvider;
use crate::tfplugin::ProviderService;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_rustls::{server::TlsStream, TlsAcceptor};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::Stream;
use tonic::transport::Server;
use tracing::{debug, error, info, warn};

/// Shown when the binary is run directly instead of by Terraform
pub const NOT_A_PLUGIN_MESSAGE: &str = "This binary is a plugin. These are not meant to be executed directly.
Please execute the program that consumes these plugins, which will
load any plugins automatically";

/// Registry address used by default for debug reattach output
pub const DEFAULT_PROVIDER_ADDRESS: &str = "registry.terraform.io/supabase/supabase-vault";

/// How the plugin was launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeMode {
    /// Started by Terraform with the plugin environment
    Managed,
    /// Started by a developer; Terraform attaches through `TF_REATTACH_PROVIDERS`
    Debug { provider_address: String },
}

/// Serve `provider` until the plugin host or the developer stops it.
pub async fn serve(provider: Arc<SupabaseVaultProvider>, env: &PluginEnv, mode: ServeMode) -> Result<()> {
    let shutdown = Arc::new(Notify::new());

    let (listener, acceptor) = match &mode {
        ServeMode::Managed => {
            if !env.supports_protocol() {
                return Err(ProviderError::transport(format!(
                    "Plugin host offers protocol versions {:?}; this provider only speaks version {}",
                    env.protocol_versions.as_deref().unwrap_or_default(),
                    crate::config::plugin::PROTOCOL_VERSION
                )));
            }

            let listener = bind_listener(env.port_range()).await?;
            let addr = listener.local_addr()?;

            let (acceptor, server_cert) = match env.client_cert_pem() {
                Some(pem) => {
                    let identity = ServerIdentity::generate()?;
                    let acceptor = tls::acceptor(&identity, pem)?;
                    (Some(acceptor), Some(identity.handshake_cert()))
                }
                None => (None, None),
            };

            info!(address = %addr, mtls = acceptor.is_some(), "Plugin server listening");
            announce(&handshake_line(addr, server_cert.as_deref()))?;
            ignore_interrupts();
            (listener, acceptor)
        }
        ServeMode::Debug { provider_address } => {
            let listener = bind_listener(None).await?;
            let addr = listener.local_addr()?;
            let reattach = reattach_config(provider_address, addr, std::process::id())?;

            info!(address = %addr, "Plugin server listening in debug mode");
            announce(&format!(
                "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS environment variable with the following:\n\n\tTF_REATTACH_PROVIDERS='{}'\n",
                reattach
            ))?;
            (listener, None)
        }
    };

    let signal = shutdown_signal(shutdown.clone(), matches!(mode, ServeMode::Debug { .. }));

    let router = Server::builder()
        .add_service(ProviderService::new(provider).into_server())
        .add_service(Controller::new(shutdown).into_server())
        .add_service(HealthService.into_server());

    let served = match acceptor {
        Some(acceptor) => {
            router.serve_with_incoming_shutdown(tls_incoming(listener, acceptor), signal).await
        }
        None => {
            router.serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal).await
        }
    };

    served.map_err(|e| ProviderError::transport(format!("Plugin server failed: {}", e)))?;
    info!("Plugin server stopped");
    Ok(())
}

fn announce(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}

/// Terraform owns the process lifetime; an interrupt from the terminal is
/// delivered to it and it stops plugins itself.
fn ignore_interrupts() {
    tokio::spawn(async {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ignoring interrupt signal");
        }
    });
}

fn shutdown_signal(shutdown: Arc<Notify>, interruptible: bool) -> impl Future<Output = ()> {
    async move {
        if interruptible {
            tokio::select! {
                _ = shutdown.notified() => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Interrupt listener failed");
                    }
                }
            }
        } else {
            shutdown.notified().await;
        }
        info!("Shutting down plugin server");
    }
}

fn tls_incoming(
    listener: TcpListener,
    acceptor: TlsAcceptor,
) -> impl Stream<Item = std::io::Result<TlsStream<TcpStream>>> {
    async_stream::stream! {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => yield Ok::<_, std::io::Error>(tls_stream),
                    Err(e) => warn!(error = %e, %peer, "TLS handshake failed"),
                },
                Err(e) if is_connection_error(&e) => continue,
                Err(e) => {
                    error!("Plugin accept error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

fn is_connection_error(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}
