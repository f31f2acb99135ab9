//! # Error Handling
//!
//! Error types for the Supabase Vault provider, defined with `thiserror`.
//! The RPC layer turns every [`ProviderError`] into a Terraform diagnostic, so
//! the `Display` text of each variant is what users see as the detail line.

use std::time::Duration;

/// Custom result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Phase of connection establishment, used to tell timeouts apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStage {
    /// Establishing the first database connection
    CreatePool,
    /// Liveness check on that connection
    Ping,
}

impl ConnectStage {
    fn action(&self) -> &'static str {
        match self {
            ConnectStage::CreatePool => "create connection pool",
            ConnectStage::Ping => "ping database",
        }
    }
}

impl std::fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action())
    }
}

/// Main error type for the provider
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    /// Missing or invalid provider configuration
    #[error("{message}")]
    Config { message: String, field: Option<String> },

    /// Connection establishment exceeded its time bound
    #[error(
        "Connection timeout: unable to {stage} within {} seconds. Please check your connection settings and network connectivity.",
        timeout.as_secs()
    )]
    ConnectionTimeout { stage: ConnectStage, timeout: Duration },

    /// Connection establishment failed for any other reason
    #[error("Unable to {stage}: {source}")]
    Connection {
        stage: ConnectStage,
        #[source]
        source: sqlx::Error,
    },

    /// A lookup matched no row
    #[error("No {resource_type} found with {key}")]
    NotFound { resource_type: String, key: String },

    /// Any other SQL failure, reported with the driver's message
    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Operation requires a configured provider
    #[error("The provider has not been configured. Please report this issue to the provider developers.")]
    NotConfigured,

    /// Malformed Terraform value payloads
    #[error("Value encoding error: {0}")]
    Codec(String),

    /// Plugin transport failures (listener, TLS, handshake)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error tied to a configuration attribute
    pub fn config_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, K: Into<String>>(resource_type: R, key: K) -> Self {
        Self::NotFound { resource_type: resource_type.into(), key: key.into() }
    }

    /// Wrap a driver error with the statement it came from
    pub fn database<S: Into<String>>(context: S, source: sqlx::Error) -> Self {
        Self::Database { context: context.into(), source }
    }

    /// Create a new codec error
    pub fn codec<S: Into<String>>(message: S) -> Self {
        Self::Codec(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// True when the error is a connection timeout rather than a refusal
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// True for "no matching row" errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Attribute name to attach to the diagnostic, when known
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Config { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
