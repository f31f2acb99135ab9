//! Plugin process environment.
//!
//! Terraform launches provider binaries with a fixed set of environment
//! variables: a magic cookie proving the binary was started as a plugin, the
//! protocol versions it speaks, an optional port range and, when auto-mTLS is
//! on, the PEM certificate its client will present.

use crate::errors::{ProviderError, Result};
use serde::Deserialize;

/// Environment variable carrying the handshake cookie
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";

/// Cookie value Terraform sets for every provider plugin
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// Plugin protocol version implemented by this binary
pub const PROTOCOL_VERSION: u32 = 6;

/// Settings read from `TF_PLUGIN_*` and `PLUGIN_*` variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginEnv {
    /// `TF_PLUGIN_MAGIC_COOKIE`
    #[serde(default)]
    pub magic_cookie: Option<String>,

    /// `PLUGIN_CLIENT_CERT`: PEM certificate of the Terraform client
    #[serde(default)]
    pub client_cert: Option<String>,

    /// `PLUGIN_PROTOCOL_VERSIONS`: comma separated list, e.g. `5,6`
    #[serde(default)]
    pub protocol_versions: Option<String>,

    /// `PLUGIN_MIN_PORT`
    #[serde(default)]
    pub min_port: Option<u16>,

    /// `PLUGIN_MAX_PORT`
    #[serde(default)]
    pub max_port: Option<u16>,
}

impl PluginEnv {
    /// Load plugin settings from the process environment
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TF_PLUGIN").try_parsing(false))
            .add_source(config::Environment::with_prefix("PLUGIN").try_parsing(true))
            .build()
            .map_err(|e| ProviderError::config(format!("Invalid plugin environment: {}", e)))?;

        let env: Self = settings
            .try_deserialize()
            .map_err(|e| ProviderError::config(format!("Invalid plugin environment: {}", e)))?;

        env.validate()?;
        Ok(env)
    }

    /// True when Terraform started this binary as a plugin
    pub fn has_magic_cookie(&self) -> bool {
        self.magic_cookie.as_deref() == Some(MAGIC_COOKIE_VALUE)
    }

    /// Client certificate PEM, when auto-mTLS is requested
    pub fn client_cert_pem(&self) -> Option<&str> {
        self.client_cert.as_deref().map(str::trim).filter(|pem| !pem.is_empty())
    }

    /// Whether the host accepts [`PROTOCOL_VERSION`]. An unset list is taken as yes.
    pub fn supports_protocol(&self) -> bool {
        match self.protocol_versions.as_deref() {
            None => true,
            Some(list) => list
                .split(',')
                .filter_map(|v| v.trim().parse::<u32>().ok())
                .any(|v| v == PROTOCOL_VERSION),
        }
    }

    /// Inclusive listen port range; `None` lets the OS pick
    pub fn port_range(&self) -> Option<(u16, u16)> {
        match (self.min_port, self.max_port) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(1), max.unwrap_or(u16::MAX))),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some((min, max)) = self.port_range() {
            if min > max {
                return Err(ProviderError::config(format!(
                    "PLUGIN_MIN_PORT ({}) is greater than PLUGIN_MAX_PORT ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}
