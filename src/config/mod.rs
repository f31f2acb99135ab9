//! # Configuration Management
//!
//! - [`ProviderConfig`]: the `provider "supabase-vault"` block, after defaults
//! - [`PluginEnv`]: process environment Terraform sets when launching plugins

pub mod plugin;

pub use plugin::{PluginEnv, MAGIC_COOKIE_KEY, MAGIC_COOKIE_VALUE};

use crate::errors::{ProviderError, Result};
use crate::secrets::SecretString;
use validator::Validate;

/// Default PostgreSQL port
pub const DEFAULT_PORT: i64 = 5432;

/// Default database name
pub const DEFAULT_DATABASE: &str = "postgres";

/// Default database user
pub const DEFAULT_USER: &str = "postgres";

/// Provider configuration with defaults applied.
///
/// `password` never appears in Debug output; it only leaves this struct
/// inside the connection string handed to the driver.
#[derive(Debug, Clone, Validate)]
pub struct ProviderConfig {
    /// Host, optionally carrying a scheme, `:port` and `/database`
    #[validate(length(min = 1, message = "host must not be empty"))]
    pub host: String,

    #[validate(range(min = 1, max = 65535, message = "port must be between 1 and 65535"))]
    pub port: i64,

    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,

    #[validate(length(min = 1, message = "user must not be empty"))]
    pub user: String,

    pub password: SecretString,

    /// Passed through verbatim as the `sslmode` query parameter
    pub sslmode: Option<String>,
}

impl ProviderConfig {
    /// Configuration with only the required fields set.
    pub fn new(host: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: password.into(),
            sslmode: None,
        }
    }

    /// Validate field constraints
    pub fn validate_config(&self) -> Result<()> {
        Validate::validate(self).map_err(ProviderError::from)
    }
}

impl From<validator::ValidationErrors> for ProviderError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        match fields.first() {
            Some((field, _)) => ProviderError::config_field(message, field.to_string()),
            None => ProviderError::config(message),
        }
    }
}
