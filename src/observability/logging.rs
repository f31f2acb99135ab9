//! # Structured Logging
//!
//! Logging macros and level resolution. Terraform captures the provider's
//! stderr, so every log line goes there; stdout is reserved for the plugin
//! handshake.

/// Create a tracing span for a plugin RPC.
///
/// ```rust,ignore
/// let span = rpc_span!("ReadResource");
/// let span = rpc_span!("ReadResource", request.type_name);
/// ```
#[macro_export]
macro_rules! rpc_span {
    ($rpc:expr) => {
        tracing::info_span!(
            "rpc",
            rpc = %$rpc,
            request_id = %uuid::Uuid::new_v4(),
            type_name = tracing::field::Empty
        )
    };
    ($rpc:expr, $type_name:expr) => {
        tracing::info_span!(
            "rpc",
            rpc = %$rpc,
            request_id = %uuid::Uuid::new_v4(),
            type_name = %$type_name
        )
    };
}

/// Default filter when no log variable is set
pub const DEFAULT_FILTER: &str = "warn";

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive string
    pub filter: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { filter: DEFAULT_FILTER.to_string(), json: false }
    }
}

impl LogSettings {
    /// Read `RUST_LOG`, `TF_LOG_PROVIDER` and `TF_LOG`, in that order of precedence
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self::resolve(var("RUST_LOG"), var("TF_LOG_PROVIDER"), var("TF_LOG"))
    }

    pub fn resolve(
        rust_log: Option<String>,
        tf_log_provider: Option<String>,
        tf_log: Option<String>,
    ) -> Self {
        let terraform = tf_log_provider.or(tf_log).map(|level| terraform_level(&level));
        let json = terraform.is_some_and(|(_, json)| json);

        match (rust_log, terraform) {
            (Some(filter), _) => Self { filter, json },
            (None, Some((level, json))) => Self { filter: level.to_string(), json },
            (None, None) => Self::default(),
        }
    }
}

/// Map a Terraform log level to a filter directive; `JSON` means trace in JSON.
/// Unrecognized values enable trace, as Terraform does.
fn terraform_level(value: &str) -> (&'static str, bool) {
    match value.trim().to_ascii_uppercase().as_str() {
        "ERROR" => ("error", false),
        "WARN" => ("warn", false),
        "INFO" => ("info", false),
        "DEBUG" => ("debug", false),
        "OFF" => ("off", false),
        "JSON" => ("trace", true),
        _ => ("trace", false),
    }
}
