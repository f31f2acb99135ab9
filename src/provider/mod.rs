//! # Provider
//!
//! The `supabase-vault` provider: its configuration schema, the configure
//! lifecycle (Unconfigured, Configuring, then Ready or Failed) and the
//! registry of managed resources.

pub mod registry;
pub mod resource;
pub mod vault_secret;

pub use registry::{ResourceFactory, ResourceRegistry};
pub use resource::{Operation, ProviderData, Resource};
pub use vault_secret::VaultSecretResource;

use crate::config::ProviderConfig;
use crate::errors::{ProviderError, Result};
use crate::secrets::{PgVaultStore, SecretString, VaultStore};
use crate::storage::open_pool;
use crate::tfplugin::{Attribute, AttributeType, Block, Diagnostics, ObjectValue, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Provider type name; resource names are prefixed with it
pub const PROVIDER_TYPE_NAME: &str = "supabase-vault";

/// Configure lifecycle
#[derive(Debug, Clone)]
enum ProviderState {
    Unconfigured,
    Configuring,
    Ready(ProviderData),
    Failed,
}

impl ProviderState {
    fn name(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configuring => "configuring",
            Self::Ready(_) => "ready",
            Self::Failed => "failed",
        }
    }
}

/// The provider instance served over RPC.
#[derive(Debug)]
pub struct SupabaseVaultProvider {
    version: String,
    state: RwLock<ProviderState>,
    registry: ResourceRegistry,
}

impl SupabaseVaultProvider {
    pub fn new<S: Into<String>>(version: S) -> Self {
        Self {
            version: version.into(),
            state: RwLock::new(ProviderState::Unconfigured),
            registry: ResourceRegistry::with_defaults(),
        }
    }

    /// Provider already in the Ready state, backed by the given store
    #[cfg(test)]
    pub(crate) fn with_store<S: Into<String>>(version: S, vault: Arc<dyn VaultStore>) -> Self {
        let version = version.into();
        let data = ProviderData { vault, version: version.clone() };
        Self {
            version,
            state: RwLock::new(ProviderState::Ready(data)),
            registry: ResourceRegistry::with_defaults(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Schema of the `provider "supabase-vault"` block
    pub fn schema() -> Block {
        Block::new(vec![
            Attribute::required("host", AttributeType::String).describe("PostgreSQL host address"),
            Attribute::optional("port", AttributeType::Number).describe("PostgreSQL port number"),
            Attribute::optional("database", AttributeType::String)
                .describe("PostgreSQL database name (defaults to 'postgres')"),
            Attribute::optional("user", AttributeType::String)
                .describe("PostgreSQL user (defaults to 'postgres')"),
            Attribute::required("password", AttributeType::String)
                .sensitive()
                .describe("PostgreSQL password"),
            Attribute::optional("sslmode", AttributeType::String).describe(
                "PostgreSQL SSL mode (require, verify-full, etc.). If not specified, Supabase will use its default SSL configuration.",
            ),
        ])
    }

    /// Static checks on known configuration values. Unknown values pass.
    pub fn validate_config(&self, config: &ObjectValue, diagnostics: &mut Diagnostics) {
        if let Some(port) = config.get("port").as_i64() {
            if !(1..=65535).contains(&port) {
                diagnostics.attribute_error(
                    "port",
                    "Invalid provider configuration",
                    format!("port must be between 1 and 65535, got {}", port),
                );
            }
        }

        for name in ["host", "database", "user"] {
            if config.string(name) == Some("") {
                diagnostics.attribute_error(
                    name,
                    "Invalid provider configuration",
                    format!("{} must not be empty", name),
                );
            }
        }
    }

    /// Configure against PostgreSQL.
    pub async fn configure(&self, config: Option<&ObjectValue>) -> Result<()> {
        self.configure_with(config, connect_postgres).await
    }

    /// Run the configure lifecycle with a custom store connector.
    pub async fn configure_with<F, Fut>(&self, config: Option<&ObjectValue>, connect: F) -> Result<()>
    where
        F: FnOnce(ProviderConfig) -> Fut,
        Fut: Future<Output = Result<Arc<dyn VaultStore>>>,
    {
        *self.state.write().await = ProviderState::Configuring;

        let result = match provider_config(config) {
            Ok(config) => connect(config).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        match result {
            Ok(vault) => {
                info!(version = %self.version, "Provider configured");
                *state = ProviderState::Ready(ProviderData { vault, version: self.version.clone() });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Provider configuration failed");
                *state = ProviderState::Failed;
                Err(e)
            }
        }
    }

    /// Data for resource operations, available once Ready
    pub async fn data(&self) -> Result<ProviderData> {
        match &*self.state.read().await {
            ProviderState::Ready(data) => Ok(data.clone()),
            other => {
                warn!(state = other.name(), "Resource operation on unconfigured provider");
                Err(ProviderError::NotConfigured)
            }
        }
    }

    /// Current lifecycle state name
    pub async fn state_name(&self) -> &'static str {
        self.state.read().await.name()
    }
}

async fn connect_postgres(config: ProviderConfig) -> Result<Arc<dyn VaultStore>> {
    let pool = open_pool(&config).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(Arc::new(PgVaultStore::new(pool)))
}

/// Build a [`ProviderConfig`] from the decoded provider block.
fn provider_config(config: Option<&ObjectValue>) -> Result<ProviderConfig> {
    let Some(config) = config else {
        return Err(ProviderError::config("Provider configuration is missing"));
    };

    if let Some(name) = config.unknown_attributes().first() {
        return Err(ProviderError::config_field(
            format!(
                "The provider cannot connect to PostgreSQL because \"{}\" is not known until apply. Set it to a static value or apply the resources it depends on first.",
                name
            ),
            *name,
        ));
    }

    let required = |name: &str| {
        config
            .string(name)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::config_field(format!("The \"{}\" attribute is required", name), name))
    };

    let mut provider_config =
        ProviderConfig::new(required("host")?, SecretString::new(required("password")?));

    if let Value::Number(port) = config.get("port") {
        provider_config.port = *port;
    }
    if let Some(database) = config.string("database") {
        provider_config.database = database.to_string();
    }
    if let Some(user) = config.string("user") {
        provider_config.user = user.to_string();
    }
    provider_config.sslmode = config.string("sslmode").map(str::to_string);

    provider_config.validate_config()?;
    Ok(provider_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConnectStage;
    use crate::secrets::memory::MemoryVaultStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn block() -> ObjectValue {
        ObjectValue::new()
            .with("host", Value::string("db.example.co:6543/mydb"))
            .with("password", Value::string("hunter2"))
    }

    #[test]
    fn test_provider_config_defaults() {
        let config = provider_config(Some(&block())).unwrap();
        assert_eq!(config.host, "db.example.co:6543/mydb");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "postgres");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.password.expose_secret(), "hunter2");
        assert!(config.sslmode.is_none());
    }

    #[test]
    fn test_provider_config_explicit_values() {
        let block = block()
            .with("port", Value::Number(6543))
            .with("database", Value::string("app"))
            .with("user", Value::string("postgres.ref"))
            .with("sslmode", Value::string("require"));

        let config = provider_config(Some(&block)).unwrap();
        assert_eq!(config.port, 6543);
        assert_eq!(config.database, "app");
        assert_eq!(config.user, "postgres.ref");
        assert_eq!(config.sslmode.as_deref(), Some("require"));
    }

    #[test]
    fn test_provider_config_rejects_unknown_and_missing() {
        let error = provider_config(Some(&block().with("password", Value::Unknown))).unwrap_err();
        assert_eq!(error.attribute(), Some("password"));
        assert!(error.to_string().contains("not known until apply"));

        let error = provider_config(Some(&block().with("host", Value::Null))).unwrap_err();
        assert_eq!(error.attribute(), Some("host"));

        assert!(provider_config(None).is_err());

        let error = provider_config(Some(&block().with("port", Value::Number(0)))).unwrap_err();
        assert_eq!(error.attribute(), Some("port"));
    }

    #[test]
    fn test_validate_config() {
        let provider = SupabaseVaultProvider::new("test");

        let mut diagnostics = Diagnostics::new();
        provider.validate_config(&block().with("port", Value::Number(70000)), &mut diagnostics);
        assert!(diagnostics.has_errors());

        let mut diagnostics = Diagnostics::new();
        provider.validate_config(&block().with("port", Value::Unknown), &mut diagnostics);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_configure_success_publishes_data() {
        let provider = SupabaseVaultProvider::new("0.2.2");
        assert!(matches!(provider.data().await, Err(ProviderError::NotConfigured)));
        assert_eq!(provider.state_name().await, "unconfigured");

        provider
            .configure_with(Some(&block()), |config| async move {
                assert_eq!(config.user, "postgres");
                Ok::<_, ProviderError>(Arc::new(MemoryVaultStore::default()) as Arc<dyn VaultStore>)
            })
            .await
            .unwrap();

        assert_eq!(provider.state_name().await, "ready");
        assert_eq!(provider.data().await.unwrap().version, "0.2.2");
    }

    #[tokio::test]
    async fn test_configure_timeout_fails_provider() {
        let provider = SupabaseVaultProvider::new("0.2.2");

        let error = provider
            .configure_with(Some(&block()), |_| async {
                Err::<Arc<dyn VaultStore>, _>(ProviderError::ConnectionTimeout {
                    stage: ConnectStage::Ping,
                    timeout: Duration::from_secs(10),
                })
            })
            .await
            .unwrap_err();

        assert!(error.is_timeout());
        assert_eq!(provider.state_name().await, "failed");
        assert!(matches!(provider.data().await, Err(ProviderError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_configure_invalid_config_never_connects() {
        let provider = SupabaseVaultProvider::new("0.2.2");
        let connected = AtomicBool::new(false);

        let result = provider
            .configure_with(Some(&block().with("host", Value::string(""))), |_| async {
                connected.store(true, Ordering::SeqCst);
                Ok::<_, ProviderError>(Arc::new(MemoryVaultStore::default()) as Arc<dyn VaultStore>)
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Config { .. })));
        assert!(!connected.load(Ordering::SeqCst));
        assert_eq!(provider.state_name().await, "failed");
    }

    #[test]
    fn test_schema_marks_password_sensitive() {
        let schema = SupabaseVaultProvider::schema();
        let password = schema.attribute("password").unwrap();
        assert!(password.required && password.sensitive);
        assert_eq!(schema.attribute("port").unwrap().ty, AttributeType::Number);
    }
}
