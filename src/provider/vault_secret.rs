//! `supabase-vault_secret` resource
//!
//! One vault secret per instance. The value is written on create and update
//! and never read back; refresh only touches name, description and key_id.

use super::resource::{required_string, Operation, ProviderData, Resource};
use crate::errors::{ProviderError, Result};
use crate::secrets::{append_managed_by_footer, strip_managed_by_footer, SecretString};
use crate::tfplugin::{Attribute, AttributeType, Block, ObjectValue, Value};
use async_trait::async_trait;
use tracing::{debug, trace, warn};

/// Resource type name
pub const TYPE_NAME: &str = "supabase-vault_secret";

pub fn factory() -> Box<dyn Resource> {
    Box::new(VaultSecretResource)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VaultSecretResource;

impl VaultSecretResource {
    fn description(planned: &ObjectValue) -> &str {
        planned.string("description").unwrap_or("")
    }
}

#[async_trait]
impl Resource for VaultSecretResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Block {
        Block::new(vec![
            Attribute::computed("id", AttributeType::String)
                .describe("Secret UUID returned from vault functions"),
            Attribute::required("name", AttributeType::String)
                .describe("Unique name for the secret"),
            Attribute::required("value", AttributeType::String)
                .sensitive()
                .describe("Secret value to encrypt and store"),
            Attribute::optional_computed("key_id", AttributeType::String).describe(
                "Optional encryption key ID (if using custom keys). This value is read from the database and preserved even if not specified in the configuration.",
            ),
            Attribute::optional("description", AttributeType::String)
                .describe("Optional description for the secret"),
        ])
        .describe("Manages a secret in Supabase Vault. Secrets are encrypted and stored securely in the database.")
    }

    async fn create(&self, data: &ProviderData, planned: &ObjectValue) -> Result<ObjectValue> {
        let name = required_string(planned, "name")?;
        let value = SecretString::new(required_string(planned, "value")?);

        if let Some(key_id) = planned.string("key_id") {
            warn!(
                name = %name,
                key_id = %key_id,
                "key_id is not supported on create; the secret uses the database default key"
            );
        }

        let description = append_managed_by_footer(Self::description(planned), &data.version);
        let id = data.vault.create_secret(&value, name, &description).await?;

        let key_id = match data.vault.key_id(&id).await {
            Ok(key_id) => key_id,
            Err(e) => {
                warn!(id = %id, error = %e, "Unable to read key_id after creation, setting to null");
                None
            }
        };

        trace!(id = %id, name = %name, "Created vault secret");

        let mut state = planned.clone();
        state.set("id", Value::string(id));
        state.set("key_id", Value::from_option(key_id));
        state.resolve_unknowns();
        Ok(state)
    }

    async fn read(&self, data: &ProviderData, current: &ObjectValue) -> Result<Option<ObjectValue>> {
        let id = required_string(current, "id")?;

        let Some(metadata) = data.vault.read_metadata(id).await? else {
            debug!(id = %id, "Secret no longer exists, removing from state");
            return Ok(None);
        };

        let description = strip_managed_by_footer(&metadata.description);
        let description = if !description.is_empty() || current.string("description") == Some("") {
            Value::string(description)
        } else {
            Value::Null
        };

        let mut state = current.clone();
        state.set("name", Value::string(metadata.name));
        state.set("key_id", Value::from_option(metadata.key_id));
        state.set("description", description);
        Ok(Some(state))
    }

    async fn update(
        &self,
        data: &ProviderData,
        prior: &ObjectValue,
        planned: &ObjectValue,
    ) -> Result<ObjectValue> {
        let id = required_string(prior, "id")?;
        let name = required_string(planned, "name")?;
        let value = SecretString::new(required_string(planned, "value")?);

        if let Some(key_id) = planned.string("key_id") {
            if prior.string("key_id") != Some(key_id) {
                warn!(id = %id, key_id = %key_id, "key_id cannot be changed on update and is ignored");
            }
        }

        let description = append_managed_by_footer(Self::description(planned), &data.version);
        data.vault.update_secret(id, &value, name, &description).await?;

        trace!(id = %id, name = %name, "Updated vault secret");

        let mut state = planned.clone();
        state.set("id", Value::string(id));
        state.resolve_unknowns();
        Ok(state)
    }

    async fn delete(&self, data: &ProviderData, prior: &ObjectValue) -> Result<()> {
        let id = required_string(prior, "id")?;
        data.vault.delete_secret(id).await?;
        trace!(id = %id, "Deleted vault secret");
        Ok(())
    }

    async fn import(&self, data: &ProviderData, name: &str) -> Result<ObjectValue> {
        let id = data
            .vault
            .find_id_by_name(name)
            .await?
            .ok_or_else(|| ProviderError::not_found("secret", format!("name: {}", name)))?;

        Ok(ObjectValue::new().with("id", Value::string(id)).with("name", Value::string(name)))
    }

    fn error_summary(&self, operation: Operation, error: &ProviderError) -> String {
        match operation {
            Operation::Create => "Unable to create vault secret",
            Operation::Read => "Unable to read vault secret metadata",
            Operation::Update => "Unable to update vault secret",
            Operation::Delete => "Unable to delete vault secret",
            Operation::Import if error.is_not_found() => "Secret not found",
            Operation::Import => "Unable to import vault secret",
        }
        .to_string()
    }
}
