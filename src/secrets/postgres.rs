//! PostgreSQL vault store
//!
//! Maps each [`VaultStore`] operation onto one parameterized statement against
//! the `vault` schema. Encryption happens inside `vault.create_secret` and
//! `vault.update_secret`; reads go to `vault.secrets`, which holds name,
//! description and key_id in plaintext, so no decryption happens on refresh.

use super::store::{SecretMetadata, VaultStore};
use super::types::SecretString;
use crate::errors::{ProviderError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{debug, error};

const CREATE_SECRET: &str = "SELECT vault.create_secret($1, $2, $3)::text";
const SELECT_KEY_ID: &str = "SELECT key_id::text FROM vault.secrets WHERE id = $1::uuid";
const SELECT_METADATA: &str = "SELECT id::text AS id, name, COALESCE(description, '') AS description, key_id::text AS key_id FROM vault.secrets WHERE id = $1::uuid";
const UPDATE_SECRET: &str = "SELECT vault.update_secret($1::uuid, $2, $3, $4)";
const DELETE_SECRET: &str = "DELETE FROM vault.secrets WHERE id = $1::uuid";
const SELECT_ID_BY_NAME: &str = "SELECT id::text FROM vault.decrypted_secrets WHERE name = $1";

/// Database row for metadata lookups
#[derive(Debug, Clone, FromRow)]
struct SecretMetadataRow {
    id: String,
    name: Option<String>,
    description: String,
    key_id: Option<String>,
}

impl From<SecretMetadataRow> for SecretMetadata {
    fn from(row: SecretMetadataRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_default(),
            description: row.description,
            key_id: row.key_id,
        }
    }
}

/// Vault store backed by the provider's connection pool.
#[derive(Debug, Clone)]
pub struct PgVaultStore {
    pool: DbPool,
}

impl PgVaultStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VaultStore for PgVaultStore {
    async fn create_secret(
        &self,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<String> {
        debug!(name = %name, "Calling vault.create_secret");

        sqlx::query_scalar::<_, String>(CREATE_SECRET)
            .bind(value.expose_secret())
            .bind(name)
            .bind(description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(name = %name, error = %e, "vault.create_secret failed");
                ProviderError::database("Error calling vault.create_secret", e)
            })
    }

    async fn key_id(&self, id: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, Option<String>>(SELECT_KEY_ID)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ProviderError::database("Error reading secret key_id", e))
    }

    async fn read_metadata(&self, id: &str) -> Result<Option<SecretMetadata>> {
        let row = sqlx::query_as::<_, SecretMetadataRow>(SELECT_METADATA)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "Secret metadata query failed");
                ProviderError::database("Error reading secret metadata", e)
            })?;

        Ok(row.map(SecretMetadata::from))
    }

    async fn update_secret(
        &self,
        id: &str,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<()> {
        debug!(id = %id, name = %name, "Calling vault.update_secret");

        sqlx::query(UPDATE_SECRET)
            .bind(id)
            .bind(value.expose_secret())
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "vault.update_secret failed");
                ProviderError::database("Error calling vault.update_secret", e)
            })?;

        Ok(())
    }

    async fn delete_secret(&self, id: &str) -> Result<()> {
        let result = sqlx::query(DELETE_SECRET)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "Secret delete failed");
                ProviderError::database("Error deleting secret", e)
            })?;

        debug!(id = %id, rows_affected = result.rows_affected(), "Deleted secret row");
        Ok(())
    }

    async fn find_id_by_name(&self, name: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(SELECT_ID_BY_NAME)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ProviderError::database("Error looking up secret by name", e))
    }
}
