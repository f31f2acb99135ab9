//! Vault store trait and types
//!
//! Defines the interface between the secret resource and the database-side
//! vault primitives. The resource never issues SQL directly; it talks to a
//! [`VaultStore`], which keeps lifecycle logic testable without a database.

use super::types::SecretString;
use crate::errors::Result;
use async_trait::async_trait;

/// Plaintext metadata stored next to an encrypted secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub key_id: Option<String>,
}

/// Client of the database vault extension.
///
/// Implementations must be Send + Sync: Terraform may drive several resource
/// instances concurrently and every operation shares one store.
#[async_trait]
pub trait VaultStore: Send + Sync + std::fmt::Debug {
    /// Create a secret, returning the identifier assigned by the database.
    async fn create_secret(
        &self,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<String>;

    /// Look up the encryption key reference of a secret.
    async fn key_id(&self, id: &str) -> Result<Option<String>>;

    /// Read plaintext metadata; `Ok(None)` when no row matches.
    async fn read_metadata(&self, id: &str) -> Result<Option<SecretMetadata>>;

    /// Overwrite value, name and description of an existing secret.
    async fn update_secret(
        &self,
        id: &str,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<()>;

    /// Delete a secret row. Deleting an absent id is not an error.
    async fn delete_secret(&self, id: &str) -> Result<()>;

    /// Resolve a secret name to its identifier.
    async fn find_id_by_name(&self, name: &str) -> Result<Option<String>>;
}
