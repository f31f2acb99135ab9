//! In-memory vault store for unit tests.

use super::store::{SecretMetadata, VaultStore};
use super::types::SecretString;
use crate::errors::{ProviderError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// A stored row, including the value the real vault would encrypt.
#[derive(Debug, Clone)]
pub struct StoredSecret {
    pub metadata: SecretMetadata,
    pub value: SecretString,
}

/// Vault store keeping rows in a map.
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    rows: Mutex<BTreeMap<String, StoredSecret>>,
    next_id: AtomicU64,
    default_key_id: Option<String>,
    fail_key_lookup: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryVaultStore {
    /// Store assigning `key_id` to every created secret.
    pub fn with_default_key(key_id: &str) -> Self {
        Self { default_key_id: Some(key_id.to_string()), ..Default::default() }
    }

    pub fn fail_key_lookup(&self, fail: bool) {
        self.fail_key_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<StoredSecret> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Insert a row directly, as if created outside Terraform.
    pub fn insert(&self, name: &str, value: &str, description: &str) -> String {
        let id = self.allocate_id();
        self.rows.lock().unwrap().insert(
            id.clone(),
            StoredSecret {
                metadata: SecretMetadata {
                    id: id.clone(),
                    name: name.to_string(),
                    description: description.to_string(),
                    key_id: self.default_key_id.clone(),
                },
                value: SecretString::new(value),
            },
        );
        id
    }

    /// Drop a row behind Terraform's back.
    pub fn remove(&self, id: &str) {
        self.rows.lock().unwrap().remove(id);
    }

    /// Change the stored value behind Terraform's back.
    pub fn overwrite_value(&self, id: &str, value: &str) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.value = SecretString::new(value);
        }
    }

    fn allocate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("00000000-0000-4000-8000-{n:012}")
    }

    fn check_write(&self, context: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProviderError::database(
                context,
                sqlx::Error::Protocol("permission denied for schema vault".into()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VaultStore for MemoryVaultStore {
    async fn create_secret(
        &self,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<String> {
        self.check_write("Error calling vault.create_secret")?;
        if self.rows.lock().unwrap().values().any(|row| row.metadata.name == name) {
            return Err(ProviderError::database(
                "Error calling vault.create_secret",
                sqlx::Error::Protocol(format!(
                    "duplicate key value violates unique constraint \"secrets_name_idx\" ({name})"
                )),
            ));
        }
        Ok(self.insert(name, value.expose_secret(), description))
    }

    async fn key_id(&self, id: &str) -> Result<Option<String>> {
        if self.fail_key_lookup.load(Ordering::SeqCst) {
            return Err(ProviderError::database(
                "Error reading secret key_id",
                sqlx::Error::Protocol("canceling statement due to statement timeout".into()),
            ));
        }
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .map(|row| row.metadata.key_id.clone())
            .ok_or_else(|| ProviderError::database("Error reading secret key_id", sqlx::Error::RowNotFound))
    }

    async fn read_metadata(&self, id: &str) -> Result<Option<SecretMetadata>> {
        Ok(self.rows.lock().unwrap().get(id).map(|row| row.metadata.clone()))
    }

    async fn update_secret(
        &self,
        id: &str,
        value: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<()> {
        self.check_write("Error calling vault.update_secret")?;
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.metadata.name = name.to_string();
            row.metadata.description = description.to_string();
            row.value = value.clone();
        }
        Ok(())
    }

    async fn delete_secret(&self, id: &str) -> Result<()> {
        self.check_write("Error deleting secret")?;
        self.rows.lock().unwrap().remove(id);
        Ok(())
    }

    async fn find_id_by_name(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|row| row.metadata.name == name)
            .map(|row| row.metadata.id.clone()))
    }
}
