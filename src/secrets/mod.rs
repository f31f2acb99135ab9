//! Secret storage for the `supabase-vault_secret` resource.
//!
//! - [`store`]: the [`VaultStore`] trait the resource is written against
//! - [`postgres`]: SQL implementation over the Supabase `vault` schema
//! - [`footer`]: the managed-by description footer
//! - [`types`]: [`SecretString`], a redacting wrapper for secret material

pub mod footer;
pub mod postgres;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use footer::{append_managed_by_footer, managed_by_footer, strip_managed_by_footer};
pub use postgres::PgVaultStore;
pub use store::{SecretMetadata, VaultStore};
pub use types::SecretString;
