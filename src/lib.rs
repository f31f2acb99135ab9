//! # Supabase Vault Provider
//!
//! A Terraform/OpenTofu provider that manages secrets in Supabase Vault by
//! talking directly to the project's PostgreSQL database.
//!
//! ## Architecture
//!
//! ```text
//! Terraform ──gRPC (tfplugin6)──▶ ProviderService ──▶ Resource ──▶ VaultStore ──▶ PostgreSQL
//!                                      │                                  (vault.create_secret,
//!                                      ▼                                   vault.update_secret,
//!                                SupabaseVaultProvider                     vault.secrets)
//! ```
//!
//! ## Core Components
//!
//! - **Plugin server** ([`plugin`]): go-plugin handshake, auto-mTLS, controller and health services
//! - **Protocol layer** ([`tfplugin`]): schemas, the msgpack value codec, diagnostics, RPC dispatch
//! - **Provider** ([`provider`]): configure lifecycle and the `supabase-vault_secret` resource
//! - **Vault access** ([`secrets`], [`storage`]): pooled PostgreSQL connection and vault SQL

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod plugin;
pub mod provider;
pub mod secrets;
pub mod storage;
pub mod tfplugin;

pub use config::{PluginEnv, ProviderConfig};
pub use errors::{ProviderError, Result};
pub use provider::SupabaseVaultProvider;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
