//! # Command Line Interface
//!
//! Terraform launches the provider without arguments. The flags exist for
//! running it by hand under a debugger.

use crate::plugin::{ServeMode, DEFAULT_PROVIDER_ADDRESS};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "terraform-provider-supabase-vault")]
#[command(about = "Terraform provider for Supabase Vault secrets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Start in debug mode and print TF_REATTACH_PROVIDERS for attaching Terraform
    #[arg(long)]
    pub debug: bool,

    /// Provider address reported in debug mode
    #[arg(long, default_value = DEFAULT_PROVIDER_ADDRESS)]
    pub provider_address: String,
}

impl Cli {
    pub fn serve_mode(&self) -> ServeMode {
        if self.debug {
            ServeMode::Debug { provider_address: self.provider_address.clone() }
        } else {
            ServeMode::Managed
        }
    }
}
