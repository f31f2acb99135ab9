use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use supabase_vault::{
    cli::Cli,
    observability::{init_logging, LogSettings},
    plugin::{self, ServeMode, NOT_A_PLUGIN_MESSAGE},
    PluginEnv, SupabaseVaultProvider, APP_NAME, VERSION,
};
use tracing::info;

fn install_rustls_provider() {
    use rustls::crypto::{aws_lc_rs, CryptoProvider};

    if CryptoProvider::get_default().is_none() {
        // Only fails when another provider won the race, which is fine
        let _ = aws_lc_rs::default_provider().install_default();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_rustls_provider();

    let cli = Cli::parse();
    init_logging(&LogSettings::from_env()).context("Failed to initialize logging")?;

    let mode = cli.serve_mode();
    let env = PluginEnv::from_env().context("Failed to read plugin environment")?;

    if mode == ServeMode::Managed && !env.has_magic_cookie() {
        eprintln!("{}", NOT_A_PLUGIN_MESSAGE);
        std::process::exit(1);
    }

    info!(app_name = APP_NAME, version = VERSION, debug = cli.debug, "Starting provider plugin");

    let provider = Arc::new(SupabaseVaultProvider::new(VERSION));
    plugin::serve(provider, &env, mode).await.context("Provider plugin terminated")?;

    Ok(())
}
