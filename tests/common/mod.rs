//! Shared setup for PostgreSQL integration tests.
//!
//! Starts a plain PostgreSQL container and installs a minimal `vault` schema
//! with the same function signatures and tables Supabase exposes. Values are
//! stored unencrypted; only the interface matters to the provider.

#![allow(dead_code)]

use supabase_vault::storage::{open_pool, DbPool};
use supabase_vault::tfplugin::{ObjectValue, Value};
use supabase_vault::ProviderConfig;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

/// Key id assigned to secrets created without an explicit key
pub const DEFAULT_KEY_ID: &str = "9f4a2c1e-5b7d-4e8f-a6c3-1d2e3f4a5b6c";

const VAULT_SHIM: &str = r#"
CREATE EXTENSION IF NOT EXISTS pgcrypto;
CREATE SCHEMA vault;

CREATE TABLE vault.secrets (
    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
    name text UNIQUE,
    description text NOT NULL DEFAULT '',
    secret text NOT NULL,
    key_id uuid DEFAULT '9f4a2c1e-5b7d-4e8f-a6c3-1d2e3f4a5b6c'::uuid,
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now()
);

CREATE VIEW vault.decrypted_secrets AS
    SELECT id, name, description, secret, secret AS decrypted_secret, key_id, created_at, updated_at
    FROM vault.secrets;

CREATE FUNCTION vault.create_secret(
    new_secret text,
    new_name text DEFAULT NULL,
    new_description text DEFAULT '',
    new_key_id uuid DEFAULT NULL
) RETURNS uuid LANGUAGE sql AS $$
    INSERT INTO vault.secrets (secret, name, description, key_id)
    VALUES (new_secret, new_name, new_description, COALESCE(new_key_id, '9f4a2c1e-5b7d-4e8f-a6c3-1d2e3f4a5b6c'::uuid))
    RETURNING id
$$;

CREATE FUNCTION vault.update_secret(
    secret_id uuid,
    new_secret text DEFAULT NULL,
    new_name text DEFAULT NULL,
    new_description text DEFAULT NULL,
    new_key_id uuid DEFAULT NULL
) RETURNS void LANGUAGE sql AS $$
    UPDATE vault.secrets
    SET secret = COALESCE(new_secret, secret),
        name = COALESCE(new_name, name),
        description = COALESCE(new_description, description),
        key_id = COALESCE(new_key_id, key_id),
        updated_at = now()
    WHERE id = secret_id
$$;
"#;

/// A PostgreSQL container with the vault shim installed.
///
/// The container stops when this struct is dropped.
pub struct VaultDatabase {
    pub host: String,
    pub port: u16,
    pub pool: DbPool,
    _container: ContainerAsync<Postgres>,
}

impl VaultDatabase {
    pub async fn start() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .unwrap_or_else(|e| panic!("Failed to start PostgreSQL container: {}", e));

        let host = container
            .get_host()
            .await
            .unwrap_or_else(|e| panic!("Failed to get container host: {}", e))
            .to_string();
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .unwrap_or_else(|e| panic!("Failed to get container port: {}", e));

        let mut config = ProviderConfig::new(host.clone(), "postgres");
        config.port = i64::from(port);
        config.sslmode = Some("disable".to_string());

        let pool = open_pool(&config)
            .await
            .unwrap_or_else(|e| panic!("Failed to connect to test database: {}", e));

        sqlx::raw_sql(VAULT_SHIM)
            .execute(&pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to install vault schema: {}", e));

        Self { host, port, pool, _container: container }
    }

    /// Provider block pointing at this database
    pub fn provider_block(&self) -> ObjectValue {
        ObjectValue::new()
            .with("host", Value::string(format!("{}:{}", self.host, self.port)))
            .with("password", Value::string("postgres"))
            .with("sslmode", Value::string("disable"))
    }

    /// Raw description column, footer included
    pub async fn stored_description(&self, id: &str) -> String {
        sqlx::query_scalar("SELECT description FROM vault.secrets WHERE id = $1::uuid")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Plaintext value as the decrypted view returns it
    pub async fn decrypted_value(&self, id: &str) -> String {
        sqlx::query_scalar("SELECT decrypted_secret FROM vault.decrypted_secrets WHERE id = $1::uuid")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count(&self) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM vault.secrets").fetch_one(&self.pool).await.unwrap()
    }
}
