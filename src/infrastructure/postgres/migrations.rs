use std::sync::Arc;

use anyhow::{Result, anyhow};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn run_pending(db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let mut conn = db_pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow!("failed to run migrations: {err}"))?;

    info!(applied = applied.len(), "migrations: schema is up to date");
    Ok(())
}
