use std::sync::Arc;

use anyhow::Result;
use gearloop::{
    config::config_loader,
    infrastructure::{
        axum_http::http_serve,
        postgres::{migrations, postgres_connection},
    },
    observability,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("gearloop exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("gearloop")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = Arc::new(postgres_connection::establish_connection(
        &dotenvy_env.database,
    )?);
    info!(
        max_connections = dotenvy_env.database.max_connections,
        "Postgres connection has been established"
    );

    if dotenvy_env.database.run_migrations {
        migrations::run_pending(Arc::clone(&postgres_pool))?;
    }

    http_serve::start(Arc::new(dotenvy_env), postgres_pool).await?;

    Ok(())
}
