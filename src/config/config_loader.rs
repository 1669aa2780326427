use std::{env, str::FromStr};

use anyhow::{Context, Result};

use super::config_model::{Auth, BackendServer, Database, DotEnvyConfig};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT")?,
        body_limit: optional("SERVER_BODY_LIMIT", 10)?,
        timeout: optional("SERVER_TIMEOUT", 30)?,
    };

    let database = Database {
        url: env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
        run_migrations: optional("RUN_MIGRATIONS", true)?,
    };

    let auth = Auth {
        jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET is invalid")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
    })
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .with_context(|| format!("{key} is invalid"))?
        .parse()
        .with_context(|| format!("{key} could not be parsed"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} could not be parsed")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_falls_back_when_unset() {
        let value: u64 = optional("GEARLOOP_TEST_UNSET_LIMIT", 10).unwrap();
        assert_eq!(value, 10);
    }

    #[test]
    fn optional_rejects_garbage() {
        unsafe {
            env::set_var("GEARLOOP_TEST_BAD_TIMEOUT", "soon");
        }
        let result: Result<u64> = optional("GEARLOOP_TEST_BAD_TIMEOUT", 30);
        assert!(result.is_err());
    }

    #[test]
    fn required_reports_missing_key() {
        let err = required::<u16>("GEARLOOP_TEST_MISSING_PORT").unwrap_err();
        assert!(err.to_string().contains("GEARLOOP_TEST_MISSING_PORT"));
    }
}
