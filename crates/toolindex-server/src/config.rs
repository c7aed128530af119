use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Config {
    pub jwt_secret: String,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub auto_approve: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let jwt_secret = load_or("TOOLINDEX_JWT_SECRET", "dev-secret-change-me")?;
        if jwt_secret == "dev-secret-change-me" {
            warn!("TOOLINDEX_JWT_SECRET is the development default, do not use it in production");
        }

        Ok(Self {
            jwt_secret,
            db_path: load_or("TOOLINDEX_DB_PATH", "toolindex.db")?,
            host: load_or("TOOLINDEX_HOST", "0.0.0.0")?,
            port: load_or("TOOLINDEX_PORT", "3000")?,
            auto_approve: load_or("TOOLINDEX_AUTO_APPROVE", "true")?,
        })
    }
}

fn load_or<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}
