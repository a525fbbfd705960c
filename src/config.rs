use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,

    pub claude_api_key: String,
    pub claude_model: String,
    pub claude_api_url: String,
    pub prompt_timeout_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} is invalid ('{raw}'): {e}"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend: StoreBackend = var_or("STORE_BACKEND", "postgres").parse()?;
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        Ok(Self {
            store_backend,
            database_url,
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "8080")?,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            claude_api_key: var_or("CLAUDE_API_KEY", ""),
            claude_model: var_or("CLAUDE_MODEL", "claude-sonnet-4-20250514"),
            claude_api_url: var_or("CLAUDE_API_URL", "https://api.anthropic.com/v1/messages"),
            prompt_timeout_secs: parse_var("PROMPT_TIMEOUT_SECS", "10")?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret".into(),
            claude_api_key: String::new(),
            claude_model: "claude-sonnet-4-20250514".into(),
            claude_api_url: "http://127.0.0.1:9/v1/messages".into(),
            prompt_timeout_secs: 10,
        }
    }
}
