//! Daemon configuration from environment variables

use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "~/.jobledger/records.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;
const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
const DEFAULT_RATE_LIMIT_RATE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// `None` when the primary store is switched off (empty `JOBLEDGER_DB_PATH`)
    pub db_path: Option<PathBuf>,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
    pub log_format: LogFormat,
    /// Daily-rolled log files are written here in addition to stdout
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("JOBLEDGER_DB_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(expand(&path)),
            None => Some(expand(DEFAULT_DB_PATH)),
        };

        let rpc_port = match lookup("JOBLEDGER_RPC_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("Invalid JOBLEDGER_RPC_PORT: {}", port))?,
            None => DEFAULT_RPC_PORT,
        };

        let rate_limit_burst =
            parse_or("JOBLEDGER_RATE_LIMIT_BURST", &lookup, DEFAULT_RATE_LIMIT_BURST)?;
        let rate_limit_rate =
            parse_or("JOBLEDGER_RATE_LIMIT_RATE", &lookup, DEFAULT_RATE_LIMIT_RATE)?;

        let log_format = match lookup("JOBLEDGER_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            db_path,
            rpc_host: lookup("JOBLEDGER_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port,
            rate_limit_burst,
            rate_limit_rate,
            log_format,
            log_dir: lookup("JOBLEDGER_LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(|dir| expand(&dir)),
        })
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn parse_or<F>(key: &str, lookup: &F, default: u32) -> Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, value)),
        None => Ok(default),
    }
}
