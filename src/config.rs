// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into
//! [`Settings`] and passed down explicitly.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BANK_ID` | Bank this server acts for | `bank-001` |
//! | `BANK_NAME` | Display name of the bank | `Simulated Bank` |
//! | `JWT_SECRET` | HS256 secret shared with the auth service | Required unless `SEED_DEMO_DATA` is set |
//! | `JWT_ISSUER` | Expected JWT issuer claim | `banking-simulation` |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | `api.banking-simulation.com` |
//! | `STORAGE_BACKEND` | `memory` or `redb` | `memory` |
//! | `DATA_DIR` | Directory of the redb database file | `./data` |
//! | `STORAGE_TIMEOUT_MS` | Upper bound for a single storage call | `5000` |
//! | `AUTHORIZATION_BASE_URL` | Base of the customer authorization page | `http://localhost:8080/authorize` |
//! | `SEED_DEMO_DATA` | Seed demo bank, customers and accounts (`1`/`true`) | off |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const BANK_ID_ENV: &str = "BANK_ID";
pub const BANK_NAME_ENV: &str = "BANK_NAME";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const STORAGE_TIMEOUT_MS_ENV: &str = "STORAGE_TIMEOUT_MS";
pub const AUTHORIZATION_BASE_URL_ENV: &str = "AUTHORIZATION_BASE_URL";
pub const SEED_DEMO_DATA_ENV: &str = "SEED_DEMO_DATA";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Secret used when demo data is seeded and no `JWT_SECRET` is given.
pub const DEMO_JWT_SECRET: &str = "banking-simulation-demo-secret";

/// File name of the redb database inside `DATA_DIR`.
pub const REDB_FILE_NAME: &str = "consents.redb";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub bank_id: String,
    pub bank_name: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub storage_backend: StorageBackend,
    pub data_dir: PathBuf,
    pub storage_timeout: Duration,
    pub authorization_base_url: Url,
    pub seed_demo_data: bool,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or_default = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let port = match var(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let seed_demo_data = match var(SEED_DEMO_DATA_ENV) {
            Some(raw) => parse_flag(SEED_DEMO_DATA_ENV, &raw)?,
            None => false,
        };

        let jwt_secret = match var(JWT_SECRET_ENV) {
            Some(secret) => secret,
            None if seed_demo_data => DEMO_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing(JWT_SECRET_ENV)),
        };

        let storage_backend = match var(STORAGE_BACKEND_ENV).as_deref() {
            None | Some("memory") => StorageBackend::Memory,
            Some("redb") => StorageBackend::Redb,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: STORAGE_BACKEND_ENV,
                    value: other.to_string(),
                    reason: "expected 'memory' or 'redb'".to_string(),
                })
            }
        };

        let storage_timeout = match var(STORAGE_TIMEOUT_MS_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: STORAGE_TIMEOUT_MS_ENV,
                        value: raw,
                        reason: "must be positive".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: STORAGE_TIMEOUT_MS_ENV,
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
            None => Duration::from_millis(5000),
        };

        let raw_url = or_default(AUTHORIZATION_BASE_URL_ENV, "http://localhost:8080/authorize");
        let authorization_base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: AUTHORIZATION_BASE_URL_ENV,
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: or_default(HOST_ENV, "0.0.0.0"),
            port,
            bank_id: or_default(BANK_ID_ENV, "bank-001"),
            bank_name: or_default(BANK_NAME_ENV, "Simulated Bank"),
            jwt_secret,
            jwt_issuer: or_default(JWT_ISSUER_ENV, "banking-simulation"),
            jwt_audience: or_default(JWT_AUDIENCE_ENV, "api.banking-simulation.com"),
            storage_backend,
            data_dir: PathBuf::from(or_default(DATA_DIR_ENV, "./data")),
            storage_timeout,
            authorization_base_url,
            seed_demo_data,
            log_format,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: HOST_ENV,
            value: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Location of the redb database file.
    pub fn redb_path(&self) -> PathBuf {
        self.data_dir.join(REDB_FILE_NAME)
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
