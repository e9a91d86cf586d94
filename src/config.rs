//! Configuration
//! 環境変数からの設定読み込み

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rest,
    Graphql,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "graphql" | "gql" => Ok(Self::Graphql),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str("rest"),
            Self::Graphql => f.write_str("graphql"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the pricing server, e.g. `http://127.0.0.1:8000`.
    pub backend_url: String,
    pub backend: BackendKind,
    pub listen_addr: String,
    pub timeout: Duration,
    pub app_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            backend: BackendKind::Rest,
            listen_addr: "0.0.0.0:3000".to_string(),
            timeout: Duration::from_secs(10),
            app_title: "Cek Harga".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `PLU_BACKEND_URL`, `PLU_BACKEND`,
    /// `PLU_LISTEN_ADDR`, `PLU_TIMEOUT_SECS` and `APP_TITLE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = var("PLU_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(kind) = var("PLU_BACKEND") {
            config.backend = kind.parse()?;
        }
        if let Some(addr) = var("PLU_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(secs) = var("PLU_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PLU_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(title) = var("APP_TITLE") {
            config.app_title = title;
        }

        Ok(config)
    }
}
