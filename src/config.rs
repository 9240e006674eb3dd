// src/config.rs
use anyhow::Result;
use config::{Config as Loader, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    // HTTP server
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    // Deriv
    #[serde(default = "default_deriv_ws_url")]
    pub deriv_ws_url: String,
    #[serde(default = "default_deriv_app_id")]
    pub deriv_app_id: String,
    /// Used when a trade request carries no token of its own.
    #[serde(default)]
    pub deriv_api_token: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,

    // Contract parameters
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_contract_basis")]
    pub contract_basis: String,
    #[serde(default = "default_contract_duration")]
    pub contract_duration: u32,
    #[serde(default = "default_contract_duration_unit")]
    pub contract_duration_unit: String,

    // Access
    #[serde(default)]
    pub serial_keys: Vec<String>,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    // Analysis
    #[serde(default = "default_candle_count")]
    pub candle_count: u32,
    #[serde(default = "default_history_symbol")]
    pub history_symbol: String,
    #[serde(default = "default_history_count")]
    pub history_count: u32,
    #[serde(default = "default_analyze_command")]
    pub analyze_command: Vec<String>,
    #[serde(default = "default_analyze_timeout_secs")]
    pub analyze_timeout_secs: u64,

    // SQLite
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_static_dir() -> String { "frontend".into() }
fn default_deriv_ws_url() -> String { "wss://ws.derivws.com/websockets/v3".into() }
fn default_deriv_app_id() -> String { "1089".into() }
fn default_connect_timeout_secs() -> u64 { 10 }
fn default_response_timeout_secs() -> u64 { 30 }
fn default_currency() -> String { "USD".into() }
fn default_contract_basis() -> String { "payout".into() }
fn default_contract_duration() -> u32 { 1 }
fn default_contract_duration_unit() -> String { "m".into() }
fn default_rate_limit_window_secs() -> u64 { 15 * 60 }
fn default_rate_limit_max_requests() -> u32 { 100 }
fn default_candle_count() -> u32 { 1000 }
fn default_history_symbol() -> String { "R_50".into() }
fn default_history_count() -> u32 { 100 }
fn default_analyze_command() -> Vec<String> { vec!["python".into(), "realtime.py".into()] }
fn default_analyze_timeout_secs() -> u64 { 120 }
fn default_sqlite_path() -> String { "data/trades.db".into() }
fn default_broadcast_capacity() -> usize { 100 }

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            deriv_ws_url: default_deriv_ws_url(),
            deriv_app_id: default_deriv_app_id(),
            deriv_api_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            response_timeout_secs: default_response_timeout_secs(),
            currency: default_currency(),
            contract_basis: default_contract_basis(),
            contract_duration: default_contract_duration(),
            contract_duration_unit: default_contract_duration_unit(),
            serial_keys: Vec::new(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            candle_count: default_candle_count(),
            history_symbol: default_history_symbol(),
            history_count: default_history_count(),
            analyze_command: default_analyze_command(),
            analyze_timeout_secs: default_analyze_timeout_secs(),
            sqlite_path: default_sqlite_path(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// `RELAY_PORT=8080`, `RELAY_SERIAL_KEYS=key1,key2`; nested keys use `__`.
fn environment() -> Environment {
    Environment::with_prefix("RELAY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("serial_keys")
        .with_list_parse_key("analyze_command")
}

impl Config {
    pub fn load() -> Result<Self> {
        let file = env::var("RELAY_CONFIG").unwrap_or_else(|_| "Config.toml".into());
        let loader = Loader::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(environment())
            .build()?;
        Ok(loader.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn is_valid_serial_key(&self, key: &str) -> bool {
        self.serial_keys.iter().any(|k| k == key)
    }
}
