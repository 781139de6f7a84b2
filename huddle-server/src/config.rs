//! Relay configuration, loaded from environment variables.

use huddle_core::utils::{DEFAULT_MAX_ROOM_ID_LEN, DEFAULT_ROOM_CAPACITY};
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";

/// Outbound frames buffered per connection before new ones are dropped.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen address (`HUDDLE_BIND_ADDR`, or `0.0.0.0:$PORT`, default `0.0.0.0:3001`).
    pub bind_address: SocketAddr,

    /// Maximum members per room (`HUDDLE_ROOM_CAPACITY`, default 10).
    pub room_capacity: usize,

    /// Outbound buffer per connection (`HUDDLE_CHANNEL_BUFFER`, default 64).
    pub channel_buffer: usize,

    /// Longest accepted room id in bytes (`HUDDLE_MAX_ROOM_ID_LEN`, default 128).
    pub max_room_id_len: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3001)),
            room_capacity: DEFAULT_ROOM_CAPACITY,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            max_room_id_len: DEFAULT_MAX_ROOM_ID_LEN,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match (vars.get("HUDDLE_BIND_ADDR"), vars.get("PORT")) {
            (Some(addr), _) => parse_var("HUDDLE_BIND_ADDR", addr)?,
            (None, Some(port)) => {
                let port: u16 = parse_var("PORT", port)?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => parse_var("HUDDLE_BIND_ADDR", DEFAULT_BIND_ADDRESS)?,
        };

        let room_capacity = positive_var(vars, "HUDDLE_ROOM_CAPACITY", DEFAULT_ROOM_CAPACITY)?;
        let channel_buffer = positive_var(vars, "HUDDLE_CHANNEL_BUFFER", DEFAULT_CHANNEL_BUFFER)?;
        let max_room_id_len =
            positive_var(vars, "HUDDLE_MAX_ROOM_ID_LEN", DEFAULT_MAX_ROOM_ID_LEN)?;

        Ok(Self {
            bind_address,
            room_capacity,
            channel_buffer,
            max_room_id_len,
        })
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

fn positive_var(
    vars: &HashMap<String, String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = vars.get(var) else {
        return Ok(default);
    };

    match parse_var::<usize>(var, raw)? {
        0 => Err(ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: "must be greater than zero".to_owned(),
        }),
        n => Ok(n),
    }
}
