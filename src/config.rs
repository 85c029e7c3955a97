//! Connection and keyspace settings.
//!
//! `StoreConfig` deserializes from any serde format with every field
//! optional. A connection URL, when present, wins over the discrete fields:
//!
//! ```ignore
//! let config: StoreConfig = serde_json::from_str(r#"{
//!     "url": "redis://:secret@cache.internal:6380/2",
//!     "prefix": "billing_"
//! }"#)?;
//! let config = config.resolve()?;
//! assert_eq!(config.port, 6380);
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::repository::DEFAULT_SCAN_COUNT;

/// Where a store client should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub socket_path: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Logical database index selected after connecting.
    pub database: u32,
    pub tls: bool,
    /// Connection string; overrides host, port, credentials and database.
    pub url: Option<String>,
    /// Prepended to every collection name.
    pub prefix: String,
    /// Keyspace visited per scan request.
    pub scan_count: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            socket_path: None,
            username: None,
            password: None,
            database: 0,
            tls: false,
            url: None,
            prefix: String::new(),
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl StoreConfig {
    /// Build a config from a connection URL alone.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
        .resolve()
    }

    /// Apply the connection URL (if any) over the discrete fields.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        let Some(url) = self.url.clone() else {
            return Ok(self);
        };

        let parsed = ConnectionUrl::parse(&url)?;
        self.host = parsed.host;
        if let Some(port) = parsed.port {
            self.port = port;
        }
        if parsed.username.is_some() {
            self.username = parsed.username;
        }
        if parsed.password.is_some() {
            self.password = parsed.password;
        }
        if let Some(database) = parsed.database {
            self.database = database;
        }
        self.tls = parsed.tls;
        Ok(self)
    }

    pub fn address(&self) -> Address {
        match &self.socket_path {
            Some(path) => Address::Unix(path.clone()),
            None => Address::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

struct ConnectionUrl {
    host: String,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<u32>,
    tls: bool,
}

impl ConnectionUrl {
    /// `redis[s]://[user][:password@]host[:port][/database]`
    fn parse(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme"))?;
        let tls = match scheme {
            "redis" => false,
            "rediss" => true,
            _ => return Err(invalid("unsupported scheme")),
        };

        let rest = rest.split_once('?').map_or(rest, |(before, _)| before);
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        let (username, password) = match userinfo {
            Some(info) => {
                let (user, pass) = match info.split_once(':') {
                    Some((user, pass)) => (user, Some(pass)),
                    None => (info, None),
                };
                let user = Some(percent_decode(user).ok_or_else(|| invalid("bad escape"))?)
                    .filter(|u| !u.is_empty());
                let pass = match pass {
                    Some(pass) => Some(percent_decode(pass).ok_or_else(|| invalid("bad escape"))?),
                    None => None,
                };
                (user, pass)
            }
            None => (None, None),
        };

        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 host"))?;
            (host, after.strip_prefix(':'))
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (host_port, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        let port = match port {
            Some(port) => Some(port.parse::<u16>().map_err(|_| invalid("invalid port"))?),
            None => None,
        };

        let database = match path.trim_matches('/') {
            "" => None,
            index => Some(
                index
                    .parse::<u32>()
                    .map_err(|_| invalid("invalid database index"))?,
            ),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            username,
            password,
            database,
            tls,
        })
    }
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
