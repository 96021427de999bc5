//! Command-line configuration and server role.
//!
//! Flags recognized:
//!
//! * `--port <n>` - TCP listen port (default 6379)
//! * `--replicaof "<host> <port>"` - run as a replica of the given master
//! * `--dir <path>` - data directory, surfaced through `CONFIG GET`
//! * `--dbfilename <name>` - database file name, surfaced through `CONFIG GET`
//!
//! Invalid values are reported through [`CliError`] so the binary can exit
//! non-zero before binding a socket.

use regex::Regex;
use thiserror::Error;

/// Errors produced while parsing command-line arguments.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CliError {
    #[error("unknown command line flag '{0}'")]
    UnknownFlag(String),
    #[error("flag '{0}' expects a value")]
    MissingFlagValue(String),
    #[error("invalid port flag value")]
    InvalidPortFlagValue,
    #[error("invalid master address")]
    InvalidMasterAddress,
    #[error("invalid master port")]
    InvalidMasterPort,
}

/// The role a server instance runs in.
///
/// A master accepts writes and streams them to attached replicas; a replica
/// applies the master's command stream and rejects writes from ordinary
/// clients.
#[derive(Debug, PartialEq, Clone)]
pub enum Role {
    Master,
    Replica { host: String, port: u16 },
}

impl Role {
    /// Role name as reported by `INFO replication` ("slave" keeps the wire
    /// vocabulary clients expect).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Replica { .. } => "slave",
        }
    }
}

/// Parsed server configuration.
#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    pub port: u16,
    pub role: Role,
    pub dir: Option<String>,
    pub dbfilename: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 6379,
            role: Role::Master,
            dir: None,
            dbfilename: None,
        }
    }
}

impl Config {
    /// Parses a configuration from command-line arguments.
    ///
    /// The first argument (the binary name) is skipped, matching
    /// `std::env::args()`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // A replica of a master on the conventional port:
    /// let config = Config::from_args([
    ///     "cinder".to_string(),
    ///     "--port".to_string(),
    ///     "6380".to_string(),
    ///     "--replicaof".to_string(),
    ///     "127.0.0.1 6379".to_string(),
    /// ])?;
    /// ```
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, CliError> {
        let mut iter = args.into_iter().skip(1);
        let mut config = Config::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.port = validate_port(&value, CliError::InvalidPortFlagValue)?;
                }
                "--replicaof" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    let (host, port) = validate_master_address(&value)?;
                    config.role = Role::Replica { host, port };
                }
                "--dir" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.dir = Some(value);
                }
                "--dbfilename" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.dbfilename = Some(value);
                }
                _ => return Err(CliError::UnknownFlag(arg)),
            }
        }

        Ok(config)
    }

    pub fn is_replica(&self) -> bool {
        matches!(self.role, Role::Replica { .. })
    }
}

fn validate_port(port: &str, error: CliError) -> Result<u16, CliError> {
    let port_number = port.parse::<u16>().map_err(|_| error.clone())?;

    if port_number == 0 {
        return Err(error);
    }

    Ok(port_number)
}

/// Validates a `"<host> <port>"` master address.
///
/// Hosts may be IPv4 addresses (each octet checked) or hostnames; anything
/// else is rejected rather than deferred to a connect-time failure.
fn validate_master_address(master_address: &str) -> Result<(String, u16), CliError> {
    let ipv4_regex = Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$")
        .map_err(|_| CliError::InvalidMasterAddress)?;
    let hostname_regex =
        Regex::new(r"^[a-zA-Z0-9\-\.]+$").map_err(|_| CliError::InvalidMasterAddress)?;

    let parts = master_address.split_whitespace().collect::<Vec<&str>>();

    if parts.len() != 2 {
        return Err(CliError::InvalidMasterAddress);
    }

    let host = parts[0];

    let valid_host = if let Some(caps) = ipv4_regex.captures(host) {
        caps.iter().skip(1).all(|octet| {
            octet
                .map(|m| m.as_str().parse::<u16>().map(|v| v <= 255).unwrap_or(false))
                .unwrap_or(false)
        })
    } else {
        hostname_regex.is_match(host)
    };

    if !valid_host {
        return Err(CliError::InvalidMasterAddress);
    }

    let port = validate_port(parts[1], CliError::InvalidMasterPort)?;

    Ok((host.to_string(), port))
}
