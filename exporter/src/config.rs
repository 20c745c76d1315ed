//! Exporter configuration.
//!
//! Every setting can be given as a command-line flag or in an optional TOML
//! file (`--config`), using the flag names as keys:
//!
//! ```toml
//! listen-address = ":9500"
//! local-tendermint-rpc = "http://localhost:26657"
//! binary-path = "/usr/local/bin/gaiad"
//! github-org = "cosmos"
//! github-repo = "gaia"
//! ```
//!
//! An explicitly passed flag wins over the file, and the file wins over the
//! built-in default. Empty strings count as unset.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use serde::Deserialize;
use tracing::Level;

use scraper::config::{DEFAULT_BINARY_ARGS, DEFAULT_GITHUB_API_URL, DEFAULT_LOCAL_RPC};
use scraper::{BinaryConfig, GithubConfig, ScrapeConfig};

pub const DEFAULT_LISTEN_ADDRESS: &str = ":9500";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Served alongside the metrics route; the metrics path may not shadow it.
pub const HEALTH_PATH: &str = "/health";

/// Command-line flags.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tendermint-exporter", version, about = "Scrape the data on Tendermint node.")]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The address this exporter would listen on [default: :9500]
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Path the metrics are served on [default: /metrics]
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Logging level (trace, debug, info, warn, error) [default: info]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    pub json: bool,

    /// Local Tendermint RPC address [default: http://localhost:26657]
    #[arg(long)]
    pub local_tendermint_rpc: Option<String>,

    /// Remote Tendermint RPC address
    #[arg(long)]
    pub remote_tendermint_rpc: Option<String>,

    /// Binary path to get version from
    #[arg(long)]
    pub binary_path: Option<PathBuf>,

    /// Arguments for binary to get version [default: "version --long --output json"]
    #[arg(long)]
    pub binary_args: Option<String>,

    /// Github organization name
    #[arg(long)]
    pub github_org: Option<String>,

    /// Github repository name
    #[arg(long)]
    pub github_repo: Option<String>,

    /// Github personal access token
    #[arg(long)]
    pub github_token: Option<String>,

    /// Github API base URL [default: https://api.github.com]
    #[arg(long)]
    pub github_api_url: Option<String>,
}

/// Contents of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub listen_address: Option<String>,
    pub metrics_path: Option<String>,
    pub log_level: Option<String>,
    pub json: Option<bool>,
    pub local_tendermint_rpc: Option<String>,
    pub remote_tendermint_rpc: Option<String>,
    pub binary_path: Option<PathBuf>,
    pub binary_args: Option<String>,
    pub github_org: Option<String>,
    pub github_repo: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid listen address {0:?}")]
    InvalidListenAddress(String),
    #[error("invalid log level {0:?}, expected one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
    #[error(
        "invalid metrics path {0:?}, must start with '/', differ from /health and hold no route captures"
    )]
    InvalidMetricsPath(String),
    #[error("local Tendermint RPC address must not be empty")]
    MissingLocalRpc,
}

/// Validated configuration the exporter runs with.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    pub listen_addr: SocketAddr,
    pub metrics_path: String,
    pub log_level: Level,
    pub json_logs: bool,
    pub scrape: ScrapeConfig,
}

impl ExporterConfig {
    /// Reads the config file named by `--config` (if any) and merges it
    /// with the flags.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merges flags over file values over defaults, then validates.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let listen_address = pick(cli.listen_address, file.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
        let listen_addr = parse_listen_address(&listen_address)?;

        let metrics_path = pick(cli.metrics_path, file.metrics_path)
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
        if !is_valid_metrics_path(&metrics_path) {
            return Err(ConfigError::InvalidMetricsPath(metrics_path));
        }

        let log_level = pick(cli.log_level, file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let log_level =
            Level::from_str(log_level.trim()).map_err(|_| ConfigError::InvalidLogLevel(log_level))?;

        let json_logs = cli.json || file.json.unwrap_or(false);

        let local_rpc = match (cli.local_tendermint_rpc, file.local_tendermint_rpc) {
            // An explicitly empty address is a mistake, not "use the default".
            (Some(flag), _) => flag,
            (None, Some(from_file)) => from_file,
            (None, None) => DEFAULT_LOCAL_RPC.to_string(),
        };
        if local_rpc.trim().is_empty() {
            return Err(ConfigError::MissingLocalRpc);
        }

        let remote_rpc = pick(cli.remote_tendermint_rpc, file.remote_tendermint_rpc);

        let binary = cli
            .binary_path
            .filter(|p| !p.as_os_str().is_empty())
            .or(file.binary_path.filter(|p| !p.as_os_str().is_empty()))
            .map(|path| {
                let args = cli
                    .binary_args
                    .or(file.binary_args)
                    .unwrap_or_else(|| DEFAULT_BINARY_ARGS.to_string());
                BinaryConfig::from_arg_string(path, &args)
            });

        let org = pick(cli.github_org, file.github_org);
        let repo = pick(cli.github_repo, file.github_repo);
        let github = match (org, repo) {
            (Some(organization), Some(repository)) => Some(GithubConfig {
                api_url: pick(cli.github_api_url, file.github_api_url)
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                organization,
                repository,
                token: pick(cli.github_token, file.github_token),
            }),
            _ => None,
        };

        Ok(Self {
            listen_addr,
            metrics_path,
            log_level,
            json_logs,
            scrape: ScrapeConfig {
                local_rpc,
                remote_rpc,
                github,
                binary,
            },
        })
    }
}

/// First non-empty value of flag, then file.
fn pick(flag: Option<String>, file: Option<String>) -> Option<String> {
    non_empty(flag).or_else(|| non_empty(file))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a listen address, accepting the `:port` shorthand for all
/// interfaces. Host names are resolved once, here.
fn parse_listen_address(raw: &str) -> Result<SocketAddr, ConfigError> {
    let candidate = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };
    candidate
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ConfigError::InvalidListenAddress(raw.to_string()))
}

/// A literal absolute path that the router accepts as-is.
///
/// Segments starting with `:` or `*` and braces are route syntax in axum,
/// which panics on the former and captures on the latter.
fn is_valid_metrics_path(path: &str) -> bool {
    path.starts_with('/')
        && path != HEALTH_PATH
        && !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}
