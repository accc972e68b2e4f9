//! Configuration of the relayer server.

use aa_chain_eip155::chain::{ChecksummedAddress, decimal_u256};
use aa_types::chain::ChainId;
use aa_types::config::LiteralOrEnv;
use alloy_primitives::{Address, U256};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// CLI arguments for the relayer server.
#[derive(Parser, Debug)]
#[command(name = "aa-relayer")]
#[command(about = "Smart account relayer HTTP server")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// `port` and `host` fall back to the `PORT` and `HOST` environment variables, then to
/// hardcoded defaults. Addresses may reference environment variables (`"$DEPLOYER"`).
///
/// ```json
/// {
///   "chain": "eip155:100009",
///   "deployer": "$DEPLOYER_ADDRESS",
///   "genesis": [{ "address": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "balance": "1000" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    chain: ChainId,
    deployer: LiteralOrEnv<ChecksummedAddress>,
    #[serde(default)]
    relayer: Option<LiteralOrEnv<ChecksummedAddress>>,
    #[serde(default)]
    genesis: Vec<GenesisAllocation>,
}

/// Native balance credited before the factory is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisAllocation {
    pub address: ChecksummedAddress,
    #[serde(with = "decimal_u256")]
    pub balance: U256,
}

pub mod config_defaults {
    use std::env;
    use std::net::{IpAddr, Ipv4Addr};

    pub const DEFAULT_PORT: u16 = 8080;

    /// Returns the default port value with fallback: $PORT env var -> 8080
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0"
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    /// CAIP-2 identifier of the chain, e.g. `eip155:100009`.
    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// Deploys the logic contracts and becomes the factory admin.
    pub fn deployer(&self) -> Address {
        self.deployer.inner().0
    }

    /// Sender of relayed transactions; the deployer unless set.
    pub fn relayer(&self) -> Address {
        self.relayer
            .as_ref()
            .map(|relayer| relayer.inner().0)
            .unwrap_or_else(|| self.deployer())
    }

    pub fn genesis(&self) -> &[GenesisAllocation] {
        &self.genesis
    }

    /// Load configuration from CLI arguments and JSON file.
    ///
    /// The config file path is taken from `--config <path>`, the `CONFIG` environment
    /// variable, or `./config.json`, in that order.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config, e))?;
        Self::load_from_path(config_path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
