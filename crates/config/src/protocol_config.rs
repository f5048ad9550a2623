// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{
    find_in_parent, resolve_config_path, ConfigLocation, DEFAULT_CONFIG_NAME,
};
use crate::yaml::load_yaml_with_env;
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// BFV parameters used by the local encryption/decryption collaborators
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BfvConfig {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl Default for BfvConfig {
    fn default() -> Self {
        Self {
            degree: 2048,
            plaintext_modulus: 1032193,
            moduli: vec![0x3FFFFFFF000001],
        }
    }
}

/// Settings for the local decryption oracle
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Hex encoded secp256k1 key the oracle signs results with. Generated when absent.
    pub private_key: Option<String>,
}

/// The config used throughout the protocol node
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Name used in logs and telemetry
    pub name: String,
    /// Address of this protocol instance. Binds commitments and routes oracle callbacks. The zero
    /// address means unset.
    pub instance: Address,
    /// Initial cooldown window applied to submissions and decryption requests
    pub cooldown_secs: u64,
    /// Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    pub otel: Option<String>,
    pub oracle: OracleConfig,
    pub bfv: BfvConfig,
    /// The file this configuration was read from. Set by the loader.
    pub config_file: Option<PathBuf>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            name: "veil".to_string(),
            instance: Address::ZERO,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            otel: None,
            oracle: OracleConfig::default(),
            bfv: BfvConfig::default(),
            config_file: None,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("`name` must not be empty");
        }
        if !self.bfv.degree.is_power_of_two() {
            bail!("bfv.degree must be a power of two, got {}", self.bfv.degree);
        }
        if self.bfv.moduli.is_empty() {
            bail!("bfv.moduli must contain at least one modulus");
        }
        if self.bfv.plaintext_modulus < 2 {
            bail!("bfv.plaintext_modulus must be at least 2");
        }
        if !self.has_instance() {
            warn!("`instance` is not set, commitments are bound to the zero address");
        }
        Ok(())
    }

    pub fn has_instance(&self) -> bool {
        self.instance != Address::ZERO
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    otel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<PathBuf>,
}

/// Load the config at `config_file`, or the one found upward from the working directory, or
/// fall back to defaults when none exists.
pub fn load_config(
    config_file: Option<&Path>,
    name: Option<String>,
    otel: Option<String>,
) -> Result<ProtocolConfig> {
    let location = resolve_config_path(
        find_in_parent,
        &env::current_dir()?,
        &OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        config_file,
    );
    load_config_from(location, name, otel)
}

pub fn load_config_from(
    location: ConfigLocation,
    name: Option<String>,
    otel: Option<String>,
) -> Result<ProtocolConfig> {
    let (loaded_yaml, found) = match &location {
        ConfigLocation::Explicit(path) => (
            load_yaml_with_env(path).context("Configuration file not found")?,
            Some(path.clone()),
        ),
        ConfigLocation::Discovered(path) => (load_yaml_with_env(path)?, Some(path.clone())),
        ConfigLocation::Default(path) if path.exists() => {
            (load_yaml_with_env(path)?, Some(path.clone()))
        }
        ConfigLocation::Default(path) => {
            debug!(path = ?path, "No configuration file found, using defaults");
            (String::new(), None)
        }
    };

    let config: ProtocolConfig = Figment::from(Serialized::defaults(ProtocolConfig::default()))
        .merge(Yaml::string(&loaded_yaml))
        .merge(Serialized::defaults(CliOverrides {
            name,
            otel,
            config_file: found,
        }))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("veil"))
            .unwrap_or_else(|| PathBuf::from(".veil"))
    }
}
