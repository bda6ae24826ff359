use std::path::Path;
use std::sync::Arc;

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use log::info;
use serde::Deserialize;

use crate::chainparams::{ChainRegistry, DeploymentPos, Network, ParameterSet};
use crate::error::SettingsError;
use crate::primitives::Hash256;

const ENV_PREFIX: &str = "BLAZE";

/// Node-level settings that pick a network and adjust its parameters.
///
/// Layers, later ones winning: built-in defaults, an optional TOML file,
/// then `BLAZE_*` environment variables (`__` separates nested keys, so
/// `BLAZE_DEVNET__HIGH_SUBSIDY_BLOCKS` sets `devnet.high_subsidy_blocks`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: String,
    #[serde(default)]
    pub devnet_name: Option<String>,
    #[serde(default)]
    pub regtest: Option<RegtestSettings>,
    #[serde(default)]
    pub devnet: Option<DevnetSettings>,
    #[serde(default)]
    pub minimum_chain_work: Option<String>,
    #[serde(default)]
    pub assume_valid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegtestSettings {
    #[serde(default)]
    pub deployments: Vec<DeploymentOverride>,
    #[serde(default)]
    pub budget: Option<BudgetOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentOverride {
    pub name: String,
    pub start_time: i64,
    pub timeout: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetOverride {
    pub masternode_payments_start_block: i32,
    pub budget_payments_start_block: i32,
    pub superblock_start_block: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevnetSettings {
    pub minimum_difficulty_blocks: i32,
    pub high_subsidy_blocks: i32,
    pub high_subsidy_factor: i32,
}

impl Settings {
    /// Reads defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Reads defaults and an in-memory TOML document, ignoring the environment.
    pub fn from_toml(source: &str) -> Result<Self, SettingsError> {
        let settings = Self::defaults()?
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, SettingsError> {
        Ok(Config::builder().set_default("network", Network::Main.as_str())?)
    }

    /// Selects the configured network on `registry` and applies the overrides.
    /// Returns the resulting active profile.
    ///
    /// Every value is parsed before the registry is touched, so a bad setting
    /// leaves the registry as it was.
    pub fn apply(&self, registry: &mut ChainRegistry) -> Result<Arc<ParameterSet>, SettingsError> {
        let network: Network = self.network.parse()?;
        self.check_sections(network)?;
        let deployments = self
            .regtest
            .iter()
            .flat_map(|regtest| &regtest.deployments)
            .map(|deployment| -> Result<_, SettingsError> {
                Ok((deployment.name.parse::<DeploymentPos>()?, deployment))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let minimum_chain_work = parse_hash("minimum_chain_work", self.minimum_chain_work.as_deref())?;
        let assume_valid = parse_hash("assume_valid", self.assume_valid.as_deref())?;

        if let Some(name) = &self.devnet_name {
            registry.set_devnet_name(name.clone())?;
        }
        registry.select(&self.network)?;

        for (pos, deployment) in deployments {
            registry.update_regtest_bip9_parameters(pos, deployment.start_time, deployment.timeout);
        }
        if let Some(budget) = self.regtest.as_ref().and_then(|regtest| regtest.budget.as_ref()) {
            registry.update_regtest_budget_parameters(
                budget.masternode_payments_start_block,
                budget.budget_payments_start_block,
                budget.superblock_start_block,
            );
        }

        if let Some(devnet) = &self.devnet {
            registry.update_devnet_subsidy_and_diff_params(
                devnet.minimum_difficulty_blocks,
                devnet.high_subsidy_blocks,
                devnet.high_subsidy_factor,
            )?;
        }

        if minimum_chain_work.is_some() || assume_valid.is_some() {
            let current = &registry.active().consensus;
            let minimum_chain_work = minimum_chain_work.unwrap_or(current.minimum_chain_work);
            let assume_valid = assume_valid.unwrap_or(current.default_assume_valid);
            registry.update_chain_work_params(network, minimum_chain_work, assume_valid)?;
            info!("{}: minimum chain work {}, assume valid {}", network, minimum_chain_work, assume_valid);
        }

        Ok(Arc::clone(registry.active()))
    }

    fn check_sections(&self, network: Network) -> Result<(), SettingsError> {
        let sections = [
            ("regtest", self.regtest.is_some(), Network::Regtest),
            ("devnet", self.devnet.is_some(), Network::Devnet),
        ];
        for (section, present, expected) in sections {
            if present && network != expected {
                return Err(SettingsError::OverrideNetworkMismatch {
                    section,
                    expected: expected.as_str(),
                    selected: network.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_hash(field: &'static str, value: Option<&str>) -> Result<Option<Hash256>, SettingsError> {
    value
        .map(|hex| Hash256::from_hex(hex).map_err(|source| SettingsError::InvalidHash { field, source }))
        .transpose()
}
