//! Per-network block size parameters and activation resolution

use crate::config::PolicyConfig;
use crate::constants::*;
use crate::error::{PolicyError, Result};
use crate::types::Natural;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Testnet,
    Regtest,
    /// Scaling test network
    Stn,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Main, Network::Testnet, Network::Regtest, Network::Stn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Testnet => "test",
            Network::Regtest => "regtest",
            Network::Stn => "stn",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            "stn" => Ok(Network::Stn),
            other => Err(PolicyError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Block size limits of one network and the times they switch over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameterSet {
    pub max_block_size_before_genesis: u64,
    pub max_block_size_after_genesis: u64,
    pub max_generated_block_size_before: u64,
    pub max_generated_block_size_after: u64,
    /// Median time past at which the block size limit and Genesis switch
    pub upgrade_activation_time: u64,
    /// Median time past at which the generated block size switches
    pub generated_size_activation_time: u64,
}

impl NetworkParameterSet {
    pub fn defaults_for(network: Network) -> Self {
        let (block_before, block_after, generated_before, generated_after, activation) = match network {
            Network::Main => (
                MAIN_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS,
                MAIN_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS,
                MAIN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE,
                MAIN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER,
                MAIN_NEW_BLOCKSIZE_ACTIVATION_TIME,
            ),
            Network::Testnet => (
                TESTNET_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS,
                TESTNET_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS,
                TESTNET_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE,
                TESTNET_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER,
                TESTNET_NEW_BLOCKSIZE_ACTIVATION_TIME,
            ),
            Network::Regtest => (
                REGTEST_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS,
                REGTEST_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS,
                REGTEST_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE,
                REGTEST_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER,
                REGTEST_NEW_BLOCKSIZE_ACTIVATION_TIME,
            ),
            Network::Stn => (
                STN_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS,
                STN_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS,
                STN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE,
                STN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER,
                STN_NEW_BLOCKSIZE_ACTIVATION_TIME,
            ),
        };
        Self {
            max_block_size_before_genesis: block_before,
            max_block_size_after_genesis: block_after,
            max_generated_block_size_before: generated_before,
            max_generated_block_size_after: generated_after,
            upgrade_activation_time: activation,
            generated_size_activation_time: activation,
        }
    }

    /// Check that the generated size never exceeds the block size at any time,
    /// including the window between two distinct activation times.
    pub fn validate(&self, network: Network) -> Result<()> {
        let mut pairs = vec![
            (self.max_generated_block_size_before, self.max_block_size_before_genesis),
            (self.max_generated_block_size_after, self.max_block_size_after_genesis),
        ];
        if self.generated_size_activation_time < self.upgrade_activation_time {
            pairs.push((self.max_generated_block_size_after, self.max_block_size_before_genesis));
        } else if self.generated_size_activation_time > self.upgrade_activation_time {
            pairs.push((self.max_generated_block_size_before, self.max_block_size_after_genesis));
        }

        for (generated, block) in pairs {
            if generated > block {
                return Err(PolicyError::InconsistentParameters(format!(
                    "{}: max generated block size {} exceeds max block size {}",
                    network, generated, block
                )));
            }
        }
        Ok(())
    }

    /// ResolveRuleSet: 𝒫 × ℕ → RuleSet
    ///
    /// Before an activation time the "before" value applies, from it on the
    /// "after" value. Time only moves limits forward.
    pub fn resolve(&self, median_time_past: u64) -> RuleSet {
        let genesis_enabled = median_time_past >= self.upgrade_activation_time;
        let max_block_size = if genesis_enabled {
            self.max_block_size_after_genesis
        } else {
            self.max_block_size_before_genesis
        };
        let max_generated_block_size = if median_time_past >= self.generated_size_activation_time {
            self.max_generated_block_size_after
        } else {
            self.max_generated_block_size_before
        };
        RuleSet { max_block_size, max_generated_block_size, genesis_enabled }
    }
}

/// Limits in effect at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub max_block_size: u64,
    pub max_generated_block_size: u64,
    pub genesis_enabled: bool,
}

/// Parameter sets for every network the node knows, fixed after construction
#[derive(Debug, Clone)]
pub struct NetworkParameterTable {
    entries: HashMap<Network, NetworkParameterSet>,
}

impl Default for NetworkParameterTable {
    fn default() -> Self {
        let entries = Network::ALL
            .iter()
            .map(|&network| (network, NetworkParameterSet::defaults_for(network)))
            .collect();
        Self { entries }
    }
}

impl NetworkParameterTable {
    pub fn new(entries: impl IntoIterator<Item = (Network, NetworkParameterSet)>) -> Result<Self> {
        let entries: HashMap<_, _> = entries.into_iter().collect();
        for (network, params) in &entries {
            params.validate(*network)?;
        }
        Ok(Self { entries })
    }

    pub fn get(&self, network: Network) -> Result<&NetworkParameterSet> {
        self.entries
            .get(&network)
            .ok_or_else(|| PolicyError::UnknownNetwork(network.to_string()))
    }

    pub fn resolve(&self, network: Network, median_time_past: u64) -> Result<RuleSet> {
        Ok(self.get(network)?.resolve(median_time_past))
    }

    /// Resolve, then apply the configured block size overrides
    pub fn resolve_with_overrides(
        &self,
        network: Network,
        median_time_past: u64,
        config: &PolicyConfig,
    ) -> Result<RuleSet> {
        let mut rules = self.resolve(network, median_time_past)?;
        if let Some(size) = config.max_block_size_override {
            rules.max_block_size = size;
        }
        if let Some(size) = config.max_generated_block_size_override {
            rules.max_generated_block_size = size;
        }
        if rules.max_generated_block_size > rules.max_block_size {
            return Err(PolicyError::InconsistentParameters(format!(
                "{}: max generated block size {} exceeds max block size {}",
                network, rules.max_generated_block_size, rules.max_block_size
            )));
        }
        Ok(rules)
    }
}

/// Resolve against the built-in defaults
pub fn resolve_rule_set(network: Network, median_time_past: u64) -> RuleSet {
    NetworkParameterSet::defaults_for(network).resolve(median_time_past)
}

/// Answers whether the Genesis upgrade is active at a block height.
///
/// Supplied by the consensus layer that tracks activation; the policy checks
/// only ask.
pub trait UpgradeActivation {
    fn is_genesis_enabled(&self, height: Natural) -> bool;
}

/// Activation at a fixed height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisActivation {
    pub activation_height: Natural,
}

impl GenesisActivation {
    pub fn at_height(activation_height: Natural) -> Self {
        Self { activation_height }
    }
}

impl UpgradeActivation for GenesisActivation {
    fn is_genesis_enabled(&self, height: Natural) -> bool {
        height >= self.activation_height
    }
}
