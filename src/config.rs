//! Policy configuration knobs
//!
//! Values arrive already loaded by the node's configuration layer. This module
//! only holds them, checks them for consistency and answers the
//! epoch-dependent questions the validators ask.

use crate::constants::*;
use crate::error::{PolicyError, Result};
use crate::fees::{FeeRate, FeeRates};
use crate::types::{Amount, Natural};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Overrides the network's max block size (`-excessiveblocksize`)
    pub max_block_size_override: Option<u64>,
    /// Overrides the network's max generated block size (`-blockmaxsize`)
    pub max_generated_block_size_override: Option<u64>,
    pub max_mempool_size_mb: u64,
    pub max_nonfinal_mempool_size_mb: u64,
    pub block_priority_percentage: u64,
    pub block_min_tx_fee: FeeRate,
    pub bytes_per_sigop: u64,
    pub incremental_relay_fee: FeeRate,
    pub dust_relay_fee: FeeRate,
    /// Post-Genesis transaction size limit; pre-Genesis is fixed
    pub max_tx_size_policy: u64,
    /// Post-Genesis sigop limit per transaction; pre-Genesis is fixed
    pub max_tx_sigops_count_policy: u64,
    /// Post-Genesis script size limit, applied to scriptSigs
    pub max_script_size_policy: u64,
    /// Post-Genesis bare multisig key limit; pre-Genesis is x-of-3
    pub max_pubkeys_per_multisig_policy: u64,
    pub accept_datacarrier: bool,
    /// Total null-data script bytes allowed per transaction
    pub data_carrier_size: u64,
    pub permit_bare_multisig: bool,
    /// Blocks on either side of Genesis activation treated as the graceful period
    pub genesis_graceful_period: u64,
    pub max_ops_per_script_policy: u64,
    /// Bytes of stack the interpreter may use per script after Genesis
    pub max_stack_memory_usage_policy: u64,
    /// Longest numeric operand, in bytes, after Genesis
    pub max_script_num_length_policy: u64,
    pub max_block_sigops_per_mb_policy: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_block_size_override: None,
            max_generated_block_size_override: None,
            max_mempool_size_mb: DEFAULT_MAX_MEMPOOL_SIZE,
            max_nonfinal_mempool_size_mb: DEFAULT_MAX_NONFINAL_MEMPOOL_SIZE,
            block_priority_percentage: DEFAULT_BLOCK_PRIORITY_PERCENTAGE,
            block_min_tx_fee: FeeRate::from_sat_per_kb(DEFAULT_BLOCK_MIN_TX_FEE),
            bytes_per_sigop: DEFAULT_BYTES_PER_SIGOP,
            incremental_relay_fee: FeeRate::from_sat_per_kb(MEMPOOL_FULL_FEE_INCREMENT),
            dust_relay_fee: FeeRate::from_sat_per_kb(DUST_RELAY_TX_FEE),
            max_tx_size_policy: DEFAULT_MAX_TX_SIZE_POLICY_AFTER_GENESIS,
            max_tx_sigops_count_policy: DEFAULT_TX_SIGOPS_COUNT_POLICY_AFTER_GENESIS,
            max_script_size_policy: DEFAULT_MAX_SCRIPT_SIZE_POLICY_AFTER_GENESIS,
            max_pubkeys_per_multisig_policy: DEFAULT_PUBKEYS_PER_MULTISIG_POLICY_AFTER_GENESIS,
            accept_datacarrier: true,
            data_carrier_size: DEFAULT_DATA_CARRIER_SIZE,
            permit_bare_multisig: true,
            genesis_graceful_period: DEFAULT_GENESIS_GRACEFUL_ACTIVATION_PERIOD,
            max_ops_per_script_policy: DEFAULT_OPS_PER_SCRIPT_POLICY_AFTER_GENESIS,
            max_stack_memory_usage_policy: DEFAULT_STACK_MEMORY_USAGE_POLICY_AFTER_GENESIS,
            max_script_num_length_policy: DEFAULT_SCRIPT_NUM_LENGTH_POLICY_AFTER_GENESIS,
            max_block_sigops_per_mb_policy: DEFAULT_MAX_BLOCK_SIGOPS_PER_MB_POLICY_AFTER_GENESIS,
        }
    }
}

impl PolicyConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: PolicyConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let result = self.check();
        if let Err(err) = &result {
            log::warn!("rejecting policy configuration: {}", err);
        }
        result
    }

    fn check(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(PolicyError::InvalidConfig(msg)) };

        if let Some(0) = self.max_block_size_override {
            return invalid("max block size override must be positive".to_string());
        }
        if let Some(0) = self.max_generated_block_size_override {
            return invalid("max generated block size override must be positive".to_string());
        }
        if let (Some(block), Some(generated)) =
            (self.max_block_size_override, self.max_generated_block_size_override)
        {
            if generated > block {
                return invalid(format!(
                    "max generated block size {} exceeds max block size {}",
                    generated, block
                ));
            }
        }
        if self.block_priority_percentage > 100 {
            return invalid(format!(
                "block priority percentage {} exceeds 100",
                self.block_priority_percentage
            ));
        }
        if self.max_tx_size_policy == 0 {
            return invalid("max tx size policy must be positive".to_string());
        }
        if self.max_script_size_policy == 0 {
            return invalid("max script size policy must be positive".to_string());
        }
        if self.max_pubkeys_per_multisig_policy == 0 {
            return invalid("max pubkeys per multisig policy must be positive".to_string());
        }
        if self.genesis_graceful_period > MAX_GENESIS_GRACEFUL_ACTIVATION_PERIOD {
            return invalid(format!(
                "genesis graceful period {} exceeds {}",
                self.genesis_graceful_period, MAX_GENESIS_GRACEFUL_ACTIVATION_PERIOD
            ));
        }
        for (name, value) in [
            ("max ops per script policy", self.max_ops_per_script_policy),
            ("max stack memory usage policy", self.max_stack_memory_usage_policy),
            ("max script num length policy", self.max_script_num_length_policy),
            ("max block sigops per MB policy", self.max_block_sigops_per_mb_policy),
        ] {
            if value == 0 {
                return invalid(format!("{} must be positive", name));
            }
        }
        for (name, rate) in [
            ("block min tx fee", self.block_min_tx_fee),
            ("incremental relay fee", self.incremental_relay_fee),
            ("dust relay fee", self.dust_relay_fee),
        ] {
            if !rate.per_kb().is_money_range() {
                return invalid(format!("{} {} is out of range", name, rate));
            }
        }
        Ok(())
    }

    /// Fee values to seed a [`FeeRatePolicy`](crate::fees::FeeRatePolicy) with
    pub fn fee_rates(&self) -> FeeRates {
        FeeRates {
            incremental_relay_fee: self.incremental_relay_fee,
            dust_relay_fee: self.dust_relay_fee,
            bytes_per_sigop: self.bytes_per_sigop,
        }
    }

    pub fn max_tx_size(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_tx_size_policy
        } else {
            MAX_TX_SIZE_POLICY_BEFORE_GENESIS
        }
    }

    pub fn max_tx_sigops_count(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_tx_sigops_count_policy
        } else {
            MAX_TX_SIGOPS_COUNT_POLICY_BEFORE_GENESIS
        }
    }

    pub fn max_script_sig_size(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_script_size_policy
        } else {
            MAX_STANDARD_SCRIPTSIG_SIZE_BEFORE_GENESIS
        }
    }

    pub fn max_standard_multisig_keys(&self, utxo_after_genesis: bool) -> u64 {
        if utxo_after_genesis {
            self.max_pubkeys_per_multisig_policy
        } else {
            MAX_STANDARD_MULTISIG_KEYS_BEFORE_GENESIS
        }
    }

    pub fn max_ops_per_script(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_ops_per_script_policy
        } else {
            MAX_OPS_PER_SCRIPT_BEFORE_GENESIS
        }
    }

    pub fn max_script_num_length(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_script_num_length_policy
        } else {
            MAX_SCRIPT_NUM_LENGTH_BEFORE_GENESIS
        }
    }

    pub fn max_block_sigops_per_mb(&self, genesis_enabled: bool) -> u64 {
        if genesis_enabled {
            self.max_block_sigops_per_mb_policy
        } else {
            MAX_BLOCK_SIGOPS_PER_MB_BEFORE_GENESIS
        }
    }

    /// Whether `height` lies strictly within `genesis_graceful_period` blocks
    /// of `activation_height`. A zero period disables the window.
    pub fn is_in_genesis_graceful_period(&self, height: Natural, activation_height: Natural) -> bool {
        let period = self.genesis_graceful_period;
        activation_height.saturating_sub(period) < height && height < activation_height.saturating_add(period)
    }

    pub fn max_mempool_bytes(&self) -> u64 {
        self.max_mempool_size_mb.saturating_mul(ONE_MEGABYTE)
    }

    pub fn max_nonfinal_mempool_bytes(&self) -> u64 {
        self.max_nonfinal_mempool_size_mb.saturating_mul(ONE_MEGABYTE)
    }

    /// Block space reserved for high priority transactions
    pub fn block_priority_size(&self, max_generated_block_size: u64) -> u64 {
        (max_generated_block_size as u128 * self.block_priority_percentage as u128 / 100) as u64
    }

    /// Whether a transaction paying `fee` for `virtual_size` bytes may go into
    /// a generated block
    pub fn meets_block_min_fee(&self, fee: Amount, virtual_size: u64) -> Result<bool> {
        Ok(fee >= self.block_min_tx_fee.fee(virtual_size)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PolicyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tx_size(false), 99_999);
        assert_eq!(config.max_tx_sigops_count(false), 4000);
        assert_eq!(config.max_script_sig_size(false), 1650);
        assert_eq!(config.max_standard_multisig_keys(false), 3);
        assert_eq!(config.max_standard_multisig_keys(true), 20);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PolicyConfig::from_json(r#"{"max_tx_size_policy": 1000000, "permit_bare_multisig": false}"#).unwrap();
        assert_eq!(config.max_tx_size(true), 1_000_000);
        assert_eq!(config.max_tx_size(false), MAX_TX_SIZE_POLICY_BEFORE_GENESIS);
        assert!(!config.permit_bare_multisig);
        assert_eq!(config.dust_relay_fee, FeeRate::from_sat_per_kb(DUST_RELAY_TX_FEE));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(PolicyConfig::from_json("{not json"), Err(PolicyError::Serialization(_))));
    }

    #[test]
    fn test_generated_override_above_block_override() {
        let config = PolicyConfig {
            max_block_size_override: Some(1000),
            max_generated_block_size_override: Some(2000),
            ..PolicyConfig::default()
        };
        assert!(matches!(config.validate(), Err(PolicyError::InvalidConfig(_))));
    }

    #[test]
    fn test_priority_percentage_bound() {
        let config = PolicyConfig { block_priority_percentage: 101, ..PolicyConfig::default() };
        assert!(config.validate().is_err());

        let config = PolicyConfig::default();
        assert_eq!(config.block_priority_size(128 * ONE_MEGABYTE), 6_400_000);
    }

    #[test]
    fn test_negative_fee_rate_rejected() {
        let config = PolicyConfig { dust_relay_fee: FeeRate::from_sat_per_kb(-1), ..PolicyConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mempool_budget() {
        let config = PolicyConfig::default();
        assert_eq!(config.max_mempool_bytes(), 300 * ONE_MEGABYTE);
        assert_eq!(config.max_nonfinal_mempool_bytes(), 50 * ONE_MEGABYTE);
    }

    #[test]
    fn test_genesis_graceful_period() {
        let config = PolicyConfig::default();
        let activation = 620_538;
        assert!(!config.is_in_genesis_graceful_period(activation - 72, activation));
        assert!(config.is_in_genesis_graceful_period(activation - 71, activation));
        assert!(config.is_in_genesis_graceful_period(activation, activation));
        assert!(config.is_in_genesis_graceful_period(activation + 71, activation));
        assert!(!config.is_in_genesis_graceful_period(activation + 72, activation));

        let disabled = PolicyConfig { genesis_graceful_period: 0, ..PolicyConfig::default() };
        assert!(!disabled.is_in_genesis_graceful_period(activation, activation));

        // Near height zero the window is clipped, not wrapped
        assert!(config.is_in_genesis_graceful_period(1, 10));
        assert!(!config.is_in_genesis_graceful_period(0, 10));
    }

    #[test]
    fn test_graceful_period_bound() {
        let config = PolicyConfig { genesis_graceful_period: 7200, ..PolicyConfig::default() };
        assert!(config.validate().is_ok());
        let config = PolicyConfig { genesis_graceful_period: 7201, ..PolicyConfig::default() };
        assert!(matches!(config.validate(), Err(PolicyError::InvalidConfig(_))));
    }

    #[test]
    fn test_post_genesis_script_limits() {
        let config = PolicyConfig::from_json(r#"{"max_ops_per_script_policy": 1000000}"#).unwrap();
        assert_eq!(config.max_ops_per_script(false), 500);
        assert_eq!(config.max_ops_per_script(true), 1_000_000);
        assert_eq!(config.max_script_num_length(false), 4);
        assert_eq!(config.max_script_num_length(true), 250_000);
        assert_eq!(config.max_stack_memory_usage_policy, 100 * ONE_MEGABYTE);
        assert_eq!(config.max_block_sigops_per_mb(true), 20_000);

        let config = PolicyConfig { max_stack_memory_usage_policy: 0, ..PolicyConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_block_min_fee() {
        let config = PolicyConfig::default();
        assert!(config.meets_block_min_fee(Amount(250), 250).unwrap());
        assert!(!config.meets_block_min_fee(Amount(249), 250).unwrap());
    }
}
