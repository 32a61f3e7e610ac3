//! # Relay-Policy
//!
//! Relay and mining standardness policy for a Genesis-era Bitcoin node.
//!
//! This crate decides whether a transaction is acceptable for relay and mempool
//! admission before any script is run, which script verification flags apply,
//! and which block size limits are in force on a given network at a given time.
//!
//! ## Architecture
//!
//! The checks are layered, leaves first:
//! - Network parameters (per-network block size limits and activation times)
//! - Script verify flags (typed flag sets for the interpreter)
//! - Output script templates (shape-only classification)
//! - Transaction and input standardness (reason-coded rejections)
//! - Fee rates (dust, virtual size, runtime-adjustable snapshot)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every decision is a function of its explicit inputs
//! 2. **Injected Activation**: upgrade state comes from an [`UpgradeActivation`] the caller supplies
//! 3. **Snapshot Fees**: a validation call reads fee values once and never sees a partial update
//! 4. **Rejections Are Values**: policy failures are [`PolicyResult::Rejected`], errors are reserved for bad configuration and overflow
//!
//! ## Usage
//!
//! ```rust
//! use relay_policy::{GenesisActivation, Network, PolicyEngine};
//! use relay_policy::types::*;
//!
//! let engine = PolicyEngine::with_defaults(Network::Regtest);
//! let activation = GenesisActivation::at_height(1_000);
//!
//! let mut script_pubkey = vec![0x76, 0xa9, 20];
//! script_pubkey.extend_from_slice(&[7; 20]);
//! script_pubkey.extend_from_slice(&[0x88, 0xac]);
//!
//! let tx = Transaction {
//!     version: 1,
//!     inputs: vec![TransactionInput {
//!         prevout: OutPoint { hash: [1; 32], index: 0 },
//!         script_sig: vec![0x01, 0xff],
//!         sequence: 0xffffffff,
//!     }],
//!     outputs: vec![TransactionOutput { value: Amount(10_000), script_pubkey }],
//!     lock_time: 0,
//! };
//!
//! let result = engine.is_standard_tx(&tx, 500, &activation).unwrap();
//! assert!(result.is_accepted());
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod config;
pub mod network;
pub mod flags;
pub mod script;
pub mod standard;
pub mod policy;
pub mod inputs;
pub mod fees;

// Re-export commonly used types
pub use types::*;
pub use error::{PolicyError, Result};
pub use config::PolicyConfig;
pub use network::{GenesisActivation, Network, NetworkParameterSet, NetworkParameterTable, RuleSet, UpgradeActivation};
pub use flags::{LockTimeFlags, ScriptVerifyFlags};
pub use standard::ScriptTemplate;
pub use fees::{FeeRate, FeeRatePolicy, FeeRates};

use std::sync::Arc;

/// Policy engine for one network.
///
/// Bundles the validated configuration, the network parameter table and the
/// runtime fee policy. Each validation method takes a single fee snapshot for
/// its whole run.
///
/// # Examples
///
/// ```
/// use relay_policy::{FeeRate, Network, PolicyConfig, PolicyEngine, NetworkParameterTable};
///
/// let config = PolicyConfig::from_json(r#"{"dust_relay_fee": 500}"#).unwrap();
/// let engine = PolicyEngine::new(Network::Main, config, NetworkParameterTable::default()).unwrap();
/// assert_eq!(engine.fee_rates().dust_relay_fee, FeeRate::from_sat_per_kb(500));
///
/// engine.fee_policy().set_dust_relay_fee(FeeRate::from_sat_per_kb(2000));
/// assert_eq!(engine.fee_rates().dust_relay_fee, FeeRate::from_sat_per_kb(2000));
/// ```
#[derive(Debug)]
pub struct PolicyEngine {
    network: Network,
    config: PolicyConfig,
    table: NetworkParameterTable,
    fees: FeeRatePolicy,
}

impl PolicyEngine {
    /// Validate `config`, check that `table` covers `network` and seed the fee
    /// policy from the configured rates
    pub fn new(network: Network, config: PolicyConfig, table: NetworkParameterTable) -> Result<Self> {
        config.validate()?;
        for time in [0, u64::MAX] {
            table.resolve_with_overrides(network, time, &config)?;
        }
        let fees = FeeRatePolicy::new(config.fee_rates());
        log::info!("policy engine configured for {}", network);
        Ok(Self { network, config, table, fees })
    }

    /// Default configuration and built-in network table
    pub fn with_defaults(network: Network) -> Self {
        let config = PolicyConfig::default();
        let fees = FeeRatePolicy::new(config.fee_rates());
        Self { network, config, table: NetworkParameterTable::default(), fees }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Runtime fee policy, shared by all validation calls
    pub fn fee_policy(&self) -> &FeeRatePolicy {
        &self.fees
    }

    pub fn fee_rates(&self) -> Arc<FeeRates> {
        self.fees.snapshot()
    }

    /// Limits in effect at `median_time_past`, configured overrides applied
    pub fn rule_set(&self, median_time_past: u64) -> Result<RuleSet> {
        self.table.resolve_with_overrides(self.network, median_time_past, &self.config)
    }

    /// Flags for verifying a standard transaction's scripts
    pub fn script_verify_flags(&self, genesis_enabled: bool, utxo_after_genesis: bool) -> ScriptVerifyFlags {
        flags::standard_script_verify_flags(genesis_enabled, utxo_after_genesis)
    }

    pub fn non_final_verify_flags(&self, genesis_enabled: bool) -> LockTimeFlags {
        flags::standard_non_final_verify_flags(genesis_enabled)
    }

    /// Whole-transaction standardness at `height`
    pub fn is_standard_tx(
        &self,
        tx: &Transaction,
        height: Natural,
        activation: &dyn UpgradeActivation,
    ) -> Result<PolicyResult> {
        let fees = self.fees.snapshot();
        policy::is_standard_tx(tx, height, activation, &self.config, &fees)
    }

    /// Input standardness against `coins`
    pub fn are_inputs_standard(
        &self,
        tx: &Transaction,
        coins: &dyn CoinLookup,
        mempool_height: Natural,
        activation: &dyn UpgradeActivation,
    ) -> Result<PolicyResult> {
        inputs::are_inputs_standard(tx, coins, mempool_height, activation, &self.config)
    }

    /// Both standardness checks for mempool admission at `mempool_height`,
    /// transaction first
    pub fn check_relay(
        &self,
        tx: &Transaction,
        coins: &dyn CoinLookup,
        mempool_height: Natural,
        activation: &dyn UpgradeActivation,
    ) -> Result<PolicyResult> {
        let result = self.is_standard_tx(tx, mempool_height, activation)?;
        if !result.is_accepted() {
            return Ok(result);
        }
        self.are_inputs_standard(tx, coins, mempool_height, activation)
    }

    /// Dust threshold of `output` under the current dust relay fee
    pub fn dust_threshold(&self, output: &TransactionOutput, genesis_enabled: bool) -> Result<Amount> {
        fees::dust_threshold(output, self.fees.snapshot().dust_relay_fee, genesis_enabled)
    }

    /// Serialized size, or legacy sigops priced at the current bytes per sigop
    /// if larger
    pub fn virtual_size(&self, tx: &Transaction) -> u64 {
        let sigops = policy::legacy_sigop_count(tx);
        self.fees.snapshot().virtual_size(tx.serialized_size() as u64, sigops)
    }

    pub fn is_in_genesis_graceful_period(&self, height: Natural, activation_height: Natural) -> bool {
        self.config.is_in_genesis_graceful_period(height, activation_height)
    }

    /// Whether `fee` is enough for `tx` to go into a generated block
    pub fn meets_block_min_fee(&self, tx: &Transaction, fee: Amount) -> Result<bool> {
        self.config.meets_block_min_fee(fee, self.virtual_size(tx))
    }
}
