//! Fee rates, dust and the runtime fee policy

use crate::constants::*;
use crate::error::{PolicyError, Result};
use crate::standard::is_unspendable;
use crate::types::{Amount, TransactionOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Fee rate in satoshis per 1000 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate {
    satoshis_per_kb: Amount,
}

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate { satoshis_per_kb: Amount::ZERO };

    pub fn from_sat_per_kb(satoshis: i64) -> Self {
        Self { satoshis_per_kb: Amount(satoshis) }
    }

    /// Rate paid by `fee` over `size` bytes, truncated
    pub fn from_fee_and_size(fee: Amount, size: u64) -> Self {
        if size == 0 {
            return Self::ZERO;
        }
        let rate = fee.0 as i128 * ONE_KILOBYTE as i128 / size as i128;
        Self::from_sat_per_kb(rate.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    pub fn per_kb(&self) -> Amount {
        self.satoshis_per_kb
    }

    /// Fee for `size` bytes at this rate.
    ///
    /// Truncates toward zero, except that a non-zero size at a non-zero rate
    /// never costs less than one satoshi.
    pub fn fee(&self, size: u64) -> Result<Amount> {
        let rate = self.satoshis_per_kb.0 as i128;
        let mut fee = rate * size as i128 / ONE_KILOBYTE as i128;
        if fee == 0 && size != 0 {
            fee = rate.signum();
        }
        i64::try_from(fee)
            .map(Amount)
            .map_err(|_| PolicyError::AmountOverflow(format!("fee for {} bytes at {}", size, self)))
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/kB", self.satoshis_per_kb.0)
    }
}

/// Size charged for fee purposes: the larger of the serialized size and the
/// sigop count priced at `bytes_per_sigop`.
pub fn virtual_transaction_size(size: u64, sigops: u64, bytes_per_sigop: u64) -> u64 {
    size.max(sigops.saturating_mul(bytes_per_sigop))
}

/// Dust threshold for an output.
///
/// Three times the fee, at `dust_relay_fee`, of creating the output plus a
/// typical input spending it. Provably unspendable outputs have no threshold.
pub fn dust_threshold(output: &TransactionOutput, dust_relay_fee: FeeRate, genesis_enabled: bool) -> Result<Amount> {
    if is_unspendable(&output.script_pubkey, genesis_enabled) {
        return Ok(Amount::ZERO);
    }
    let spend_size = output.serialized_size() as u64 + DUST_SPEND_INPUT_SIZE;
    dust_relay_fee.fee(spend_size)?.checked_mul(DUST_FEE_MULTIPLIER)
}

pub fn is_dust(output: &TransactionOutput, dust_relay_fee: FeeRate, genesis_enabled: bool) -> Result<bool> {
    Ok(output.value < dust_threshold(output, dust_relay_fee, genesis_enabled)?)
}

/// Fee values consulted by the validators, read as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    /// Minimum fee rate increase for mempool eviction and replacement
    pub incremental_relay_fee: FeeRate,
    /// Fee rate defining dust
    pub dust_relay_fee: FeeRate,
    pub bytes_per_sigop: u64,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            incremental_relay_fee: FeeRate::from_sat_per_kb(MEMPOOL_FULL_FEE_INCREMENT),
            dust_relay_fee: FeeRate::from_sat_per_kb(DUST_RELAY_TX_FEE),
            bytes_per_sigop: DEFAULT_BYTES_PER_SIGOP,
        }
    }
}

impl FeeRates {
    pub fn virtual_size(&self, size: u64, sigops: u64) -> u64 {
        virtual_transaction_size(size, sigops, self.bytes_per_sigop)
    }

    /// Extra fee a replacement must pay over the original for `virtual_size`
    /// bytes
    pub fn replacement_fee_increment(&self, virtual_size: u64) -> Result<Amount> {
        self.incremental_relay_fee.fee(virtual_size)
    }
}

/// Process-wide fee configuration.
///
/// Writers replace the whole [`FeeRates`] value; readers take an `Arc` to the
/// current one, so a validation call sees either the old or the new values,
/// never a mix.
#[derive(Debug)]
pub struct FeeRatePolicy {
    current: RwLock<Arc<FeeRates>>,
}

impl Default for FeeRatePolicy {
    fn default() -> Self {
        Self::new(FeeRates::default())
    }
}

impl FeeRatePolicy {
    pub fn new(rates: FeeRates) -> Self {
        Self { current: RwLock::new(Arc::new(rates)) }
    }

    pub fn snapshot(&self) -> Arc<FeeRates> {
        // A writer only ever swaps the Arc, so a poisoned lock still holds a
        // complete value.
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn update(&self, rates: FeeRates) {
        log::info!(
            "fee policy updated: incremental relay fee {}, dust relay fee {}, bytes per sigop {}",
            rates.incremental_relay_fee,
            rates.dust_relay_fee,
            rates.bytes_per_sigop
        );
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(rates);
    }

    fn modify(&self, change: impl FnOnce(&mut FeeRates)) {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut rates = FeeRates::clone(&guard);
        change(&mut rates);
        log::info!(
            "fee policy updated: incremental relay fee {}, dust relay fee {}, bytes per sigop {}",
            rates.incremental_relay_fee,
            rates.dust_relay_fee,
            rates.bytes_per_sigop
        );
        *guard = Arc::new(rates);
    }

    pub fn set_incremental_relay_fee(&self, rate: FeeRate) {
        self.modify(|rates| rates.incremental_relay_fee = rate);
    }

    pub fn set_dust_relay_fee(&self, rate: FeeRate) {
        self.modify(|rates| rates.dust_relay_fee = rate);
    }

    pub fn set_bytes_per_sigop(&self, bytes: u64) {
        self.modify(|rates| rates.bytes_per_sigop = bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn output(value: i64, script_len: usize) -> TransactionOutput {
        TransactionOutput { value: Amount(value), script_pubkey: vec![0x51; script_len] }
    }

    #[test]
    fn test_fee_for_size() {
        let rate = FeeRate::from_sat_per_kb(1000);
        assert_eq!(rate.fee(250).unwrap(), Amount(250));
        assert_eq!(FeeRate::from_sat_per_kb(1).fee(10).unwrap(), Amount(1));
        assert_eq!(FeeRate::ZERO.fee(10).unwrap(), Amount(0));
        assert_eq!(rate.fee(0).unwrap(), Amount(0));
    }

    #[test]
    fn test_fee_overflow() {
        let rate = FeeRate::from_sat_per_kb(i64::MAX);
        assert!(matches!(rate.fee(1_000_000), Err(PolicyError::AmountOverflow(_))));
    }

    #[test]
    fn test_from_fee_and_size() {
        assert_eq!(FeeRate::from_fee_and_size(Amount(500), 250), FeeRate::from_sat_per_kb(2000));
        assert_eq!(FeeRate::from_fee_and_size(Amount(500), 0), FeeRate::ZERO);
        assert!(FeeRate::from_sat_per_kb(1000) < FeeRate::from_sat_per_kb(1001));
    }

    #[test]
    fn test_dust_threshold_p2pkh_sized_output() {
        // 8 + 1 + 34 bytes of output plus 148 bytes to spend it: 191 sat, times 3
        let rate = FeeRate::from_sat_per_kb(DUST_RELAY_TX_FEE);
        assert_eq!(dust_threshold(&output(0, 34), rate, false).unwrap(), Amount(573));
        assert!(is_dust(&output(572, 34), rate, false).unwrap());
        assert!(!is_dust(&output(573, 34), rate, false).unwrap());
        assert!(is_dust(&output(1, 34), rate, true).unwrap());
    }

    #[test]
    fn test_zero_dust_rate_disables_dust() {
        assert!(!is_dust(&output(0, 34), FeeRate::ZERO, false).unwrap());
    }

    #[test]
    fn test_unspendable_is_never_dust() {
        let op_return = TransactionOutput { value: Amount(0), script_pubkey: vec![0x6a, 0x01, 0x00] };
        assert!(!is_dust(&op_return, FeeRate::from_sat_per_kb(1000), false).unwrap());
    }

    #[test]
    fn test_virtual_size() {
        assert_eq!(virtual_transaction_size(1000, 10, 20), 1000);
        assert_eq!(virtual_transaction_size(100, 10, 20), 200);
        assert_eq!(virtual_transaction_size(0, u64::MAX, 20), u64::MAX);

        let rates = FeeRates::default();
        assert_eq!(rates.virtual_size(100, 10), 200);
        assert_eq!(rates.replacement_fee_increment(200).unwrap(), Amount(200));
    }

    #[test]
    fn test_policy_update_replaces_snapshot() {
        let policy = FeeRatePolicy::default();
        let before = policy.snapshot();

        policy.set_dust_relay_fee(FeeRate::from_sat_per_kb(5000));
        let after = policy.snapshot();

        assert_eq!(before.dust_relay_fee, FeeRate::from_sat_per_kb(DUST_RELAY_TX_FEE));
        assert_eq!(after.dust_relay_fee, FeeRate::from_sat_per_kb(5000));
        assert_eq!(after.incremental_relay_fee, before.incremental_relay_fee);

        policy.set_bytes_per_sigop(50);
        policy.set_incremental_relay_fee(FeeRate::from_sat_per_kb(2000));
        let latest = policy.snapshot();
        assert_eq!(latest.bytes_per_sigop, 50);
        assert_eq!(latest.incremental_relay_fee, FeeRate::from_sat_per_kb(2000));
    }

    #[test]
    fn test_concurrent_readers_see_whole_values() {
        let policy = Arc::new(FeeRatePolicy::default());
        let a = FeeRates {
            incremental_relay_fee: FeeRate::from_sat_per_kb(1),
            dust_relay_fee: FeeRate::from_sat_per_kb(1),
            bytes_per_sigop: 1,
        };
        let b = FeeRates {
            incremental_relay_fee: FeeRate::from_sat_per_kb(2),
            dust_relay_fee: FeeRate::from_sat_per_kb(2),
            bytes_per_sigop: 2,
        };
        policy.update(a.clone());

        let writer = {
            let policy = Arc::clone(&policy);
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                for i in 0..200 {
                    policy.update(if i % 2 == 0 { b.clone() } else { a.clone() });
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let policy = Arc::clone(&policy);
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = policy.snapshot();
                        assert!(*snapshot == a || *snapshot == b);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
