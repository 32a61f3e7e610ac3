//! Whole-transaction standardness

use crate::config::PolicyConfig;
use crate::constants::MAX_STANDARD_VERSION;
use crate::error::Result;
use crate::fees::{is_dust, FeeRates};
use crate::network::UpgradeActivation;
use crate::script::{count_sigops, is_push_only};
use crate::standard::{classify_output_script, ScriptTemplate};
use crate::types::{Natural, PolicyResult, RejectReason, Transaction};

const MIN_STANDARD_VERSION: i32 = 1;

/// Sigops in all scriptSigs and scriptPubKeys, multisig counted at its maximum
pub fn legacy_sigop_count(tx: &Transaction) -> u64 {
    let inputs = tx.inputs.iter().map(|input| count_sigops(&input.script_sig, false));
    let outputs = tx.outputs.iter().map(|output| count_sigops(&output.script_pubkey, false));
    inputs.chain(outputs).fold(0u64, u64::saturating_add)
}

fn reject(tx: &Transaction, reason: RejectReason) -> Result<PolicyResult> {
    log::debug!("tx {} is not standard: {}", tx.txid_hex(), reason);
    Ok(PolicyResult::Rejected(reason))
}

/// IsStandardTx: 𝒯𝒳 × ℕ → {accepted, rejected(reason)}
///
/// `height` is the height the transaction would be mined at; the upgrade state
/// at that height selects the size and sigop limits and how outputs are
/// classified. Checks short-circuit at the first failure in this order:
/// version, size, scriptSigs, sigops, output templates, null data, dust.
///
/// Fails only when a dust threshold overflows.
pub fn is_standard_tx(
    tx: &Transaction,
    height: Natural,
    activation: &dyn UpgradeActivation,
    config: &PolicyConfig,
    fees: &FeeRates,
) -> Result<PolicyResult> {
    let genesis_enabled = activation.is_genesis_enabled(height);

    if !(MIN_STANDARD_VERSION..=MAX_STANDARD_VERSION).contains(&tx.version) {
        return reject(tx, RejectReason::Version);
    }

    if tx.serialized_size() as u64 > config.max_tx_size(genesis_enabled) {
        return reject(tx, RejectReason::TxSize);
    }

    let max_script_sig_size = config.max_script_sig_size(genesis_enabled);
    for input in &tx.inputs {
        if input.script_sig.len() as u64 > max_script_sig_size {
            return reject(tx, RejectReason::ScriptSigSize);
        }
        if !is_push_only(&input.script_sig) {
            return reject(tx, RejectReason::ScriptSigNotPushOnly);
        }
    }

    if legacy_sigop_count(tx) > config.max_tx_sigops_count(genesis_enabled) {
        return reject(tx, RejectReason::TxSigops);
    }

    // New outputs are created after Genesis exactly when it is active
    let mut null_data_outputs = 0usize;
    let mut null_data_bytes = 0u64;
    for output in &tx.outputs {
        match classify_output_script(&output.script_pubkey, genesis_enabled, config) {
            ScriptTemplate::Nonstandard => return reject(tx, RejectReason::ScriptPubKey),
            ScriptTemplate::BareMultisig { .. } if !config.permit_bare_multisig => {
                return reject(tx, RejectReason::BareMultisig)
            }
            ScriptTemplate::NullData => {
                null_data_outputs += 1;
                null_data_bytes = null_data_bytes.saturating_add(output.script_pubkey.len() as u64);
            }
            _ => {}
        }
    }

    if null_data_outputs > 1 {
        return reject(tx, RejectReason::MultiOpReturn);
    }
    if null_data_bytes > config.data_carrier_size {
        return reject(tx, RejectReason::DataCarrierSize);
    }

    for output in &tx.outputs {
        if classify_output_script(&output.script_pubkey, genesis_enabled, config) == ScriptTemplate::NullData {
            continue;
        }
        if is_dust(output, fees.dust_relay_fee, genesis_enabled)? {
            return reject(tx, RejectReason::Dust);
        }
    }

    Ok(PolicyResult::Accepted)
}
