//! Input standardness against the coins being spent

use crate::config::PolicyConfig;
use crate::constants::{MAX_P2SH_SIGOPS, MEMPOOL_HEIGHT};
use crate::error::Result;
use crate::network::UpgradeActivation;
use crate::script::{count_sigops, hash160, pushed_data};
use crate::standard::{classify_output_script, solve, ScriptTemplate};
use crate::types::{Coin, CoinLookup, Natural, PolicyResult, RejectReason, Transaction, TransactionInput};

/// Height the coin's output was created at, for activation purposes
fn creation_height(coin: &Coin, mempool_height: Natural) -> Natural {
    if coin.height == MEMPOOL_HEIGHT {
        mempool_height
    } else {
        coin.height
    }
}

/// AreInputsStandard: 𝒯𝒳 × 𝒰𝒮 → {accepted, rejected(reason)}
///
/// Every input must spend a standard output with a push-only scriptSig carrying
/// exactly the arguments the output expects. P2SH spends additionally have
/// their redeem script checked against the committed hash, capped at
/// [`MAX_P2SH_SIGOPS`] and held to the redeemable templates.
///
/// Coins still in the mempool carry [`MEMPOOL_HEIGHT`] and are treated as
/// created at `mempool_height`. Nothing is executed.
pub fn are_inputs_standard(
    tx: &Transaction,
    coins: &dyn CoinLookup,
    mempool_height: Natural,
    activation: &dyn UpgradeActivation,
    config: &PolicyConfig,
) -> Result<PolicyResult> {
    if tx.is_coinbase() {
        return Ok(PolicyResult::Accepted);
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        let Some(coin) = coins.get_coin(&input.prevout) else {
            log::debug!("tx {} input {}: missing coin", tx.txid_hex(), index);
            return Ok(PolicyResult::Rejected(RejectReason::MissingInputs));
        };

        let utxo_after_genesis = activation.is_genesis_enabled(creation_height(&coin, mempool_height));
        if let Err(reason) = check_input(input, &coin, utxo_after_genesis, config) {
            log::debug!("tx {} input {} is not standard: {}", tx.txid_hex(), index, reason);
            return Ok(PolicyResult::Rejected(reason));
        }
    }

    Ok(PolicyResult::Accepted)
}

/// Template of a P2SH redeem script.
///
/// Multisig needs only `m ≤ n`; the size is bounded by [`MAX_P2SH_SIGOPS`]
/// rather than the bare multisig key limit.
fn redeem_script_template(redeem_script: &[u8], utxo_after_genesis: bool) -> ScriptTemplate {
    match solve(redeem_script, utxo_after_genesis) {
        ScriptTemplate::BareMultisig { required, keys } if required > keys => ScriptTemplate::Nonstandard,
        template => template,
    }
}

fn check_input(
    input: &TransactionInput,
    coin: &Coin,
    utxo_after_genesis: bool,
    config: &PolicyConfig,
) -> std::result::Result<(), RejectReason> {
    let script_pubkey = &coin.output.script_pubkey;
    let template = classify_output_script(script_pubkey, utxo_after_genesis, config);
    let mut expected = template.script_sig_args_expected().ok_or(RejectReason::NonstandardInput)?;

    let stack = pushed_data(&input.script_sig).ok_or(RejectReason::ScriptSigNotPushOnly)?;

    if template == ScriptTemplate::ScriptHash {
        let redeem_script = stack.last().ok_or(RejectReason::BadRedeemScript)?;
        // Template match guarantees the 20-byte hash at [2..22]
        if hash160(redeem_script)[..] != script_pubkey[2..22] {
            return Err(RejectReason::BadRedeemScript);
        }
        if count_sigops(redeem_script, true) > MAX_P2SH_SIGOPS {
            return Err(RejectReason::ScriptSigSigops);
        }
        let inner = redeem_script_template(redeem_script, utxo_after_genesis);
        if !inner.is_redeemable() {
            return Err(RejectReason::BadRedeemScript);
        }
        expected += inner.script_sig_args_expected().ok_or(RejectReason::BadRedeemScript)?;
    }

    if stack.len() != expected {
        return Err(RejectReason::ScriptSigArgs);
    }
    Ok(())
}
