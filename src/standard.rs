//! Output script template classification

use crate::config::PolicyConfig;
use crate::constants::MAX_SCRIPT_SIZE_BEFORE_GENESIS;
use crate::script::*;
use serde::{Deserialize, Serialize};

/// Known output script templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptTemplate {
    PubKey,
    PubKeyHash,
    ScriptHash,
    BareMultisig { required: u8, keys: u8 },
    NullData,
    Nonstandard,
}

impl ScriptTemplate {
    pub fn is_standard(&self) -> bool {
        !matches!(self, ScriptTemplate::Nonstandard)
    }

    /// Number of scriptSig pushes needed to satisfy the template, not counting
    /// the redeem script of a P2SH spend. `None` for unspendable shapes.
    pub fn script_sig_args_expected(&self) -> Option<usize> {
        match self {
            ScriptTemplate::PubKey => Some(1),
            ScriptTemplate::PubKeyHash => Some(2),
            // CHECKMULTISIG pops one extra dummy element
            ScriptTemplate::BareMultisig { required, .. } => Some(*required as usize + 1),
            ScriptTemplate::ScriptHash => Some(1),
            ScriptTemplate::NullData | ScriptTemplate::Nonstandard => None,
        }
    }

    /// Templates a P2SH redeem script may take
    pub fn is_redeemable(&self) -> bool {
        matches!(
            self,
            ScriptTemplate::PubKey | ScriptTemplate::PubKeyHash | ScriptTemplate::BareMultisig { .. }
        )
    }
}

fn is_pubkey_push(ins: &Instruction<'_>) -> bool {
    matches!(ins, Instruction::Push { data, .. } if data.len() == 33 || data.len() == 65)
}

fn is_pay_to_pubkey(ins: &[Instruction<'_>]) -> bool {
    matches!(ins, [key, Instruction::Op(OP_CHECKSIG)] if is_pubkey_push(key))
}

fn is_pay_to_pubkey_hash(script: &[u8]) -> bool {
    script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

/// `OP_HASH160 <20 bytes> OP_EQUAL`, byte for byte
pub fn is_pay_to_script_hash(script: &[u8]) -> bool {
    script.len() == 23 && script[0] == OP_HASH160 && script[1] == 20 && script[22] == OP_EQUAL
}

fn match_multisig(ins: &[Instruction<'_>]) -> Option<(u8, u8)> {
    let (first, rest) = ins.split_first()?;
    let (last, middle) = rest.split_last()?;
    if last.opcode() != OP_CHECKMULTISIG {
        return None;
    }
    let (count, keys) = middle.split_last()?;

    let required = decode_small_int(first.opcode())?;
    let key_count = decode_small_int(count.opcode())?;
    if keys.len() != key_count as usize || !keys.iter().all(is_pubkey_push) {
        return None;
    }
    Some((required, key_count))
}

fn is_null_data(script: &[u8], utxo_after_genesis: bool) -> bool {
    if script.len() >= 2 && script[0] == OP_FALSE && script[1] == OP_RETURN {
        return true;
    }
    !utxo_after_genesis && script.first() == Some(&OP_RETURN) && is_push_only(&script[1..])
}

/// Solver: 𝕊 × 𝔹 → template
///
/// Matches the script shape against the templates in priority order:
/// 1. Pay-to-public-key
/// 2. Pay-to-public-key-hash
/// 3. Pay-to-script-hash (only for outputs created before Genesis)
/// 4. Bare multisig, any `m` and `n` in `1..=16`
/// 5. Null data (`OP_FALSE OP_RETURN`, or `OP_RETURN <pushes>` before Genesis)
///
/// No configured bounds are applied here; see [`classify_output_script`].
pub fn solve(script: &[u8], utxo_after_genesis: bool) -> ScriptTemplate {
    let parsed = parse_script(script);

    if matches!(&parsed, Some(ins) if is_pay_to_pubkey(ins)) {
        return ScriptTemplate::PubKey;
    }
    if is_pay_to_pubkey_hash(script) {
        return ScriptTemplate::PubKeyHash;
    }
    if is_pay_to_script_hash(script) {
        return if utxo_after_genesis {
            ScriptTemplate::Nonstandard
        } else {
            ScriptTemplate::ScriptHash
        };
    }
    if let Some((required, keys)) = parsed.as_deref().and_then(match_multisig) {
        return ScriptTemplate::BareMultisig { required, keys };
    }
    if is_null_data(script, utxo_after_genesis) {
        return ScriptTemplate::NullData;
    }
    ScriptTemplate::Nonstandard
}

/// IsStandard: 𝕊 × 𝔹 × config → template
///
/// Applies the configured bounds on top of [`solve`]: bare multisig needs
/// `1 ≤ m ≤ n ≤ max keys`, null data needs data carriers to be accepted.
/// Anything failing those is `Nonstandard`.
pub fn classify_output_script(script: &[u8], utxo_after_genesis: bool, config: &PolicyConfig) -> ScriptTemplate {
    match solve(script, utxo_after_genesis) {
        ScriptTemplate::BareMultisig { required, keys } => {
            let max_keys = config.max_standard_multisig_keys(utxo_after_genesis);
            if keys as u64 > max_keys || required > keys {
                ScriptTemplate::Nonstandard
            } else {
                ScriptTemplate::BareMultisig { required, keys }
            }
        }
        ScriptTemplate::NullData if !config.accept_datacarrier => ScriptTemplate::Nonstandard,
        template => template,
    }
}

/// Provably unspendable outputs carry no dust cost
pub fn is_unspendable(script: &[u8], genesis_enabled: bool) -> bool {
    match script {
        [OP_RETURN, ..] | [OP_FALSE, OP_RETURN, ..] => true,
        _ => !genesis_enabled && script.len() as u64 > MAX_SCRIPT_SIZE_BEFORE_GENESIS,
    }
}
