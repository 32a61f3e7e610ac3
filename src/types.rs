//! Core transaction types consumed by the policy engine

use crate::constants::*;
use crate::error::{PolicyError, Result};
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Amount in satoshis.
///
/// Arithmetic goes through the `checked_*` helpers so a sum that leaves the
/// `i64` range surfaces as [`PolicyError::AmountOverflow`] instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_sat(satoshis: i64) -> Self {
        Amount(satoshis)
    }

    pub fn to_sat(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or_else(|| PolicyError::AmountOverflow(format!("{} + {}", self.0, rhs.0)))
    }

    pub fn checked_mul(self, factor: i64) -> Result<Amount> {
        self.0
            .checked_mul(factor)
            .map(Amount)
            .ok_or_else(|| PolicyError::AmountOverflow(format!("{} * {}", self.0, factor)))
    }

    /// Whether the amount lies in `0..=MAX_MONEY`
    pub fn is_money_range(self) -> bool {
        self.0 >= 0 && self.0 <= MAX_MONEY
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

/// OutPoint: reference to an output of a previous transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32] && self.index == COINBASE_PREVOUT_INDEX
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Amount,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    /// Consensus-serialized size: value, script length prefix, script
    pub fn serialized_size(&self) -> usize {
        8 + compact_size_len(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }
}

/// Transaction: read-only view handed to the policy checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Consensus serialization
    pub fn serialize(&self) -> ByteString {
        let mut out = Vec::with_capacity(self.serialized_size());
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.prevout.hash);
            out.extend_from_slice(&input.prevout.index.to_le_bytes());
            write_compact_size(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(&input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.0.to_le_bytes());
            write_compact_size(&mut out, output.script_pubkey.len() as u64);
            out.extend_from_slice(&output.script_pubkey);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Size of [`Transaction::serialize`] without building the buffer
    pub fn serialized_size(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 36 + compact_size_len(i.script_sig.len() as u64) + i.script_sig.len() + 4)
            .sum();
        let outputs: usize = self.outputs.iter().map(|o| o.serialized_size()).sum();

        4 + compact_size_len(self.inputs.len() as u64)
            + inputs
            + compact_size_len(self.outputs.len() as u64)
            + outputs
            + 4
    }

    /// Transaction id: double SHA-256 of the serialization
    pub fn txid(&self) -> Hash {
        let mut hasher = sha256d::Hash::engine();
        hasher.input(&self.serialize());
        let result = sha256d::Hash::from_engine(hasher);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Txid in the conventional byte-reversed hex form, for log lines
    pub fn txid_hex(&self) -> String {
        let mut txid = self.txid();
        txid.reverse();
        hex::encode(txid)
    }
}

fn compact_size_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Unspent output as returned by a [`CoinLookup`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub output: TransactionOutput,
    /// Height of the block that created the output
    pub height: Natural,
}

/// UTXO Set: OutPoint → Coin
pub type UtxoSet = HashMap<OutPoint, Coin>;

/// Resolves previous outputs for input checks.
///
/// Implementations must present a point-in-time consistent view for the
/// duration of one validation call.
pub trait CoinLookup {
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}

impl CoinLookup for UtxoSet {
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.get(outpoint).cloned()
    }
}

/// Short, stable reason codes for policy rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Version,
    TxSize,
    ScriptSigSize,
    ScriptSigNotPushOnly,
    TxSigops,
    ScriptPubKey,
    BareMultisig,
    MultiOpReturn,
    DataCarrierSize,
    Dust,
    MissingInputs,
    NonstandardInput,
    ScriptSigArgs,
    ScriptSigSigops,
    BadRedeemScript,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Version => "version",
            RejectReason::TxSize => "tx-size",
            RejectReason::ScriptSigSize => "scriptsig-size",
            RejectReason::ScriptSigNotPushOnly => "scriptsig-not-pushonly",
            RejectReason::TxSigops => "tx-sigops",
            RejectReason::ScriptPubKey => "scriptpubkey",
            RejectReason::BareMultisig => "bare-multisig",
            RejectReason::MultiOpReturn => "multi-op-return",
            RejectReason::DataCarrierSize => "datacarrier-size-exceeded",
            RejectReason::Dust => "dust",
            RejectReason::MissingInputs => "missing-inputs",
            RejectReason::NonstandardInput => "nonstandard-input",
            RejectReason::ScriptSigArgs => "scriptsig-args",
            RejectReason::ScriptSigSigops => "scriptsig-sigops",
            RejectReason::BadRedeemScript => "bad-redeem-script",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a policy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyResult {
    Accepted,
    Rejected(RejectReason),
}

impl PolicyResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyResult::Accepted)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            PolicyResult::Accepted => None,
            PolicyResult::Rejected(reason) => Some(*reason),
        }
    }
}
