//! Script parsing helpers used by the standardness checks
//!
//! Nothing here executes a script. Scripts are walked instruction by
//! instruction to inspect their shape, count signature operations and pull out
//! pushed data.

use crate::constants::MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS;
use crate::types::ByteString;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub const OP_0: u8 = 0x00;
pub const OP_FALSE: u8 = OP_0;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// One parsed script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Push opcode (`OP_0`, direct push or `OP_PUSHDATA*`) with its payload
    Push { opcode: u8, data: &'a [u8] },
    Op(u8),
}

impl<'a> Instruction<'a> {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Push { opcode, .. } => *opcode,
            Instruction::Op(opcode) => *opcode,
        }
    }
}

/// Raised when a push runs past the end of the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedPush;

/// Iterator over the instructions of a script.
///
/// Yields `Err(TruncatedPush)` once and then stops if a push is cut short.
pub struct Instructions<'a> {
    script: &'a [u8],
    pos: usize,
    failed: bool,
}

pub fn instructions(script: &[u8]) -> Instructions<'_> {
    Instructions { script, pos: 0, failed: false }
}

impl<'a> Instructions<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TruncatedPush> {
        let end = self.pos.checked_add(n).ok_or(TruncatedPush)?;
        if end > self.script.len() {
            return Err(TruncatedPush);
        }
        let slice = &self.script[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_push(&mut self, opcode: u8) -> Result<Instruction<'a>, TruncatedPush> {
        let len = match opcode {
            OP_PUSHDATA1 => self.take(1)?[0] as usize,
            OP_PUSHDATA2 => {
                let b = self.take(2)?;
                u16::from_le_bytes([b[0], b[1]]) as usize
            }
            OP_PUSHDATA4 => {
                let b = self.take(4)?;
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
            }
            n => n as usize,
        };
        let data = self.take(len)?;
        Ok(Instruction::Push { opcode, data })
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, TruncatedPush>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.script.len() {
            return None;
        }
        let opcode = self.script[self.pos];
        self.pos += 1;

        if opcode > OP_PUSHDATA4 {
            return Some(Ok(Instruction::Op(opcode)));
        }
        let result = self.read_push(opcode);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Parse the whole script, or `None` if a push is truncated
pub fn parse_script(script: &[u8]) -> Option<Vec<Instruction<'_>>> {
    instructions(script).collect::<Result<Vec<_>, _>>().ok()
}

/// Whether the script consists only of data pushes and small-number opcodes.
///
/// Everything up to `OP_16` counts, `OP_RESERVED` included; a truncated push
/// makes the script not push-only.
pub fn is_push_only(script: &[u8]) -> bool {
    instructions(script).all(|ins| matches!(ins, Ok(ins) if ins.opcode() <= OP_16))
}

/// Decode `OP_1`..`OP_16`
pub fn decode_small_int(opcode: u8) -> Option<u8> {
    if (OP_1..=OP_16).contains(&opcode) {
        Some(opcode - OP_1 + 1)
    } else {
        None
    }
}

/// GetSigOpCount
///
/// `CHECKSIG`/`CHECKSIGVERIFY` count one. `CHECKMULTISIG(VERIFY)` counts the
/// preceding key count when `accurate` and that count is `OP_1`..`OP_16`,
/// otherwise the pre-Genesis key maximum. Counting stops at a truncated push.
pub fn count_sigops(script: &[u8], accurate: bool) -> u64 {
    let mut count = 0u64;
    let mut last_opcode: Option<u8> = None;

    for ins in instructions(script) {
        let Ok(ins) = ins else { break };
        let opcode = ins.opcode();
        match opcode {
            OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                count += match last_opcode.and_then(decode_small_int) {
                    Some(n) if accurate => n as u64,
                    _ => MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS,
                };
            }
            _ => {}
        }
        last_opcode = Some(opcode);
    }
    count
}

/// Data pushed by a push-only script, in order.
///
/// Small-number opcodes push their numeric encoding (`OP_1NEGATE` → `0x81`,
/// `OP_n` → `n`). Returns `None` for scripts that are not push-only.
pub fn pushed_data(script: &[u8]) -> Option<Vec<ByteString>> {
    let mut stack = Vec::new();
    for ins in instructions(script) {
        match ins.ok()? {
            Instruction::Push { data, .. } => stack.push(data.to_vec()),
            Instruction::Op(OP_1NEGATE) => stack.push(vec![0x81]),
            Instruction::Op(opcode) => stack.push(vec![decode_small_int(opcode)?]),
        }
    }
    Some(stack)
}

/// RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd160_hash);
    out
}
