//! Script verification flags for standardness checks
//!
//! The flag sets have no `Default`; callers name the set they want
//! (`standard()`, `mandatory()`, `empty()`).

use bitflags::bitflags;

bitflags! {
    /// Script verification flags passed to the interpreter layer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScriptVerifyFlags: u32 {
        /// Evaluate P2SH subscripts
        const P2SH = 1 << 0;
        /// Strict signature and public key encoding
        const STRICTENC = 1 << 1;
        /// Strict DER signatures
        const DERSIG = 1 << 2;
        /// Low-S signatures only
        const LOW_S = 1 << 3;
        /// Dummy stack element of CHECKMULTISIG must be empty
        const NULLDUMMY = 1 << 4;
        /// scriptSig must be push-only
        const SIGPUSHONLY = 1 << 5;
        /// Minimal push encodings
        const MINIMALDATA = 1 << 6;
        /// Reject the reserved NOP opcodes
        const DISCOURAGE_UPGRADABLE_NOPS = 1 << 7;
        /// Exactly one stack element after evaluation
        const CLEANSTACK = 1 << 8;
        const CHECKLOCKTIMEVERIFY = 1 << 9;
        const CHECKSEQUENCEVERIFY = 1 << 10;
        const MINIMALIF = 1 << 13;
        /// Failed signature checks must use an empty signature
        const NULLFAIL = 1 << 14;
        const COMPRESSED_PUBKEYTYPE = 1 << 15;
        const ENABLE_SIGHASH_FORKID = 1 << 16;
        /// Post-Genesis script semantics
        const GENESIS = 1 << 18;
        /// The spent UTXO was created after Genesis
        const UTXO_AFTER_GENESIS = 1 << 19;
    }
}

bitflags! {
    /// Flags for non-final transaction checks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LockTimeFlags: u32 {
        /// Enforce relative lock-time sequence semantics
        const VERIFY_SEQUENCE = 1 << 0;
        /// Use median time past instead of block time
        const MEDIAN_TIME_PAST = 1 << 1;
    }
}

impl ScriptVerifyFlags {
    /// Flags every block must satisfy; a script violating one of them can never
    /// be valid.
    pub fn mandatory() -> Self {
        Self::P2SH | Self::STRICTENC | Self::ENABLE_SIGHASH_FORKID | Self::LOW_S | Self::NULLFAIL
    }

    /// Flags standard transactions comply with. Scripts violating the
    /// non-mandatory part may still appear in valid blocks.
    pub fn standard() -> Self {
        Self::mandatory()
            | Self::DERSIG
            | Self::MINIMALDATA
            | Self::NULLDUMMY
            | Self::DISCOURAGE_UPGRADABLE_NOPS
            | Self::CLEANSTACK
            | Self::CHECKLOCKTIMEVERIFY
            | Self::CHECKSEQUENCEVERIFY
    }

    /// Relay-only restrictions: standard minus mandatory
    pub fn standard_not_mandatory() -> Self {
        Self::standard().without_mandatory()
    }

    /// This set with every mandatory flag cleared
    pub fn without_mandatory(self) -> Self {
        self.difference(Self::mandatory())
    }

    pub fn requires_low_s(&self) -> bool {
        self.contains(Self::LOW_S)
    }

    pub fn requires_strict_der(&self) -> bool {
        self.contains(Self::DERSIG)
    }

    pub fn requires_clean_stack(&self) -> bool {
        self.contains(Self::CLEANSTACK)
    }

    pub fn requires_minimal_data(&self) -> bool {
        self.contains(Self::MINIMALDATA)
    }

    pub fn requires_null_fail(&self) -> bool {
        self.contains(Self::NULLFAIL)
    }

    pub fn genesis_enabled(&self) -> bool {
        self.contains(Self::GENESIS)
    }

    pub fn utxo_after_genesis(&self) -> bool {
        self.contains(Self::UTXO_AFTER_GENESIS)
    }
}

/// StandardScriptVerifyFlags: 𝔹 × 𝔹 → flags
///
/// The standard set, plus `UTXO_AFTER_GENESIS` when the spent output is
/// post-Genesis and `GENESIS` when the upgrade is active. Both only add bits.
pub fn standard_script_verify_flags(genesis_enabled: bool, utxo_after_genesis: bool) -> ScriptVerifyFlags {
    let mut flags = ScriptVerifyFlags::standard();
    if utxo_after_genesis {
        flags |= ScriptVerifyFlags::UTXO_AFTER_GENESIS;
    }
    if genesis_enabled {
        flags |= ScriptVerifyFlags::GENESIS;
    }
    flags
}

/// Flags used for non-final transaction checks
pub fn standard_non_final_verify_flags(genesis_enabled: bool) -> LockTimeFlags {
    let mut flags = LockTimeFlags::MEDIAN_TIME_PAST;
    if !genesis_enabled {
        flags |= LockTimeFlags::VERIFY_SEQUENCE;
    }
    flags
}
