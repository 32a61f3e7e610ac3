//! Tests for transaction and input standardness

use relay_policy::inputs::are_inputs_standard;
use relay_policy::policy::is_standard_tx;
use relay_policy::script::*;
use relay_policy::standard::{classify_output_script, solve};
use relay_policy::*;
use serde_json::json;

const GENESIS_HEIGHT: Natural = 1_000;

fn activation() -> GenesisActivation {
    GenesisActivation::at_height(GENESIS_HEIGHT)
}

fn key(tag: u8) -> Vec<u8> {
    let mut key = vec![0x03];
    key.extend_from_slice(&[tag; 32]);
    key
}

fn push(data: &[u8]) -> Vec<u8> {
    assert!(data.len() <= 75);
    let mut script = vec![data.len() as u8];
    script.extend_from_slice(data);
    script
}

fn multisig(required: u8, keys: u8) -> Vec<u8> {
    let mut script = vec![OP_1 + required - 1];
    for tag in 0..keys {
        script.extend(push(&key(tag)));
    }
    script.extend_from_slice(&[OP_1 + keys - 1, OP_CHECKMULTISIG]);
    script
}

fn p2pkh(tag: u8) -> Vec<u8> {
    let mut script = vec![OP_DUP, OP_HASH160, 20];
    script.extend_from_slice(&[tag; 20]);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

fn tx_with_outputs(outputs: Vec<TransactionOutput>) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TransactionInput {
            prevout: OutPoint { hash: [8; 32], index: 1 },
            script_sig: push(&[0x30; 72]),
            sequence: 0xfffffffe,
        }],
        outputs,
        lock_time: 0,
    }
}

fn out(value: i64, script_pubkey: Vec<u8>) -> TransactionOutput {
    TransactionOutput { value: Amount(value), script_pubkey }
}

#[test]
fn test_multisig_key_limit_depends_on_epoch() -> anyhow::Result<()> {
    let config = PolicyConfig::default();
    let fees = FeeRates::default();
    let tx = tx_with_outputs(vec![out(10_000, multisig(2, 5))]);

    let before = is_standard_tx(&tx, GENESIS_HEIGHT - 1, &activation(), &config, &fees)?;
    assert_eq!(before.reason(), Some(RejectReason::ScriptPubKey));

    let after = is_standard_tx(&tx, GENESIS_HEIGHT, &activation(), &config, &fees)?;
    assert!(after.is_accepted());
    Ok(())
}

#[test]
fn test_configured_multisig_limit() -> anyhow::Result<()> {
    let config: PolicyConfig = serde_json::from_value(json!({ "max_pubkeys_per_multisig_policy": 4 }))?;
    config.validate()?;
    assert_eq!(
        classify_output_script(&multisig(1, 4), true, &config),
        ScriptTemplate::BareMultisig { required: 1, keys: 4 }
    );
    assert_eq!(classify_output_script(&multisig(1, 5), true, &config), ScriptTemplate::Nonstandard);
    Ok(())
}

#[test]
fn test_template_shapes() {
    assert_eq!(solve(&p2pkh(1), false), ScriptTemplate::PubKeyHash);
    assert_eq!(solve(&multisig(1, 1), false), ScriptTemplate::BareMultisig { required: 1, keys: 1 });
    assert_eq!(solve(&[OP_FALSE, OP_RETURN], true), ScriptTemplate::NullData);
    assert_eq!(solve(&[OP_1, OP_1, OP_EQUAL], false), ScriptTemplate::Nonstandard);
}

#[test]
fn test_data_carrier_disabled() -> anyhow::Result<()> {
    let config: PolicyConfig = serde_json::from_value(json!({ "accept_datacarrier": false }))?;
    let tx = tx_with_outputs(vec![out(10_000, p2pkh(2)), out(0, vec![OP_FALSE, OP_RETURN, 0x01, 0x42])]);
    let result = is_standard_tx(&tx, 1, &activation(), &config, &FeeRates::default())?;
    assert_eq!(result.reason(), Some(RejectReason::ScriptPubKey));
    Ok(())
}

#[test]
fn test_larger_data_carrier_size() -> anyhow::Result<()> {
    let config: PolicyConfig = serde_json::from_value(json!({ "data_carrier_size": 100000 }))?;
    let mut script = vec![OP_FALSE, OP_RETURN, OP_PUSHDATA2, 0x10, 0x27];
    script.extend_from_slice(&[0xee; 10_000]);
    let tx = tx_with_outputs(vec![out(10_000, p2pkh(2)), out(0, script)]);

    assert!(is_standard_tx(&tx, 1, &activation(), &config, &FeeRates::default())?.is_accepted());
    let default = is_standard_tx(&tx, 1, &activation(), &PolicyConfig::default(), &FeeRates::default())?;
    assert_eq!(default.reason(), Some(RejectReason::DataCarrierSize));
    Ok(())
}

#[test]
fn test_legacy_op_return_after_genesis() -> anyhow::Result<()> {
    // Plain OP_RETURN data is only a data carrier for outputs created before Genesis
    let tx = tx_with_outputs(vec![out(10_000, p2pkh(2)), out(0, vec![OP_RETURN, 0x01, 0x42])]);
    let config = PolicyConfig::default();
    let fees = FeeRates::default();

    assert!(is_standard_tx(&tx, 1, &activation(), &config, &fees)?.is_accepted());
    let after = is_standard_tx(&tx, GENESIS_HEIGHT, &activation(), &config, &fees)?;
    assert_eq!(after.reason(), Some(RejectReason::ScriptPubKey));
    Ok(())
}

#[test]
fn test_dust_threshold_scales_with_rate() -> anyhow::Result<()> {
    let output = out(0, p2pkh(1));
    let low = fees::dust_threshold(&output, FeeRate::from_sat_per_kb(1000), false)?;
    let high = fees::dust_threshold(&output, FeeRate::from_sat_per_kb(3000), false)?;
    assert_eq!(low, Amount(546));
    assert_eq!(high, Amount(1638));
    Ok(())
}

#[test]
fn test_p2sh_spend_of_bare_multisig_redeem() -> anyhow::Result<()> {
    let redeem = multisig(2, 2);
    let mut script_pubkey = vec![OP_HASH160, 20];
    script_pubkey.extend_from_slice(&hash160(&redeem));
    script_pubkey.push(OP_EQUAL);

    let prevout = OutPoint { hash: [5; 32], index: 2 };
    let mut coins = UtxoSet::new();
    coins.insert(prevout.clone(), Coin { output: out(20_000, script_pubkey), height: 10 });

    let mut script_sig = vec![OP_0];
    script_sig.extend(push(&[0x30; 71]));
    script_sig.extend(push(&[0x30; 71]));
    script_sig.extend(push(&redeem));

    let tx = Transaction {
        version: 1,
        inputs: vec![TransactionInput { prevout, script_sig, sequence: 0xffffffff }],
        outputs: vec![out(15_000, p2pkh(3))],
        lock_time: 0,
    };
    let config = PolicyConfig::default();
    assert!(are_inputs_standard(&tx, &coins, GENESIS_HEIGHT, &activation(), &config)?.is_accepted());
    assert!(is_standard_tx(&tx, GENESIS_HEIGHT, &activation(), &config, &FeeRates::default())?.is_accepted());
    Ok(())
}

#[test]
fn test_reject_reason_codes() {
    let codes = [
        (RejectReason::Version, "version"),
        (RejectReason::TxSize, "tx-size"),
        (RejectReason::ScriptSigSize, "scriptsig-size"),
        (RejectReason::ScriptSigNotPushOnly, "scriptsig-not-pushonly"),
        (RejectReason::TxSigops, "tx-sigops"),
        (RejectReason::ScriptPubKey, "scriptpubkey"),
        (RejectReason::BareMultisig, "bare-multisig"),
        (RejectReason::MultiOpReturn, "multi-op-return"),
        (RejectReason::DataCarrierSize, "datacarrier-size-exceeded"),
        (RejectReason::Dust, "dust"),
        (RejectReason::MissingInputs, "missing-inputs"),
        (RejectReason::NonstandardInput, "nonstandard-input"),
        (RejectReason::ScriptSigArgs, "scriptsig-args"),
        (RejectReason::ScriptSigSigops, "scriptsig-sigops"),
        (RejectReason::BadRedeemScript, "bad-redeem-script"),
    ];
    for (reason, code) in codes {
        assert_eq!(reason.to_string(), code);
        assert_eq!(reason.as_str(), code);
    }
    let distinct: std::collections::HashSet<_> = codes.iter().map(|(_, code)| *code).collect();
    assert_eq!(distinct.len(), codes.len());
}
