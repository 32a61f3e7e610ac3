//! Tests for runtime fee policy updates

use relay_policy::*;
use std::thread;

fn payment(value: i64) -> Transaction {
    let mut script_pubkey = vec![0x76, 0xa9, 20];
    script_pubkey.extend_from_slice(&[6; 20]);
    script_pubkey.extend_from_slice(&[0x88, 0xac]);
    Transaction {
        version: 1,
        inputs: vec![TransactionInput {
            prevout: OutPoint { hash: [4; 32], index: 0 },
            script_sig: vec![0x01, 0x01],
            sequence: 0xffffffff,
        }],
        outputs: vec![TransactionOutput { value: Amount(value), script_pubkey }],
        lock_time: 0,
    }
}

#[test]
fn test_snapshot_survives_update() {
    let policy = FeeRatePolicy::default();
    let snapshot = policy.snapshot();
    policy.update(FeeRates {
        incremental_relay_fee: FeeRate::from_sat_per_kb(10),
        dust_relay_fee: FeeRate::from_sat_per_kb(10),
        bytes_per_sigop: 10,
    });

    // Held snapshot keeps the values it was taken with
    assert_eq!(*snapshot, FeeRates::default());
    assert_eq!(policy.snapshot().bytes_per_sigop, 10);
}

#[test]
fn test_validation_during_concurrent_updates() {
    let engine = PolicyEngine::with_defaults(Network::Regtest);
    let activation = GenesisActivation::at_height(0);
    // Dust at 546 under 1000 sat/kB, not dust under 500 sat/kB
    let tx = payment(400);

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..100 {
                let rate = if i % 2 == 0 { 500 } else { 1000 };
                engine.fee_policy().set_dust_relay_fee(FeeRate::from_sat_per_kb(rate));
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let result = engine.is_standard_tx(&tx, 1, &activation).unwrap();
                    assert!(result.is_accepted() || result.reason() == Some(RejectReason::Dust));
                }
            });
        }
    });
}

#[test]
fn test_incremental_relay_fee_for_replacement() -> anyhow::Result<()> {
    let engine = PolicyEngine::with_defaults(Network::Main);
    let tx = payment(10_000);
    let vsize = engine.virtual_size(&tx);

    assert_eq!(engine.fee_rates().replacement_fee_increment(vsize)?, Amount(vsize as i64));
    engine.fee_policy().set_incremental_relay_fee(FeeRate::from_sat_per_kb(5_000));
    assert_eq!(engine.fee_rates().replacement_fee_increment(vsize)?, Amount(5 * vsize as i64));
    Ok(())
}

#[test]
fn test_fee_rates_serde() -> anyhow::Result<()> {
    let rates: FeeRates = serde_json::from_str(
        r#"{"incremental_relay_fee": 250, "dust_relay_fee": 1000, "bytes_per_sigop": 40}"#,
    )?;
    assert_eq!(rates.incremental_relay_fee, FeeRate::from_sat_per_kb(250));
    assert_eq!(rates.virtual_size(100, 5), 200);
    assert_eq!(rates.incremental_relay_fee.to_string(), "250 sat/kB");
    Ok(())
}
