//! End-to-end balancing scenarios.

use entasis_balancer::{
    make_transaction_body_auto_balance, required_collateral, LedgerDeposits, OracleError,
    ScriptCall, ScriptOracle, TxBalanceError,
};
use entasis_common::{
    Address, AddressNetwork, AlonzoParams, AssetName, BabbageParams, CostModel, Era, ExUnitPrices,
    ExUnits, GenesisValues, Hash, NativeAsset, PlutusScript, PolicyId, ProtocolParams,
    RationalNumber, ScriptLang, ScriptSource, ScriptValidity, ScriptWitness, ShelleyAddress,
    ShelleyAddressDelegationPart, ShelleyAddressPaymentPart, ShelleyParams, TransactionDraft,
    TxInput, TxOutput, UTxOIdentifier, UTxOSnapshot, UTxOValue, Value,
};

/// Deterministic stand-in for the Plutus VM: the first redeemer byte
/// selects the outcome. 0xff fails, anything else consumes units
/// proportional to the byte.
struct ByRedeemerOracle;

impl ScriptOracle for ByRedeemerOracle {
    fn evaluate(&self, call: ScriptCall<'_>) -> Result<ExUnits, OracleError> {
        match call.redeemer.first() {
            Some(0xff) => Err(OracleError::Evaluation {
                logs: vec!["validator returned False".into()],
            }),
            Some(byte) => Ok(ExUnits::new(*byte as u64 * 100, *byte as u64 * 1000)),
            None => Ok(ExUnits::zero()),
        }
    }
}

fn key_address(byte: u8) -> Address {
    Address::Shelley(ShelleyAddress {
        network: AddressNetwork::Main,
        payment: ShelleyAddressPaymentPart::PaymentKeyHash(Hash::new([byte; 28])),
        delegation: ShelleyAddressDelegationPart::StakeKeyHash(Hash::new([byte; 28])),
    })
}

fn key_utxo(byte: u8, lovelace: u64) -> UTxOValue {
    UTxOValue {
        address: key_address(byte),
        value: Value::coin_only(lovelace),
        datum: None,
        script_ref: None,
    }
}

fn script(byte: u8) -> PlutusScript {
    PlutusScript {
        lang: ScriptLang::PlutusV2,
        bytes: vec![byte],
    }
}

fn script_utxo(locking: &PlutusScript, lovelace: u64) -> UTxOValue {
    UTxOValue {
        address: Address::Shelley(ShelleyAddress {
            network: AddressNetwork::Main,
            payment: ShelleyAddressPaymentPart::ScriptHash(locking.compute_hash()),
            delegation: ShelleyAddressDelegationPart::None,
        }),
        value: Value::coin_only(lovelace),
        datum: None,
        script_ref: None,
    }
}

fn script_witness(redeemer_byte: u8, locking: &PlutusScript) -> ScriptWitness {
    ScriptWitness {
        source: ScriptSource::Provided(locking.clone()),
        datum: None,
        redeemer: vec![redeemer_byte],
        ex_units: ExUnits::zero(),
    }
}

fn params() -> ProtocolParams {
    ProtocolParams {
        shelley: Some(ShelleyParams {
            minfee_a: 44,
            minfee_b: 155381,
            max_tx_size: 16384,
            key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            min_utxo_value: 1_000_000,
        }),
        alonzo: Some(AlonzoParams {
            lovelace_per_utxo_word: 34_482,
            execution_prices: ExUnitPrices {
                mem_price: RationalNumber::new(577, 10_000),
                step_price: RationalNumber::new(721, 10_000_000),
            },
            max_tx_ex_units: ExUnits::new(14_000_000, 10_000_000_000),
            max_block_ex_units: ExUnits::new(62_000_000, 20_000_000_000),
            max_value_size: 5000,
            collateral_percentage: 150,
            max_collateral_inputs: 3,
            plutus_v1_cost_model: None,
        }),
        babbage: Some(BabbageParams {
            coins_per_utxo_byte: 4310,
            plutus_v2_cost_model: Some(CostModel::new(vec![1, 2, 3])),
        }),
        conway: None,
    }
}

fn balance(
    draft: &TransactionDraft,
    utxo: &UTxOSnapshot,
) -> Result<entasis_balancer::BalancedTransaction, TxBalanceError> {
    make_transaction_body_auto_balance(
        Era::Babbage,
        1_000_000,
        &GenesisValues::mainnet(),
        &params(),
        utxo,
        draft,
        &key_address(0xc0),
        &ByRedeemerOracle,
        &LedgerDeposits::unknown(),
        None,
    )
}

fn simple_draft(n_inputs: u8, output_lovelace: u64) -> (TransactionDraft, UTxOSnapshot) {
    let mut inputs = Vec::new();
    let mut entries = Vec::new();
    for i in 0..n_inputs {
        let id = UTxOIdentifier::new(Hash::new([i + 1; 32]), 0);
        inputs.push(TxInput::key_witnessed(id));
        entries.push((id, key_utxo(i + 1, 10_000_000)));
    }
    let draft = TransactionDraft {
        inputs,
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(output_lovelace),
        )],
        ..Default::default()
    };
    (draft, UTxOSnapshot::new(entries))
}

#[test]
fn fee_grows_with_transaction_size() {
    let (small_draft, small_utxo) = simple_draft(1, 5_000_000);
    let (large_draft, large_utxo) = simple_draft(3, 5_000_000);

    let small = balance(&small_draft, &small_utxo).unwrap();
    let large = balance(&large_draft, &large_utxo).unwrap();
    assert!(large.fee > small.fee);
}

#[test]
fn balancing_is_idempotent() {
    let (draft, utxo) = simple_draft(1, 5_000_000);
    let first = balance(&draft, &utxo).unwrap();

    // Strip the appended change output and run the result again
    let mut stripped = first.tx.clone();
    stripped.outputs.pop();
    let second = balance(&stripped, &utxo).unwrap();

    assert_eq!(second.fee, first.fee);
    assert_eq!(second.change, first.change);
    assert_eq!(second.tx, first.tx);
}

#[test]
fn exact_balance_emits_no_change_output() {
    let (draft, utxo) = simple_draft(1, 5_000_000);
    let probe = balance(&draft, &utxo).unwrap();

    // Grow the payment so input = output + fee exactly
    let mut exact = draft.clone();
    exact.outputs[0].value = Value::coin_only(5_000_000 + probe.change.lovelace);
    let result = balance(&exact, &utxo).unwrap();

    assert_eq!(result.fee, probe.fee);
    assert_eq!(result.change, Value::coin_only(0));
    assert_eq!(result.tx.outputs.len(), 1);
}

#[test]
fn deficit_is_reported_with_exact_shortfall() {
    let (draft, utxo) = simple_draft(1, 5_000_000);
    let probe = balance(&draft, &utxo).unwrap();

    // One lovelace more than the inputs can cover
    let mut overdrawn = draft.clone();
    overdrawn.outputs[0].value = Value::coin_only(5_000_000 + probe.change.lovelace + 1);
    let result = balance(&overdrawn, &utxo);

    match result {
        Err(TxBalanceError::BalanceNegative(delta)) => assert_eq!(delta.lovelace, -1),
        other => panic!("expected BalanceNegative, got {other:?}"),
    }
}

#[test]
fn change_below_minimum_utxo_is_rejected() {
    let (draft, utxo) = simple_draft(1, 5_000_000);
    let probe = balance(&draft, &utxo).unwrap();

    // Leave ten lovelace of change, far below the Babbage minimum
    let mut tight = draft.clone();
    tight.outputs[0].value = Value::coin_only(5_000_000 + probe.change.lovelace - 10);
    let result = balance(&tight, &utxo);

    match result {
        Err(TxBalanceError::BalanceBelowMinUtxo {
            output_index,
            minimum,
            actual,
        }) => {
            assert_eq!(output_index, 1);
            assert_eq!(actual, 10);
            assert!(minimum > 10);
        }
        other => panic!("expected BalanceBelowMinUtxo, got {other:?}"),
    }
}

#[test]
fn caller_output_below_minimum_utxo_is_rejected() {
    let (mut draft, utxo) = simple_draft(1, 5_000_000);
    draft.outputs[0].value = Value::coin_only(5);
    let result = balance(&draft, &utxo);

    match result {
        Err(TxBalanceError::MinUtxoNotMet {
            output_index,
            actual,
            ..
        }) => {
            assert_eq!(output_index, 0);
            assert_eq!(actual, 5);
        }
        other => panic!("expected MinUtxoNotMet, got {other:?}"),
    }
}

#[test]
fn collateral_covers_the_required_percentage() {
    let locking = script(3);
    let spend = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let coll = UTxOIdentifier::new(Hash::new([2; 32]), 0);
    let utxo = UTxOSnapshot::new([
        (spend, script_utxo(&locking, 20_000_000)),
        (coll, key_utxo(9, 10_000_000)),
    ]);
    let draft = TransactionDraft {
        inputs: vec![TxInput::script_witnessed(spend, script_witness(3, &locking))],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        collateral_inputs: vec![coll],
        ..Default::default()
    };

    let result = balance(&draft, &utxo).unwrap();
    let required = required_collateral(result.fee, 150);
    assert_eq!(result.tx.total_collateral, Some(required));
    assert_eq!(
        result.tx.collateral_return.as_ref().unwrap().value,
        Value::coin_only(10_000_000 - required)
    );
}

#[test]
fn redeemer_indices_survive_out_of_order_inputs() {
    let script_a = script(3);
    let script_b = script(5);
    // Declared in the opposite of canonical order
    let late = UTxOIdentifier::new(Hash::new([9; 32]), 0);
    let early = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let utxo = UTxOSnapshot::new([
        (late, script_utxo(&script_a, 20_000_000)),
        (early, script_utxo(&script_b, 20_000_000)),
    ]);
    let draft = TransactionDraft {
        inputs: vec![
            TxInput::script_witnessed(late, script_witness(3, &script_a)),
            TxInput::script_witnessed(early, script_witness(5, &script_b)),
        ],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        ..Default::default()
    };

    let result = balance(&draft, &utxo).unwrap();

    // Each input must have received the units its own redeemer earned,
    // regardless of declaration order
    for input in &result.tx.inputs {
        let expected = if input.utxo == late {
            ExUnits::new(300, 3000)
        } else {
            ExUnits::new(500, 5000)
        };
        match &input.witness {
            entasis_common::InputWitness::Script(w) => assert_eq!(w.ex_units, expected),
            other => panic!("expected script witness, got {other:?}"),
        }
    }
}

#[test]
fn all_script_failures_are_aggregated() {
    let script_a = script(0xff);
    let script_b = script(0xff);
    let a = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let b = UTxOIdentifier::new(Hash::new([2; 32]), 1);
    let utxo = UTxOSnapshot::new([
        (a, script_utxo(&script_a, 20_000_000)),
        (b, script_utxo(&script_b, 20_000_000)),
    ]);
    let draft = TransactionDraft {
        inputs: vec![
            TxInput::script_witnessed(a, script_witness(0xff, &script_a)),
            TxInput::script_witnessed(b, script_witness(0xff, &script_b)),
        ],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        ..Default::default()
    };

    match balance(&draft, &utxo) {
        Err(TxBalanceError::ScriptExecutionFailures(failures)) => {
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected aggregated failures, got {other:?}"),
    }
}

#[test]
fn expected_failure_substitutes_zero_units() {
    let locking = script(0xff);
    let spend = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let utxo = UTxOSnapshot::new([(spend, script_utxo(&locking, 20_000_000))]);
    let draft = TransactionDraft {
        inputs: vec![TxInput::script_witnessed(
            spend,
            script_witness(0xff, &locking),
        )],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        script_validity: ScriptValidity::Invalid,
        ..Default::default()
    };

    let result = balance(&draft, &utxo).unwrap();
    match &result.tx.inputs[0].witness {
        entasis_common::InputWitness::Script(w) => assert_eq!(w.ex_units, ExUnits::zero()),
        other => panic!("expected script witness, got {other:?}"),
    }
}

#[test]
fn expected_failure_that_succeeds_is_an_error() {
    let locking = script(3);
    let spend = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let utxo = UTxOSnapshot::new([(spend, script_utxo(&locking, 20_000_000))]);
    let draft = TransactionDraft {
        inputs: vec![TxInput::script_witnessed(spend, script_witness(3, &locking))],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        script_validity: ScriptValidity::Invalid,
        ..Default::default()
    };

    assert_eq!(
        balance(&draft, &utxo),
        Err(TxBalanceError::ScriptsExpectedToFailSucceeded)
    );
}

fn token(policy_byte: u8, name: &[u8], amount: u64) -> (PolicyId, Vec<NativeAsset>) {
    (
        Hash::new([policy_byte; 28]),
        vec![NativeAsset {
            name: AssetName::new(name).unwrap(),
            amount,
        }],
    )
}

#[test]
fn change_output_carries_surplus_assets() {
    let id = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let utxo = UTxOSnapshot::new([(
        id,
        UTxOValue {
            address: key_address(1),
            value: Value::new(10_000_000, vec![token(7, b"tok", 4)]),
            datum: None,
            script_ref: None,
        },
    )]);
    let draft = TransactionDraft {
        inputs: vec![TxInput::key_witnessed(id)],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        ..Default::default()
    };

    let result = balance(&draft, &utxo).unwrap();
    let change = result.tx.outputs.last().unwrap();
    assert_eq!(change.value, result.change);
    assert_eq!(change.value.assets, vec![token(7, b"tok", 4)]);
    assert_eq!(change.value.lovelace, 10_000_000 - 5_000_000 - result.fee);
}

#[test]
fn leftover_assets_without_lovelace_fail_as_non_ada_balance() {
    let id = UTxOIdentifier::new(Hash::new([1; 32]), 0);
    let utxo = UTxOSnapshot::new([(
        id,
        UTxOValue {
            address: key_address(1),
            value: Value::new(10_000_000, vec![token(7, b"tok", 4)]),
            datum: None,
            script_ref: None,
        },
    )]);
    let draft = TransactionDraft {
        inputs: vec![TxInput::key_witnessed(id)],
        outputs: vec![TxOutput::to_address(
            key_address(0xaa),
            Value::coin_only(5_000_000),
        )],
        ..Default::default()
    };
    let probe = balance(&draft, &utxo).unwrap();

    // Absorb all surplus lovelace into the payment, leaving the tokens
    // with nothing to ride on
    let mut drained = draft.clone();
    drained.outputs[0].value = Value::coin_only(5_000_000 + probe.change.lovelace);
    let result = balance(&drained, &utxo);

    match result {
        Err(TxBalanceError::NonAdaBalance(delta)) => {
            assert_eq!(delta.lovelace, 0);
            assert!(!delta.ada_only());
        }
        other => panic!("expected NonAdaBalance, got {other:?}"),
    }
}

#[test]
fn expecting_failure_with_no_scripts_is_an_error() {
    let (mut draft, utxo) = simple_draft(1, 5_000_000);
    draft.script_validity = ScriptValidity::Invalid;

    assert_eq!(
        balance(&draft, &utxo),
        Err(TxBalanceError::ScriptsExpectedToFailSucceeded)
    );
}

#[test]
fn caller_output_order_is_preserved_and_change_is_last() {
    let (mut draft, utxo) = simple_draft(1, 2_000_000);
    draft.outputs.push(TxOutput::to_address(
        key_address(0xbb),
        Value::coin_only(2_000_000),
    ));

    let result = balance(&draft, &utxo).unwrap();
    assert_eq!(result.tx.outputs.len(), 3);
    assert_eq!(result.tx.outputs[0].address, key_address(0xaa));
    assert_eq!(result.tx.outputs[1].address, key_address(0xbb));
    assert_eq!(result.tx.outputs[2].address, key_address(0xc0));
    assert_eq!(result.tx.outputs[2].value, result.change);
}
