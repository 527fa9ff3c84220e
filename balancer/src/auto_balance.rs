//! The balancing orchestrator: from a draft to a submittable body.
//!
//! Sizing runs against a pessimistic rendition of the final body, with
//! the fee and change fields pinned to their widest encodings, so the
//! fee computed from it can only over-cover the bytes the real body
//! occupies. The caller's draft is never mutated; every stage derives
//! a new value.

use std::collections::BTreeMap;

use entasis_common::{
    Address, Era, ExUnits, GenesisValues, Lovelace, NativeAsset, PoolId, ProtocolParams,
    ScriptValidity, StakeAddress, StakeCredential, TransactionDraft, TxOutput, UTxOSnapshot,
    Value,
};
use tracing::{debug, warn};

use crate::{
    balance::evaluate_transaction_balance,
    collateral::{calculate_collateral, CollateralPlan},
    error::TxBalanceError,
    evaluation::{evaluate_transaction_execution_units, ScriptOracle},
    fee::{ref_script_fee, script_fee, transaction_fee},
    min_utxo::calculate_minimum_utxo,
    witness::estimate_key_witness_count,
};

/// Fee placeholder used while sizing, pinned to the widest plausible
/// fee encoding. Not derived from parameters.
pub const MAX_FEE_PLACEHOLDER: Lovelace = (1 << 32) - 1;

/// Change placeholder used while sizing, the widest u64 encoding
pub const MAX_CHANGE_LOVELACE: Lovelace = u64::MAX;

/// A fully balanced transaction: the final body, the fee it pays and
/// the change it returns
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BalancedTransaction {
    pub tx: TransactionDraft,
    pub fee: Lovelace,
    pub change: Value,
}

/// Ledger-state lookups the balance computation needs for certificate
/// deposits and refunds
pub struct LedgerDeposits<'a> {
    pub stake_deposit_refund: &'a dyn Fn(&StakeAddress) -> Option<Lovelace>,
    pub drep_deposit_refund: &'a dyn Fn(&StakeCredential) -> Option<Lovelace>,
    pub is_pool_registered: &'a dyn Fn(&PoolId) -> bool,
}

impl LedgerDeposits<'static> {
    /// No ledger access: refunds fall back to current parameter values
    /// and every pool registration pays a deposit
    pub fn unknown() -> Self {
        Self {
            stake_deposit_refund: &|_| None,
            drep_deposit_refund: &|_| None,
            is_pool_registered: &|_| false,
        }
    }
}

/// Balance a draft transaction end to end: evaluate its scripts, work
/// out the fee from a worst-case sized body, attach collateral, verify
/// every output meets the era minimum and emit the change output.
#[allow(clippy::too_many_arguments)]
pub fn make_transaction_body_auto_balance(
    era: Era,
    current_slot: u64,
    genesis: &GenesisValues,
    params: &ProtocolParams,
    utxo: &UTxOSnapshot,
    draft: &TransactionDraft,
    change_address: &Address,
    oracle: &dyn ScriptOracle,
    deposits: &LedgerDeposits<'_>,
    key_witness_override: Option<u64>,
) -> Result<BalancedTransaction, TxBalanceError> {
    let shelley = params.shelley()?;
    let plutus = era.plutus();
    let has_scripts = draft.has_script_witnesses();

    if has_scripts && plutus.is_none() {
        return Err(TxBalanceError::Body(format!(
            "draft carries script witnesses but the {era} era does not support scripts"
        )));
    }

    // Evaluation sees the shape of the final body, so probe with a
    // zero-value change output appended
    let probe = draft.with_appended_output(TxOutput::to_address(
        change_address.clone(),
        Value::coin_only(0),
    ));
    let evaluated = evaluate_transaction_execution_units(
        era,
        current_slot,
        genesis,
        params,
        utxo,
        &probe,
        oracle,
    )?;

    let units = match draft.script_validity {
        ScriptValidity::Valid => {
            let failures: Vec<_> = evaluated
                .iter()
                .filter_map(|(p, r)| r.as_ref().err().map(|e| (*p, e.clone())))
                .collect();
            if !failures.is_empty() {
                warn!(count = failures.len(), "script evaluation failed");
                return Err(TxBalanceError::ScriptExecutionFailures(failures));
            }
            let mut units = BTreeMap::new();
            for (pointer, result) in evaluated {
                if let Ok(consumed) = result {
                    units.insert(pointer, consumed);
                }
            }
            units
        }
        ScriptValidity::Invalid => {
            // An empty evaluation also means nothing failed
            if evaluated.values().all(|r| r.is_ok()) {
                return Err(TxBalanceError::ScriptsExpectedToFailSucceeded);
            }
            // Phase-2-invalid transactions carry zero budgets; the
            // ledger only checks their collateral
            draft
                .script_witnesses()
                .keys()
                .map(|p| (*p, ExUnits::zero()))
                .collect()
        }
    };

    for pointer in draft.script_witnesses().keys() {
        if !units.contains_key(pointer) {
            return Err(TxBalanceError::MissingExecutionUnits(*pointer));
        }
    }
    let exec_draft = draft.with_ex_units(&units);

    // Preliminary balance, only to learn which non-ada assets the
    // change output will have to carry at its widest
    let preliminary = evaluate_transaction_balance(
        params,
        deposits.stake_deposit_refund,
        deposits.drep_deposit_refund,
        deposits.is_pool_registered,
        utxo,
        &exec_draft.with_fee(0),
    )?;
    let surplus_assets = positive_assets(&preliminary);

    let mut sizing = exec_draft.with_fee(MAX_FEE_PLACEHOLDER);
    sizing.outputs.push(TxOutput::to_address(
        change_address.clone(),
        Value::new(MAX_CHANGE_LOVELACE, surplus_assets),
    ));
    if plutus.is_some()
        && has_scripts
        && !draft.collateral_inputs.is_empty()
        && draft.total_collateral.is_none()
        && draft.collateral_return.is_none()
    {
        let mut collateral_value = Value::default();
        for input in &draft.collateral_inputs {
            collateral_value += &utxo.resolve(input)?.value;
        }
        sizing.total_collateral = Some(MAX_FEE_PLACEHOLDER);
        sizing.collateral_return = Some(TxOutput::to_address(
            change_address.clone(),
            Value::new(MAX_CHANGE_LOVELACE, collateral_value.assets),
        ));
    }

    let witness_count =
        key_witness_override.unwrap_or_else(|| estimate_key_witness_count(utxo, draft));
    let size = entasis_codec::encoded_tx_size(&sizing, witness_count);

    let mut fee = transaction_fee(size, shelley.minfee_a, shelley.minfee_b);
    if has_scripts {
        let total_units = exec_draft
            .total_ex_units()
            .ok_or_else(|| TxBalanceError::Body("execution units overflow".into()))?;
        fee = fee.saturating_add(script_fee(&params.alonzo()?.execution_prices, total_units));
    }
    if let Some(conway) = &params.conway {
        fee = fee.saturating_add(ref_script_fee(conway, reference_script_bytes(utxo, draft)));
    }
    debug!(size, witness_count, fee, "fee from worst-case sizing");

    let balanced_base = match (&plutus, has_scripts) {
        (Some(plutus), true) => {
            let plan = calculate_collateral(plutus, params, utxo, &exec_draft, fee, change_address)?;
            let CollateralPlan {
                total_collateral,
                return_collateral,
            } = plan;
            exec_draft.with_fee(fee).with_collateral(total_collateral, return_collateral)
        }
        _ => exec_draft.with_fee(fee),
    };

    for (output_index, output) in draft.outputs.iter().enumerate() {
        let minimum = calculate_minimum_utxo(output, params, era)?;
        if output.value.lovelace < minimum {
            return Err(TxBalanceError::MinUtxoNotMet {
                output_index,
                minimum,
                actual: output.value.lovelace,
            });
        }
    }

    let mut delta = evaluate_transaction_balance(
        params,
        deposits.stake_deposit_refund,
        deposits.drep_deposit_refund,
        deposits.is_pool_registered,
        utxo,
        &balanced_base,
    )?;
    delta.normalize();

    if delta.lovelace < 0 || delta.has_negative_assets() {
        return Err(TxBalanceError::BalanceNegative(delta));
    }
    if delta.is_zero() {
        debug!(fee, "balanced with no change output");
        return Ok(BalancedTransaction {
            tx: balanced_base,
            fee,
            change: Value::coin_only(0),
        });
    }
    if delta.lovelace == 0 {
        return Err(TxBalanceError::NonAdaBalance(delta));
    }

    let change_value = delta.to_value().map_err(|e| TxBalanceError::Body(e.to_string()))?;
    let change_output = TxOutput::to_address(change_address.clone(), change_value.clone());
    let minimum = calculate_minimum_utxo(&change_output, params, era)?;
    if change_value.lovelace < minimum {
        return Err(TxBalanceError::BalanceBelowMinUtxo {
            output_index: draft.outputs.len(),
            minimum,
            actual: change_value.lovelace,
        });
    }

    debug!(fee, change = change_value.lovelace, "transaction balanced");
    Ok(BalancedTransaction {
        tx: balanced_base.with_appended_output(change_output),
        fee,
        change: change_value,
    })
}

/// Positive non-ada part of a signed delta, as native assets
fn positive_assets(delta: &entasis_common::ValueDelta) -> entasis_common::NativeAssets {
    let mut assets = Vec::new();
    for (policy, entries) in &delta.assets {
        let positive: Vec<NativeAsset> = entries
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(name, amount)| NativeAsset {
                name: *name,
                amount: *amount as u64,
            })
            .collect();
        if !positive.is_empty() {
            assets.push((*policy, positive));
        }
    }
    assets
}

/// Total bytes of reference scripts reachable from the draft's inputs
/// and reference inputs
fn reference_script_bytes(utxo: &UTxOSnapshot, draft: &TransactionDraft) -> u64 {
    draft
        .reference_inputs
        .iter()
        .chain(draft.inputs.iter().map(|i| &i.utxo))
        .filter_map(|id| utxo.get(id))
        .filter_map(|resolved| resolved.script_ref.as_ref())
        .map(|script| script.bytes.len() as u64)
        .sum()
}
