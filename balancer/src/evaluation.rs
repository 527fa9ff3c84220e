//! Execution unit evaluation over an external script oracle.
//!
//! The engine never interprets Plutus itself. It locates every script
//! the draft needs, pairs it with its datum, redeemer and cost model,
//! and hands each one to the oracle. Structural problems (missing
//! scripts, datums, cost models) are detected here so they carry a
//! precise per-redeemer error instead of an opaque VM failure.

use std::collections::{BTreeMap, BTreeSet};

use entasis_common::{
    crypto::datum_hash, scripts_needed_from_certificates, scripts_needed_from_inputs,
    scripts_needed_from_mint, scripts_needed_from_withdrawals, CostModel, Datum, Era,
    ExUnits, GenesisValues, PlutusScript, ProtocolParams, RedeemerPointer, RedeemerTag,
    ScriptHash, ScriptLang, ScriptSource, ScriptWitness, TransactionDraft, UTxOSnapshot,
};
use thiserror::Error;
use tracing::debug;

use crate::error::{ScriptExecutionError, TransactionValidityError};

/// One script execution request handed to the oracle
#[derive(Debug, Clone)]
pub struct ScriptCall<'a> {
    pub lang: ScriptLang,
    pub script: &'a [u8],
    pub datum: Option<&'a [u8]>,
    pub redeemer: &'a [u8],
    pub cost_model: &'a CostModel,
    pub budget: ExUnits,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("evaluation failed: {}", logs.join("; "))]
    Evaluation { logs: Vec<String> },

    #[error("execution budget exhausted")]
    OutOfBudget,
}

/// External Plutus virtual machine. Implementations run the script to
/// completion within the budget and report the units it consumed.
pub trait ScriptOracle {
    fn evaluate(&self, call: ScriptCall<'_>) -> Result<ExUnits, OracleError>;
}

/// One entry per script-witnessed item, success or failure
pub type ExecutionUnitsMap = BTreeMap<RedeemerPointer, Result<ExUnits, ScriptExecutionError>>;

/// Evaluate every script the draft carries.
///
/// Pre-Alonzo eras have no scripts to evaluate and return an empty map.
/// A validity bound past the reliable slot-to-time horizon fails the
/// whole draft, since the script context cannot be translated for it.
/// All per-script failures are collected rather than short-circuited.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_transaction_execution_units(
    era: Era,
    current_slot: u64,
    genesis: &GenesisValues,
    params: &ProtocolParams,
    utxo: &UTxOSnapshot,
    draft: &TransactionDraft,
    oracle: &dyn ScriptOracle,
) -> Result<ExecutionUnitsMap, TransactionValidityError> {
    let Some(plutus) = era.plutus() else {
        return Ok(ExecutionUnitsMap::new());
    };

    let max_safe_slot = genesis.max_reliable_slot(current_slot);
    for bound in [draft.validity.invalid_before, draft.validity.invalid_hereafter] {
        if let Some(slot) = bound {
            if slot > max_safe_slot {
                return Err(TransactionValidityError::TimeHorizonExceeded { max_safe_slot });
            }
        }
    }

    if utxo.is_empty() && !draft.inputs.is_empty() {
        return Err(TransactionValidityError::TranslationError(
            "empty UTxO snapshot for a draft with inputs".into(),
        ));
    }

    let budget = params.alonzo()?.max_tx_ex_units;

    // Which items need scripts, keyed by canonical pointer
    let sorted_inputs = draft.sorted_input_refs();
    let sorted_withdrawals: Vec<_> =
        draft.sorted_withdrawals().into_iter().cloned().collect();
    let certs: Vec<_> = draft.certificates.iter().map(|e| e.cert.clone()).collect();
    let mut needed: BTreeMap<RedeemerPointer, ScriptHash> = BTreeMap::new();
    needed.extend(scripts_needed_from_inputs(&sorted_inputs, utxo.as_map()));
    needed.extend(scripts_needed_from_withdrawals(&sorted_withdrawals));
    needed.extend(scripts_needed_from_certificates(&certs));
    needed.extend(scripts_needed_from_mint(&draft.sorted_mint_policies()));

    let witnesses = draft.script_witnesses();

    // Positions whose script can be located, quoted in missing-script
    // errors so the caller sees which references a fuller snapshot
    // would not help with
    let resolvable: BTreeSet<RedeemerPointer> = witnesses
        .iter()
        .filter(|(_, w)| resolve_script(utxo, w).is_some())
        .map(|(p, _)| *p)
        .collect();

    let mut results = ExecutionUnitsMap::new();
    let mut total = Some(ExUnits::zero());

    for (pointer, hash) in &needed {
        if !witnesses.contains_key(pointer) {
            results.insert(
                *pointer,
                Err(ScriptExecutionError::RedeemerPointsToUnknownScript),
            );
            debug!(pointer = %pointer, script = %hash, "needed script has no witness");
        }
    }

    for (pointer, witness) in &witnesses {
        // Unresolvable inputs never make it into the needed map, so
        // check them first to report the reference itself
        if pointer.tag == RedeemerTag::Spend {
            if let Some(input) = sorted_inputs.get(pointer.index as usize) {
                if let Err(e) = utxo.resolve(input) {
                    results.insert(*pointer, Err(e.into()));
                    continue;
                }
            }
        }

        let Some(expected_hash) = needed.get(pointer) else {
            results.insert(*pointer, Err(ScriptExecutionError::NotScriptWitnessed));
            continue;
        };

        let result = run_one(
            &plutus,
            params,
            utxo,
            &sorted_inputs,
            &resolvable,
            *pointer,
            witness,
            *expected_hash,
            budget,
            oracle,
        );

        if let Ok(units) = &result {
            total = total.and_then(|t| t.checked_add(units));
            if total.is_none() {
                results.insert(*pointer, Err(ScriptExecutionError::ExecutionUnitsOverflow));
                continue;
            }
        }
        results.insert(*pointer, result);
    }

    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn run_one(
    plutus: &entasis_common::PlutusEra,
    params: &ProtocolParams,
    utxo: &UTxOSnapshot,
    sorted_inputs: &[entasis_common::UTxOIdentifier],
    resolvable: &BTreeSet<RedeemerPointer>,
    pointer: RedeemerPointer,
    witness: &ScriptWitness,
    expected_hash: ScriptHash,
    budget: ExUnits,
    oracle: &dyn ScriptOracle,
) -> Result<ExUnits, ScriptExecutionError> {
    let Some(script) = resolve_script(utxo, witness) else {
        return Err(ScriptExecutionError::MissingScript {
            resolvable: resolvable.clone(),
        });
    };

    if script.compute_hash() != expected_hash {
        return Err(ScriptExecutionError::RedeemerPointsToUnknownScript);
    }

    if !plutus.supports(script.lang) {
        return Err(ScriptExecutionError::EvaluationFailed {
            logs: vec![format!(
                "{:?} is not available in the {} era",
                script.lang,
                plutus.era()
            )],
        });
    }

    let datum = spend_datum(utxo, sorted_inputs, pointer, witness)?;

    let cost_model = params
        .cost_model(script.lang)
        .ok_or(ScriptExecutionError::MissingCostModel(script.lang))?;

    oracle
        .evaluate(ScriptCall {
            lang: script.lang,
            script: &script.bytes,
            datum,
            redeemer: &witness.redeemer,
            cost_model,
            budget,
        })
        .map_err(|e| match e {
            OracleError::Evaluation { logs } => ScriptExecutionError::EvaluationFailed { logs },
            OracleError::OutOfBudget => ScriptExecutionError::EvaluationFailed {
                logs: vec!["execution budget exhausted".into()],
            },
        })
}

fn resolve_script<'a>(
    utxo: &'a UTxOSnapshot,
    witness: &'a ScriptWitness,
) -> Option<&'a PlutusScript> {
    match &witness.source {
        ScriptSource::Provided(script) => Some(script),
        ScriptSource::ReferenceInput(id) => utxo.get(id)?.script_ref.as_ref(),
    }
}

/// Datum handling for spend redeemers: an output locked with a datum
/// hash needs the witness to supply the matching preimage; inline
/// datums and non-spend redeemers need nothing.
fn spend_datum<'a>(
    utxo: &'a UTxOSnapshot,
    sorted_inputs: &[entasis_common::UTxOIdentifier],
    pointer: RedeemerPointer,
    witness: &'a ScriptWitness,
) -> Result<Option<&'a [u8]>, ScriptExecutionError> {
    if pointer.tag != RedeemerTag::Spend {
        return Ok(witness.datum.as_deref());
    }

    let input = sorted_inputs
        .get(pointer.index as usize)
        .ok_or(ScriptExecutionError::RedeemerPointsToUnknownScript)?;
    let resolved = utxo.resolve(input)?;

    match &resolved.datum {
        Some(Datum::Hash(expected)) => {
            let supplied = witness
                .datum
                .as_deref()
                .ok_or(ScriptExecutionError::MissingDatum)?;
            if datum_hash(supplied) != *expected {
                return Err(ScriptExecutionError::WrongDatum);
            }
            Ok(Some(supplied))
        }
        Some(Datum::Inline(bytes)) => Ok(Some(bytes.as_slice())),
        None => Ok(witness.datum.as_deref()),
    }
}
