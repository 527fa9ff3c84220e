//! Collateral requirement for script-carrying transactions.

use entasis_common::{
    Address, Lovelace, PlutusEra, ProtocolParams, TransactionDraft, TxOutput, UTxOSnapshot, Value,
};
use num_rational::Ratio;

use crate::error::CollateralError;

/// What the transaction should declare: a total-collateral amount and
/// an optional return output. Both absent when the declared collateral
/// cannot cover the requirement; the balance check downstream reports
/// the shortfall with full context.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CollateralPlan {
    pub total_collateral: Option<Lovelace>,
    pub return_collateral: Option<TxOutput>,
}

/// Lovelace that must be forfeited if scripts fail:
/// `ceil(fee * collateral_percentage / 100)`, in exact rational
/// arithmetic
pub fn required_collateral(fee: Lovelace, collateral_percentage: u32) -> Lovelace {
    let required = Ratio::new(fee as u128 * collateral_percentage as u128, 100u128);
    required.ceil().to_integer() as Lovelace
}

/// Work out total collateral and the return output for a draft, given
/// the fee it will pay. Only callable in Plutus-capable eras; the
/// `PlutusEra` witness is the proof.
///
/// A caller who set total collateral or a return output explicitly is
/// trusted: both pass through unchanged.
pub fn calculate_collateral(
    _plutus: &PlutusEra,
    params: &ProtocolParams,
    utxo: &UTxOSnapshot,
    draft: &TransactionDraft,
    fee: Lovelace,
    change_address: &Address,
) -> Result<CollateralPlan, CollateralError> {
    let alonzo = params.alonzo()?;

    let declared = draft.collateral_inputs.len() as u32;
    if declared > alonzo.max_collateral_inputs {
        return Err(CollateralError::TooManyCollateralInputs {
            declared,
            maximum: alonzo.max_collateral_inputs,
        });
    }

    if draft.total_collateral.is_some() || draft.collateral_return.is_some() {
        return Ok(CollateralPlan {
            total_collateral: draft.total_collateral,
            return_collateral: draft.collateral_return.clone(),
        });
    }

    if draft.collateral_inputs.is_empty() {
        return Ok(CollateralPlan::default());
    }

    let mut available = Value::default();
    for input in &draft.collateral_inputs {
        let resolved = utxo.resolve(input)?;
        available += &resolved.value;
    }

    let required = required_collateral(fee, alonzo.collateral_percentage);
    if available.lovelace < required {
        return Ok(CollateralPlan::default());
    }

    let surplus = available.lovelace - required;
    let return_collateral = if surplus > 0 || available.has_assets() {
        Some(TxOutput::to_address(
            change_address.clone(),
            Value::new(surplus, available.assets),
        ))
    } else {
        None
    };

    Ok(CollateralPlan {
        total_collateral: Some(required),
        return_collateral,
    })
}
