//! Signed multi-asset balance of a draft transaction.

use entasis_common::{
    Lovelace, PoolId, ProtocolParams, StakeAddress, StakeCredential, TransactionDraft,
    TxCertificate, UTxOSnapshot, ValueDelta,
};

use crate::error::BalanceError;

/// Compute `inputs + mint + withdrawals + refunds - outputs - fee -
/// deposits` as a signed delta.
///
/// Deposits for plain registration certificates come from the protocol
/// parameters; refunds for deregistrations come from the ledger lookup
/// closures, falling back to the current parameter value when the
/// ledger has no record. Pool registration only charges a deposit for
/// pools the `is_pool_registered` predicate does not already know.
///
/// The result may be negative and may carry non-ada assets; judging it
/// is the caller's concern.
pub fn evaluate_transaction_balance<F1, F2, F3>(
    params: &ProtocolParams,
    stake_deposit_refund: F1,
    drep_deposit_refund: F2,
    is_pool_registered: F3,
    utxo: &UTxOSnapshot,
    draft: &TransactionDraft,
) -> Result<ValueDelta, BalanceError>
where
    F1: Fn(&StakeAddress) -> Option<Lovelace>,
    F2: Fn(&StakeCredential) -> Option<Lovelace>,
    F3: Fn(&PoolId) -> bool,
{
    let mut delta = ValueDelta::default();

    for input in &draft.inputs {
        let resolved = utxo.resolve(&input.utxo)?;
        delta.add_value(&resolved.value);
    }

    for entry in &draft.mint {
        for asset in &entry.assets {
            delta.add_asset_delta(&entry.policy, asset);
        }
    }

    for withdrawal in &draft.withdrawals {
        delta.add_lovelace(withdrawal.value);
    }

    for entry in &draft.certificates {
        apply_certificate(
            &mut delta,
            &entry.cert,
            params,
            &stake_deposit_refund,
            &drep_deposit_refund,
            &is_pool_registered,
        )?;
    }

    for output in &draft.outputs {
        delta.sub_value(&output.value);
    }

    delta.sub_lovelace(draft.fee);

    delta.normalize();
    Ok(delta)
}

fn apply_certificate<F1, F2, F3>(
    delta: &mut ValueDelta,
    cert: &TxCertificate,
    params: &ProtocolParams,
    stake_deposit_refund: &F1,
    drep_deposit_refund: &F2,
    is_pool_registered: &F3,
) -> Result<(), BalanceError>
where
    F1: Fn(&StakeAddress) -> Option<Lovelace>,
    F2: Fn(&StakeCredential) -> Option<Lovelace>,
    F3: Fn(&PoolId) -> bool,
{
    match cert {
        TxCertificate::StakeRegistration(_) => {
            delta.sub_lovelace(params.shelley()?.key_deposit);
        }
        TxCertificate::StakeDeregistration(stake) => {
            let refund =
                stake_deposit_refund(stake).unwrap_or(params.shelley()?.key_deposit);
            delta.add_lovelace(refund);
        }
        TxCertificate::Registration { deposit, .. } => {
            delta.sub_lovelace(*deposit);
        }
        TxCertificate::Deregistration { refund, .. } => {
            delta.add_lovelace(*refund);
        }
        TxCertificate::PoolRegistration { operator } => {
            // Re-registering an existing pool pays no new deposit
            if !is_pool_registered(operator) {
                delta.sub_lovelace(params.shelley()?.pool_deposit);
            }
        }
        TxCertificate::DRepRegistration { deposit, .. } => {
            delta.sub_lovelace(*deposit);
        }
        TxCertificate::DRepDeregistration { credential, refund } => {
            let refund = drep_deposit_refund(credential).unwrap_or(*refund);
            delta.add_lovelace(refund);
        }
        // Delegation moves no value; pool retirement refunds arrive in
        // the reward account at epoch boundary, not in this transaction
        TxCertificate::StakeDelegation { .. } | TxCertificate::PoolRetirement { .. } => {}
    }
    Ok(())
}
