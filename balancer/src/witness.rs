//! Conservative estimate of how many key witnesses a transaction needs.

use std::collections::BTreeSet;

use entasis_common::{
    InputWitness, KeyHash, ShelleyAddressPaymentPart, TransactionDraft, UTxOSnapshot,
};

/// Count the verification key witnesses the finished transaction will
/// carry. Distinct key credentials are counted once; inputs whose
/// address cannot be resolved or carries no hashable credential count
/// one each. Over-counting is acceptable, under-counting never is.
pub fn estimate_key_witness_count(utxo: &UTxOSnapshot, draft: &TransactionDraft) -> u64 {
    let mut keys: BTreeSet<KeyHash> = BTreeSet::new();
    let mut opaque = 0u64;

    let mut count_input = |id: &entasis_common::UTxOIdentifier| match utxo.get(id) {
        Some(resolved) => match resolved.address.payment_part() {
            Some(ShelleyAddressPaymentPart::PaymentKeyHash(hash)) => {
                keys.insert(*hash);
            }
            Some(ShelleyAddressPaymentPart::ScriptHash(_)) => {}
            // Byron addresses hide their key, count each input
            None => opaque += 1,
        },
        None => opaque += 1,
    };

    for input in &draft.inputs {
        if matches!(input.witness, InputWitness::Key) {
            count_input(&input.utxo);
        }
    }

    for collateral in &draft.collateral_inputs {
        count_input(collateral);
    }

    for signer in &draft.required_signers {
        keys.insert(*signer);
    }

    for withdrawal in &draft.withdrawals {
        if let Some(hash) = withdrawal.address.key_hash() {
            keys.insert(hash);
        }
    }

    for entry in &draft.certificates {
        if let Some(hash) = entry.cert.key_credential() {
            keys.insert(hash);
        }
    }

    keys.len() as u64 + opaque
}

#[cfg(test)]
mod tests {
    use super::*;
    use entasis_common::{
        Address, AddressNetwork, Hash, ShelleyAddress, ShelleyAddressDelegationPart, TxInput,
        UTxOIdentifier, UTxOValue, Value,
    };

    fn key_utxo(byte: u8) -> UTxOValue {
        UTxOValue {
            address: Address::Shelley(ShelleyAddress {
                network: AddressNetwork::Main,
                payment: ShelleyAddressPaymentPart::PaymentKeyHash(Hash::new([byte; 28])),
                delegation: ShelleyAddressDelegationPart::None,
            }),
            value: Value::coin_only(10_000_000),
            datum: None,
            script_ref: None,
        }
    }

    #[test]
    fn same_credential_counted_once() {
        let a = UTxOIdentifier::new(Hash::new([1; 32]), 0);
        let b = UTxOIdentifier::new(Hash::new([1; 32]), 1);
        let utxo = UTxOSnapshot::new([(a, key_utxo(7)), (b, key_utxo(7))]);
        let draft = TransactionDraft {
            inputs: vec![TxInput::key_witnessed(a), TxInput::key_witnessed(b)],
            ..Default::default()
        };
        assert_eq!(estimate_key_witness_count(&utxo, &draft), 1);
    }

    #[test]
    fn unresolved_inputs_count_one_each() {
        let a = UTxOIdentifier::new(Hash::new([1; 32]), 0);
        let b = UTxOIdentifier::new(Hash::new([2; 32]), 0);
        let utxo = UTxOSnapshot::default();
        let draft = TransactionDraft {
            inputs: vec![TxInput::key_witnessed(a), TxInput::key_witnessed(b)],
            ..Default::default()
        };
        assert_eq!(estimate_key_witness_count(&utxo, &draft), 2);
    }

    #[test]
    fn required_signers_and_collateral_add_witnesses() {
        let a = UTxOIdentifier::new(Hash::new([1; 32]), 0);
        let coll = UTxOIdentifier::new(Hash::new([2; 32]), 0);
        let utxo = UTxOSnapshot::new([(a, key_utxo(1)), (coll, key_utxo(2))]);
        let draft = TransactionDraft {
            inputs: vec![TxInput::key_witnessed(a)],
            collateral_inputs: vec![coll],
            required_signers: vec![Hash::new([3; 28])],
            ..Default::default()
        };
        assert_eq!(estimate_key_witness_count(&utxo, &draft), 3);
    }
}
