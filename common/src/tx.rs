//! Draft transaction model. A draft is treated as a value: every
//! balancing stage derives a new draft rather than mutating one in
//! place.

use std::collections::BTreeMap;

use crate::{
    Address, Datum, ExUnits, KeyHash, Lovelace, NativeAssetDelta, PlutusScript, PolicyId,
    RedeemerPointer, RedeemerTag, StakeAddress, UTxOIdentifier, Value,
};

/// Where the script backing a witness comes from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScriptSource {
    /// Script supplied in the witness set
    Provided(PlutusScript),

    /// Script expected on a reference input's output
    ReferenceInput(UTxOIdentifier),
}

/// A Plutus witness for one item: script source, optional datum,
/// redeemer data and the execution units budgeted so far (zero until
/// evaluation fills them in)
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScriptWitness {
    pub source: ScriptSource,

    #[serde_as(as = "Option<serde_with::hex::Hex>")]
    pub datum: Option<Vec<u8>>,

    #[serde_as(as = "serde_with::hex::Hex")]
    pub redeemer: Vec<u8>,

    pub ex_units: ExUnits,
}

/// How an input is authorised
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InputWitness {
    /// Simple signature
    Key,

    /// Plutus script witness
    Script(ScriptWitness),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TxInput {
    pub utxo: UTxOIdentifier,
    pub witness: InputWitness,
}

impl TxInput {
    pub fn key_witnessed(utxo: UTxOIdentifier) -> Self {
        Self {
            utxo,
            witness: InputWitness::Key,
        }
    }

    pub fn script_witnessed(utxo: UTxOIdentifier, witness: ScriptWitness) -> Self {
        Self {
            utxo,
            witness: InputWitness::Script(witness),
        }
    }
}

/// Transaction output under construction
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    pub datum: Option<Datum>,
    pub script_ref: Option<PlutusScript>,
}

impl TxOutput {
    pub fn to_address(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
            script_ref: None,
        }
    }
}

/// Reward withdrawal, optionally script-witnessed
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Withdrawal {
    pub address: StakeAddress,
    pub value: Lovelace,
    pub witness: Option<ScriptWitness>,
}

/// Minting (positive) or burning (negative) under one policy,
/// optionally script-witnessed (native-script policies carry no
/// redeemer)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MintEntry {
    pub policy: PolicyId,
    pub assets: Vec<NativeAssetDelta>,
    pub witness: Option<ScriptWitness>,
}

/// Certificate plus its optional script witness
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CertificateEntry {
    pub cert: crate::TxCertificate,
    pub witness: Option<ScriptWitness>,
}

/// Slot window in which the transaction is valid
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidityInterval {
    pub invalid_before: Option<u64>,
    pub invalid_hereafter: Option<u64>,
}

/// Whether the caller expects the scripts to succeed (the normal case)
/// or to fail (constructing a collateral-forfeiture test transaction)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScriptValidity {
    #[default]
    Valid,
    Invalid,
}

/// A proposed, not yet balanced transaction
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionDraft {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub reference_inputs: Vec<UTxOIdentifier>,

    pub collateral_inputs: Vec<UTxOIdentifier>,
    pub collateral_return: Option<TxOutput>,
    pub total_collateral: Option<Lovelace>,

    pub mint: Vec<MintEntry>,
    pub withdrawals: Vec<Withdrawal>,
    pub certificates: Vec<CertificateEntry>,

    pub validity: ValidityInterval,
    pub required_signers: Vec<KeyHash>,

    pub fee: Lovelace,
    pub script_validity: ScriptValidity,
}

impl Default for TxOutput {
    fn default() -> Self {
        Self {
            address: Address::Byron(crate::ByronAddress { payload: vec![] }),
            value: Value::default(),
            datum: None,
            script_ref: None,
        }
    }
}

impl TransactionDraft {
    /// Input references in canonical (lexicographic) order, the order
    /// spend redeemer indices are assigned in
    pub fn sorted_input_refs(&self) -> Vec<UTxOIdentifier> {
        let mut refs: Vec<_> = self.inputs.iter().map(|i| i.utxo).collect();
        refs.sort();
        refs
    }

    /// Withdrawals in canonical (stake address) order
    pub fn sorted_withdrawals(&self) -> Vec<&Withdrawal> {
        let mut withdrawals: Vec<_> = self.withdrawals.iter().collect();
        withdrawals.sort_by_key(|w| w.address);
        withdrawals
    }

    /// Mint policies in canonical (policy id) order
    pub fn sorted_mint_policies(&self) -> Vec<PolicyId> {
        let mut policies: Vec<_> = self.mint.iter().map(|m| m.policy).collect();
        policies.sort();
        policies
    }

    /// All script witnesses keyed by their redeemer pointer, under the
    /// canonical ordering rule. One entry per script-witnessed item.
    pub fn script_witnesses(&self) -> BTreeMap<RedeemerPointer, &ScriptWitness> {
        let mut witnesses = BTreeMap::new();

        let sorted_refs = self.sorted_input_refs();
        for input in &self.inputs {
            if let InputWitness::Script(witness) = &input.witness {
                let index = sorted_refs
                    .iter()
                    .position(|r| *r == input.utxo)
                    .unwrap_or_default() as u32;
                witnesses.insert(RedeemerPointer::new(RedeemerTag::Spend, index), witness);
            }
        }

        for (index, policy) in self.sorted_mint_policies().iter().enumerate() {
            if let Some(entry) = self.mint.iter().find(|m| m.policy == *policy) {
                if let Some(witness) = &entry.witness {
                    witnesses
                        .insert(RedeemerPointer::new(RedeemerTag::Mint, index as u32), witness);
                }
            }
        }

        for (index, entry) in self.certificates.iter().enumerate() {
            if let Some(witness) = &entry.witness {
                witnesses.insert(RedeemerPointer::new(RedeemerTag::Cert, index as u32), witness);
            }
        }

        let sorted_withdrawals = self.sorted_withdrawals();
        for (index, withdrawal) in sorted_withdrawals.iter().enumerate() {
            if let Some(witness) = &withdrawal.witness {
                witnesses
                    .insert(RedeemerPointer::new(RedeemerTag::Reward, index as u32), witness);
            }
        }

        witnesses
    }

    pub fn has_script_witnesses(&self) -> bool {
        !self.script_witnesses().is_empty()
    }

    /// New draft with the given execution units substituted into the
    /// witnesses named by the map. Unknown pointers are left untouched.
    pub fn with_ex_units(&self, units: &BTreeMap<RedeemerPointer, ExUnits>) -> Self {
        let mut draft = self.clone();
        let sorted_refs = draft.sorted_input_refs();

        for input in &mut draft.inputs {
            if let InputWitness::Script(witness) = &mut input.witness {
                let index = sorted_refs
                    .iter()
                    .position(|r| *r == input.utxo)
                    .unwrap_or_default() as u32;
                if let Some(eu) = units.get(&RedeemerPointer::new(RedeemerTag::Spend, index)) {
                    witness.ex_units = *eu;
                }
            }
        }

        let sorted_policies = draft.sorted_mint_policies();
        for entry in &mut draft.mint {
            if let Some(witness) = &mut entry.witness {
                let index = sorted_policies
                    .iter()
                    .position(|p| *p == entry.policy)
                    .unwrap_or_default() as u32;
                if let Some(eu) = units.get(&RedeemerPointer::new(RedeemerTag::Mint, index)) {
                    witness.ex_units = *eu;
                }
            }
        }

        for (index, entry) in draft.certificates.iter_mut().enumerate() {
            if let Some(witness) = &mut entry.witness {
                if let Some(eu) = units.get(&RedeemerPointer::new(RedeemerTag::Cert, index as u32))
                {
                    witness.ex_units = *eu;
                }
            }
        }

        let sorted_addresses: Vec<_> =
            self.sorted_withdrawals().iter().map(|w| w.address).collect();
        for withdrawal in &mut draft.withdrawals {
            if let Some(witness) = &mut withdrawal.witness {
                let index = sorted_addresses
                    .iter()
                    .position(|a| *a == withdrawal.address)
                    .unwrap_or_default() as u32;
                if let Some(eu) = units.get(&RedeemerPointer::new(RedeemerTag::Reward, index)) {
                    witness.ex_units = *eu;
                }
            }
        }

        draft
    }

    pub fn with_fee(&self, fee: Lovelace) -> Self {
        let mut draft = self.clone();
        draft.fee = fee;
        draft
    }

    pub fn with_appended_output(&self, output: TxOutput) -> Self {
        let mut draft = self.clone();
        draft.outputs.push(output);
        draft
    }

    pub fn with_collateral(
        &self,
        total_collateral: Option<Lovelace>,
        collateral_return: Option<TxOutput>,
    ) -> Self {
        let mut draft = self.clone();
        draft.total_collateral = total_collateral;
        draft.collateral_return = collateral_return;
        draft
    }

    /// Total execution units across all script witnesses, if they fit
    /// the representable range
    pub fn total_ex_units(&self) -> Option<ExUnits> {
        let mut total = ExUnits::zero();
        for witness in self.script_witnesses().values() {
            total = total.checked_add(&witness.ex_units)?;
        }
        Some(total)
    }
}
