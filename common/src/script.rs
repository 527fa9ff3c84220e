//! Plutus script, datum and redeemer types, plus the canonical
//! redeemer-pointer ordering rules.

use std::collections::BTreeMap;

use crate::{
    crypto::keyhash_224_tagged, Address, DatumHash, PolicyId, ScriptHash, UTxOIdentifier,
    UTxOValue, Withdrawal,
};

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScriptLang {
    PlutusV1,
    PlutusV2,
    PlutusV3,
}

impl ScriptLang {
    fn hash_tag(&self) -> u8 {
        match self {
            ScriptLang::PlutusV1 => 1,
            ScriptLang::PlutusV2 => 2,
            ScriptLang::PlutusV3 => 3,
        }
    }
}

/// A Plutus script with its language, carried as raw bytes
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlutusScript {
    pub lang: ScriptLang,

    #[serde_as(as = "serde_with::hex::Hex")]
    pub bytes: Vec<u8>,
}

impl PlutusScript {
    pub fn compute_hash(&self) -> ScriptHash {
        keyhash_224_tagged(self.lang.hash_tag(), &self.bytes)
    }
}

/// Datum attached to an output (inline or by hash)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Datum {
    Hash(DatumHash),
    Inline(Vec<u8>),
}

/// Execution units consumed or budgeted for a script
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct ExUnits {
    #[n(0)]
    pub mem: u64,
    #[n(1)]
    pub steps: u64,
}

impl ExUnits {
    pub fn new(mem: u64, steps: u64) -> Self {
        Self { mem, steps }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn checked_add(&self, other: &ExUnits) -> Option<ExUnits> {
        Some(ExUnits {
            mem: self.mem.checked_add(other.mem)?,
            steps: self.steps.checked_add(other.steps)?,
        })
    }
}

#[derive(
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
)]
pub enum RedeemerTag {
    #[n(0)]
    Spend,
    #[n(1)]
    Mint,
    #[n(2)]
    Cert,
    #[n(3)]
    Reward,
}

/// Stable position of a script argument within a transaction: which
/// witnessed item (input, mint policy, certificate, withdrawal) it
/// belongs to, under the canonical ordering rule.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
)]
pub struct RedeemerPointer {
    #[n(0)]
    pub tag: RedeemerTag,
    #[n(1)]
    pub index: u32,
}

impl RedeemerPointer {
    pub fn new(tag: RedeemerTag, index: u32) -> Self {
        Self { tag, index }
    }
}

impl std::fmt::Display for RedeemerPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.tag, self.index)
    }
}

/// Scripts needed by the UTxOs being spent.
/// Returns a list of (RedeemerPointer, ScriptHash) pairs.
/// NOTE:
/// Inputs must be sorted lexicographically by UTxO identifier
pub fn scripts_needed_from_inputs(
    sorted_inputs: &[UTxOIdentifier],
    utxos: &BTreeMap<UTxOIdentifier, UTxOValue>,
) -> Vec<(RedeemerPointer, ScriptHash)> {
    let mut scripts_needed = Vec::new();
    for (index, input) in sorted_inputs.iter().enumerate() {
        if let Some(utxo) = utxos.get(input) {
            if let Some(script_hash) = utxo.address.payment_script_hash() {
                scripts_needed.push((
                    RedeemerPointer::new(RedeemerTag::Spend, index as u32),
                    script_hash,
                ));
            }
        }
    }
    scripts_needed
}

/// Scripts needed by withdrawals.
/// NOTE:
/// Withdrawals must be sorted lexicographically by stake address
pub fn scripts_needed_from_withdrawals(
    sorted_withdrawals: &[Withdrawal],
) -> Vec<(RedeemerPointer, ScriptHash)> {
    let mut scripts_needed = Vec::new();
    for (index, withdrawal) in sorted_withdrawals.iter().enumerate() {
        if let Some(script_hash) = withdrawal.address.script_hash() {
            scripts_needed.push((
                RedeemerPointer::new(RedeemerTag::Reward, index as u32),
                script_hash,
            ));
        }
    }
    scripts_needed
}

/// Scripts needed by mint policies.
/// NOTE:
/// Mint entries must be sorted lexicographically by policy id
pub fn scripts_needed_from_mint(
    sorted_policies: &[PolicyId],
) -> Vec<(RedeemerPointer, ScriptHash)> {
    sorted_policies
        .iter()
        .enumerate()
        .map(|(index, policy_id)| {
            (
                RedeemerPointer::new(RedeemerTag::Mint, index as u32),
                *policy_id,
            )
        })
        .collect()
}

/// Key- vs script-locked classification of a payment address
pub fn address_locked_by_script(address: &Address) -> bool {
    address.payment_script_hash().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hash, StakeAddress, StakeCredential};

    #[test]
    fn plutus_script_hash_depends_on_language() {
        let v1 = PlutusScript {
            lang: ScriptLang::PlutusV1,
            bytes: vec![1, 2, 3],
        };
        let v2 = PlutusScript {
            lang: ScriptLang::PlutusV2,
            bytes: vec![1, 2, 3],
        };
        assert_ne!(v1.compute_hash(), v2.compute_hash());
    }

    #[test]
    fn withdrawal_pointer_indices_follow_sorted_order() {
        let key_wd = Withdrawal {
            address: StakeAddress {
                network: Default::default(),
                credential: StakeCredential::AddrKeyHash(Hash::new([0; 28])),
            },
            value: 10,
            witness: None,
        };
        let script_wd = Withdrawal {
            address: StakeAddress {
                network: Default::default(),
                credential: StakeCredential::ScriptHash(Hash::new([9; 28])),
            },
            value: 20,
            witness: None,
        };
        let needed = scripts_needed_from_withdrawals(&[key_wd, script_wd]);
        assert_eq!(needed.len(), 1);
        assert_eq!(needed[0].0, RedeemerPointer::new(RedeemerTag::Reward, 1));
    }
}
