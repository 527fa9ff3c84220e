use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Address, Datum, PlutusScript, TxHash, Value};

/// Reference to a transaction output
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct UTxOIdentifier {
    /// Tx hash of the producing transaction
    pub tx_hash: TxHash,

    /// Output index within it
    pub index: u16,
}

impl UTxOIdentifier {
    pub fn new(tx_hash: TxHash, index: u16) -> Self {
        Self { tx_hash, index }
    }
}

impl std::fmt::Display for UTxOIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

/// What an unspent output carries
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UTxOValue {
    /// Address data
    pub address: Address,

    /// Output value (lovelace + native assets)
    pub value: Value,

    /// Datum (inline or hash)
    pub datum: Option<Datum>,

    /// Reference script, if the output carries one
    pub script_ref: Option<PlutusScript>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("input {0} is not present in the UTxO snapshot")]
pub struct UnresolvedInputError(pub UTxOIdentifier);

/// An immutable view of the spendable outputs a draft refers to. Must
/// cover every input and collateral input of the draft it is used with.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct UTxOSnapshot(BTreeMap<UTxOIdentifier, UTxOValue>);

impl UTxOSnapshot {
    pub fn new(entries: impl IntoIterator<Item = (UTxOIdentifier, UTxOValue)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, id: &UTxOIdentifier) -> Option<&UTxOValue> {
        self.0.get(id)
    }

    pub fn resolve(&self, id: &UTxOIdentifier) -> Result<&UTxOValue, UnresolvedInputError> {
        self.0.get(id).ok_or(UnresolvedInputError(*id))
    }

    pub fn insert(&mut self, id: UTxOIdentifier, value: UTxOValue) {
        self.0.insert(id, value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &BTreeMap<UTxOIdentifier, UTxOValue> {
        &self.0
    }
}
