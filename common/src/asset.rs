use std::{
    cmp::Ordering,
    collections::BTreeMap,
    ops::{Add, AddAssign},
};

use thiserror::Error;

use crate::hash::Hash;

pub type PolicyId = Hash<28>;
pub type NativeAssets = Vec<(PolicyId, Vec<NativeAsset>)>;

/// An asset name, at most 32 bytes
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct AssetName {
    #[n(0)]
    len: u8,
    #[n(1)]
    bytes: [u8; 32],
}

impl AssetName {
    pub fn new(data: &[u8]) -> Option<Self> {
        if data.len() > 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[..data.len()].copy_from_slice(data);
        Some(Self {
            len: data.len() as u8,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

// Canonical (byte-lexicographic) ordering, the order multiasset maps are
// keyed by on the wire
impl Ord for AssetName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl PartialOrd for AssetName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct NativeAsset {
    #[n(0)]
    pub name: AssetName,
    #[n(1)]
    pub amount: u64,
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct NativeAssetDelta {
    #[n(0)]
    pub name: AssetName,
    #[n(1)]
    pub amount: i64,
}

/// Value (lovelace + multiasset)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Value {
    pub lovelace: u64,
    pub assets: NativeAssets,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.lovelace == other.lovelace && {
            let mut counts: BTreeMap<(PolicyId, AssetName), i128> = BTreeMap::new();
            for (policy_id, assets) in &self.assets {
                for asset in assets {
                    *counts.entry((*policy_id, asset.name)).or_default() += asset.amount as i128;
                }
            }
            for (policy_id, assets) in &other.assets {
                for asset in assets {
                    *counts.entry((*policy_id, asset.name)).or_default() -= asset.amount as i128;
                }
            }
            counts.values().all(|count| *count == 0)
        }
    }
}

impl Eq for Value {}

impl Value {
    pub fn new(lovelace: u64, assets: NativeAssets) -> Self {
        Self { lovelace, assets }
    }

    pub fn coin_only(lovelace: u64) -> Self {
        Self {
            lovelace,
            assets: Vec::new(),
        }
    }

    pub fn coin(&self) -> u64 {
        self.lovelace
    }

    pub fn has_assets(&self) -> bool {
        self.assets.iter().any(|(_, assets)| !assets.is_empty())
    }

    pub fn sum_lovelace<'a>(iter: impl Iterator<Item = &'a Value>) -> u64 {
        iter.map(|v| v.lovelace).sum()
    }
}

impl AddAssign<&Value> for Value {
    fn add_assign(&mut self, other: &Value) {
        self.lovelace += other.lovelace;

        for (policy_id, other_assets) in &other.assets {
            if let Some((_, existing_assets)) =
                self.assets.iter_mut().find(|(pid, _)| pid == policy_id)
            {
                for other_asset in other_assets {
                    if let Some(existing) =
                        existing_assets.iter_mut().find(|a| a.name == other_asset.name)
                    {
                        existing.amount += other_asset.amount;
                    } else {
                        existing_assets.push(other_asset.clone());
                    }
                }
            } else {
                self.assets.push((*policy_id, other_assets.clone()));
            }
        }
    }
}

impl Add for Value {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        let mut result = self.clone();
        result += &other;
        result
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueConversionError {
    #[error("lovelace balance is negative: {0}")]
    NegativeLovelace(i128),

    #[error("asset balance is negative: {policy}.{}: {amount}", hex::encode(name.as_slice()))]
    NegativeAsset {
        policy: PolicyId,
        name: AssetName,
        amount: i128,
    },

    #[error("amount out of range for a value: {0}")]
    OutOfRange(i128),
}

/// Signed value, the result of balance arithmetic. Intermediate sums are
/// carried as i128 so no sequence of in-range u64 quantities can wrap.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValueDelta {
    pub lovelace: i128,
    pub assets: BTreeMap<PolicyId, BTreeMap<AssetName, i128>>,
}

impl ValueDelta {
    pub fn add_lovelace(&mut self, amount: u64) {
        self.lovelace += amount as i128;
    }

    pub fn sub_lovelace(&mut self, amount: u64) {
        self.lovelace -= amount as i128;
    }

    pub fn add_value(&mut self, value: &Value) {
        self.lovelace += value.lovelace as i128;
        for (policy, assets) in &value.assets {
            let entry = self.assets.entry(*policy).or_default();
            for asset in assets {
                *entry.entry(asset.name).or_default() += asset.amount as i128;
            }
        }
    }

    pub fn sub_value(&mut self, value: &Value) {
        self.lovelace -= value.lovelace as i128;
        for (policy, assets) in &value.assets {
            let entry = self.assets.entry(*policy).or_default();
            for asset in assets {
                *entry.entry(asset.name).or_default() -= asset.amount as i128;
            }
        }
    }

    pub fn add_asset_delta(&mut self, policy: &PolicyId, delta: &NativeAssetDelta) {
        *self.assets.entry(*policy).or_default().entry(delta.name).or_default() +=
            delta.amount as i128;
    }

    /// Drop zero entries so emptiness checks see through cancelled assets
    pub fn normalize(&mut self) {
        for assets in self.assets.values_mut() {
            assets.retain(|_, amount| *amount != 0);
        }
        self.assets.retain(|_, assets| !assets.is_empty());
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace == 0 && self.ada_only()
    }

    /// True when no non-ada asset has a non-zero balance
    pub fn ada_only(&self) -> bool {
        self.assets.values().all(|assets| assets.values().all(|amount| *amount == 0))
    }

    pub fn has_negative_assets(&self) -> bool {
        self.assets.values().any(|assets| assets.values().any(|amount| *amount < 0))
    }

    /// Convert back to an unsigned value. Fails if any component is
    /// negative or exceeds the u64 range.
    pub fn to_value(&self) -> Result<Value, ValueConversionError> {
        if self.lovelace < 0 {
            return Err(ValueConversionError::NegativeLovelace(self.lovelace));
        }
        let lovelace =
            u64::try_from(self.lovelace).map_err(|_| ValueConversionError::OutOfRange(self.lovelace))?;

        let mut native_assets: NativeAssets = Vec::new();
        for (policy, assets) in &self.assets {
            let mut entries = Vec::new();
            for (name, amount) in assets {
                if *amount == 0 {
                    continue;
                }
                if *amount < 0 {
                    return Err(ValueConversionError::NegativeAsset {
                        policy: *policy,
                        name: *name,
                        amount: *amount,
                    });
                }
                let amount = u64::try_from(*amount)
                    .map_err(|_| ValueConversionError::OutOfRange(*amount))?;
                entries.push(NativeAsset {
                    name: *name,
                    amount,
                });
            }
            if !entries.is_empty() {
                native_assets.push((*policy, entries));
            }
        }
        Ok(Value::new(lovelace, native_assets))
    }
}

impl From<&Value> for ValueDelta {
    fn from(value: &Value) -> Self {
        let mut delta = ValueDelta::default();
        delta.add_value(value);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(byte: u8) -> PolicyId {
        PolicyId::new([byte; 28])
    }

    fn asset(name: &[u8], amount: u64) -> NativeAsset {
        NativeAsset {
            name: AssetName::new(name).unwrap(),
            amount,
        }
    }

    #[test]
    fn value_equality_ignores_asset_order() {
        let a = Value::new(5, vec![(policy(1), vec![asset(b"a", 1), asset(b"b", 2)])]);
        let b = Value::new(5, vec![(policy(1), vec![asset(b"b", 2), asset(b"a", 1)])]);
        assert_eq!(a, b);
    }

    #[test]
    fn delta_cancels_to_zero() {
        let value = Value::new(100, vec![(policy(1), vec![asset(b"t", 7)])]);
        let mut delta = ValueDelta::default();
        delta.add_value(&value);
        delta.sub_value(&value);
        delta.normalize();
        assert!(delta.is_zero());
    }

    #[test]
    fn negative_asset_rejected_on_conversion() {
        let mut delta = ValueDelta::default();
        delta.add_lovelace(10);
        delta.sub_value(&Value::new(0, vec![(policy(2), vec![asset(b"x", 3)])]));
        assert!(matches!(
            delta.to_value(),
            Err(ValueConversionError::NegativeAsset { .. })
        ));
    }

    #[test]
    fn surplus_converts_to_value() {
        let mut delta = ValueDelta::default();
        delta.add_value(&Value::new(42, vec![(policy(3), vec![asset(b"n", 9)])]));
        let value = delta.to_value().unwrap();
        assert_eq!(value.coin(), 42);
        assert!(value.has_assets());
    }
}
