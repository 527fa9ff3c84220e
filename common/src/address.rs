//! Address model, reduced to what fee and balance computation need:
//! which credential pays (key vs script), and a deterministic byte
//! rendering for output sizing.

use crate::{KeyHash, ScriptHash};

/// Address network identifier
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AddressNetwork {
    #[default]
    Main,
    Test,
}

impl AddressNetwork {
    fn header_bits(&self) -> u8 {
        match self {
            Self::Main => 1,
            Self::Test => 0,
        }
    }
}

/// A Byron-era address, carried as its raw payload
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ByronAddress {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub payload: Vec<u8>,
}

/// A Shelley-era address - payment part
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShelleyAddressPaymentPart {
    /// Payment to a key
    PaymentKeyHash(KeyHash),

    /// Payment to a script
    ScriptHash(ScriptHash),
}

/// A Shelley-era address - delegation part
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShelleyAddressDelegationPart {
    /// No delegation (enterprise addresses)
    #[default]
    None,

    /// Delegation to stake key
    StakeKeyHash(KeyHash),

    /// Delegation to script
    ScriptHash(ScriptHash),
}

/// A Shelley-era address
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShelleyAddress {
    pub network: AddressNetwork,
    pub payment: ShelleyAddressPaymentPart,
    pub delegation: ShelleyAddressDelegationPart,
}

/// Credential of a stake address
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum StakeCredential {
    AddrKeyHash(KeyHash),
    ScriptHash(ScriptHash),
}

/// A stake (reward) address
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct StakeAddress {
    pub network: AddressNetwork,
    pub credential: StakeCredential,
}

// Ordering of stake addresses follows credential bytes, which is what
// withdrawal maps are keyed by on the wire
impl PartialOrd for AddressNetwork {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AddressNetwork {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.header_bits().cmp(&other.header_bits())
    }
}

impl std::hash::Hash for AddressNetwork {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.header_bits().hash(state);
    }
}

/// A Cardano address
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Address {
    Byron(ByronAddress),
    Shelley(ShelleyAddress),
}

impl Address {
    pub fn payment_part(&self) -> Option<&ShelleyAddressPaymentPart> {
        match self {
            Address::Shelley(addr) => Some(&addr.payment),
            Address::Byron(_) => None,
        }
    }

    /// Script hash guarding this address, if it is script-locked
    pub fn payment_script_hash(&self) -> Option<ScriptHash> {
        match self.payment_part() {
            Some(ShelleyAddressPaymentPart::ScriptHash(hash)) => Some(*hash),
            _ => None,
        }
    }

    pub fn is_key_payment(&self) -> bool {
        !matches!(
            self.payment_part(),
            Some(ShelleyAddressPaymentPart::ScriptHash(_))
        )
    }

    /// Deterministic byte rendering, used for output size accounting.
    /// Shelley addresses render as header byte + payment hash +
    /// optional delegation hash, matching their on-wire length.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Address::Byron(addr) => addr.payload.clone(),
            Address::Shelley(addr) => {
                let payment_bit = match addr.payment {
                    ShelleyAddressPaymentPart::PaymentKeyHash(_) => 0,
                    ShelleyAddressPaymentPart::ScriptHash(_) => 1,
                };
                let (delegation_bits, delegation_hash): (u8, Option<&[u8]>) = match &addr.delegation
                {
                    ShelleyAddressDelegationPart::StakeKeyHash(h) => (0, Some(h.as_ref())),
                    ShelleyAddressDelegationPart::ScriptHash(h) => (1, Some(h.as_ref())),
                    ShelleyAddressDelegationPart::None => (3, None),
                };
                let header = (delegation_bits << 5)
                    | (payment_bit << 4)
                    | addr.network.header_bits();

                let mut bytes = vec![header];
                match &addr.payment {
                    ShelleyAddressPaymentPart::PaymentKeyHash(h) => {
                        bytes.extend_from_slice(h.as_ref())
                    }
                    ShelleyAddressPaymentPart::ScriptHash(h) => bytes.extend_from_slice(h.as_ref()),
                }
                if let Some(h) = delegation_hash {
                    bytes.extend_from_slice(h);
                }
                bytes
            }
        }
    }
}

impl StakeAddress {
    pub fn script_hash(&self) -> Option<ScriptHash> {
        match self.credential {
            StakeCredential::ScriptHash(hash) => Some(hash),
            StakeCredential::AddrKeyHash(_) => None,
        }
    }

    pub fn key_hash(&self) -> Option<KeyHash> {
        match self.credential {
            StakeCredential::AddrKeyHash(hash) => Some(hash),
            StakeCredential::ScriptHash(_) => None,
        }
    }
}
