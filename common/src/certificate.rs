//! Certificates, reduced to the variants that move deposits or need
//! witnesses during balancing.

use crate::{KeyHash, Lovelace, PoolId, RedeemerPointer, RedeemerTag, ScriptHash, StakeAddress,
    StakeCredential};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TxCertificate {
    /// Stake registration (deposit from protocol parameters)
    StakeRegistration(StakeAddress),

    /// Stake de-registration (refund looked up from ledger state)
    StakeDeregistration(StakeAddress),

    /// Stake delegation to a pool
    StakeDelegation { stake: StakeAddress, pool: PoolId },

    /// Post-Conway stake registration carrying its deposit explicitly
    Registration {
        stake: StakeAddress,
        deposit: Lovelace,
    },

    /// Post-Conway stake de-registration carrying its refund explicitly
    Deregistration {
        stake: StakeAddress,
        refund: Lovelace,
    },

    /// Pool registration (deposit only on first registration)
    PoolRegistration { operator: PoolId },

    /// Pool retirement at the given epoch
    PoolRetirement { operator: PoolId, epoch: u64 },

    /// DRep registration with explicit deposit
    DRepRegistration {
        credential: StakeCredential,
        deposit: Lovelace,
    },

    /// DRep de-registration with explicit refund
    DRepDeregistration {
        credential: StakeCredential,
        refund: Lovelace,
    },
}

impl TxCertificate {
    fn credential(&self) -> Option<StakeCredential> {
        match self {
            TxCertificate::StakeRegistration(addr)
            | TxCertificate::StakeDeregistration(addr)
            | TxCertificate::StakeDelegation { stake: addr, .. }
            | TxCertificate::Registration { stake: addr, .. }
            | TxCertificate::Deregistration { stake: addr, .. } => Some(addr.credential),
            TxCertificate::DRepRegistration { credential, .. }
            | TxCertificate::DRepDeregistration { credential, .. } => Some(*credential),
            TxCertificate::PoolRegistration { .. } | TxCertificate::PoolRetirement { .. } => None,
        }
    }

    /// Script credential authorising this certificate, if any
    pub fn script_credential(&self) -> Option<ScriptHash> {
        match self.credential() {
            Some(StakeCredential::ScriptHash(hash)) => Some(hash),
            _ => None,
        }
    }

    /// Key that must witness this certificate, if any. Pool certificates
    /// are witnessed by the operator key.
    pub fn key_credential(&self) -> Option<KeyHash> {
        match self {
            TxCertificate::PoolRegistration { operator }
            | TxCertificate::PoolRetirement { operator, .. } => Some(KeyHash::new(**operator)),
            _ => match self.credential() {
                Some(StakeCredential::AddrKeyHash(hash)) => Some(hash),
                _ => None,
            },
        }
    }
}

/// Scripts needed by certificates.
/// Returns a list of (RedeemerPointer, ScriptHash) pairs.
/// NOTE:
/// Certificates keep their declared list order
pub fn scripts_needed_from_certificates(
    certificates: &[TxCertificate],
) -> Vec<(RedeemerPointer, ScriptHash)> {
    let mut scripts_needed = Vec::new();
    for (index, certificate) in certificates.iter().enumerate() {
        if let Some(script_hash) = certificate.script_credential() {
            scripts_needed.push((
                RedeemerPointer::new(RedeemerTag::Cert, index as u32),
                script_hash,
            ));
        }
    }
    scripts_needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddressNetwork, Hash};

    fn script_stake(byte: u8) -> StakeAddress {
        StakeAddress {
            network: AddressNetwork::Main,
            credential: StakeCredential::ScriptHash(Hash::new([byte; 28])),
        }
    }

    #[test]
    fn cert_pointer_uses_list_order() {
        let certs = vec![
            TxCertificate::PoolRetirement {
                operator: Hash::new([1; 28]),
                epoch: 500,
            },
            TxCertificate::StakeDeregistration(script_stake(2)),
        ];
        let needed = scripts_needed_from_certificates(&certs);
        assert_eq!(needed.len(), 1);
        assert_eq!(needed[0].0, RedeemerPointer::new(RedeemerTag::Cert, 1));
        assert_eq!(needed[0].1, Hash::new([2; 28]));
    }

    #[test]
    fn pool_certificates_need_operator_key() {
        let cert = TxCertificate::PoolRegistration {
            operator: Hash::new([3; 28]),
        };
        assert_eq!(cert.key_credential(), Some(Hash::new([3; 28])));
        assert_eq!(cert.script_credential(), None);
    }
}
