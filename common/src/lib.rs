// Entasis common library - main library exports

pub mod address;
pub mod asset;
pub mod calculations;
pub mod certificate;
pub mod crypto;
pub mod era;
pub mod genesis_values;
pub mod hash;
pub mod protocol_params;
pub mod rational_number;
pub mod script;
pub mod tx;
pub mod utxo;

/// Integral monetary quantity, non-negative in any final state
pub type Lovelace = u64;

// Flattened re-exports
pub use self::address::{
    Address, AddressNetwork, ByronAddress, ShelleyAddress, ShelleyAddressDelegationPart,
    ShelleyAddressPaymentPart, StakeAddress, StakeCredential,
};
pub use self::asset::{
    AssetName, NativeAsset, NativeAssetDelta, NativeAssets, PolicyId, Value, ValueConversionError,
    ValueDelta,
};
pub use self::certificate::{scripts_needed_from_certificates, TxCertificate};
pub use self::era::{Era, PlutusEra};
pub use self::genesis_values::GenesisValues;
pub use self::hash::{DatumHash, Hash, KeyHash, PoolId, ScriptHash, TxHash};
pub use self::protocol_params::{
    AlonzoParams, BabbageParams, ConwayParams, CostModel, ExUnitPrices, MissingParameterError,
    ProtocolParams, ShelleyParams,
};
pub use self::rational_number::RationalNumber;
pub use self::script::{
    scripts_needed_from_inputs, scripts_needed_from_mint, scripts_needed_from_withdrawals, Datum,
    ExUnits, PlutusScript, RedeemerPointer, RedeemerTag, ScriptLang,
};
pub use self::tx::{
    CertificateEntry, InputWitness, MintEntry, ScriptSource, ScriptValidity, ScriptWitness,
    TransactionDraft, TxInput, TxOutput, ValidityInterval, Withdrawal,
};
pub use self::utxo::{UTxOIdentifier, UTxOSnapshot, UTxOValue, UnresolvedInputError};
