//! Era-aware minimum lovelace an output must carry.

use entasis_common::{Era, Lovelace, MissingParameterError, ProtocolParams, TxOutput, Value};

// Alonzo constants, in 8-byte words
const UTXO_ENTRY_SIZE_WITHOUT_VALUE: u64 = 27;
const ADA_ONLY_VALUE_SIZE: u64 = 2;

// Babbage constant overhead added to the serialized output size
const OUTPUT_OVERHEAD_BYTES: u64 = 160;

/// Size of a value in 8-byte words under the Mary/Alonzo rule
fn value_size_words(value: &Value) -> u64 {
    if !value.has_assets() {
        return ADA_ONLY_VALUE_SIZE;
    }
    let num_policies = value.assets.len() as u64;
    let mut num_assets = 0u64;
    let mut name_bytes = 0u64;
    for (_, assets) in &value.assets {
        num_assets += assets.len() as u64;
        name_bytes += assets.iter().map(|a| a.name.len() as u64).sum::<u64>();
    }
    let packed = num_assets * 12 + name_bytes + num_policies * 28;
    6 + packed.div_ceil(8)
}

/// Minimum lovelace the output must hold to be accepted by the ledger.
/// Shelley through Mary use the flat protocol value, Alonzo prices the
/// UTxO entry per word, Babbage onward prices the serialized output
/// per byte.
pub fn calculate_minimum_utxo(
    output: &TxOutput,
    params: &ProtocolParams,
    era: Era,
) -> Result<Lovelace, MissingParameterError> {
    match era {
        Era::Byron | Era::Shelley | Era::Allegra | Era::Mary => {
            Ok(params.shelley()?.min_utxo_value)
        }
        Era::Alonzo => {
            let alonzo = params.alonzo()?;
            let words = UTXO_ENTRY_SIZE_WITHOUT_VALUE + value_size_words(&output.value);
            Ok(words.saturating_mul(alonzo.lovelace_per_utxo_word))
        }
        Era::Babbage | Era::Conway => {
            let babbage = params.babbage()?;
            let bytes = OUTPUT_OVERHEAD_BYTES + entasis_codec::encoded_output_size(output);
            Ok(bytes.saturating_mul(babbage.coins_per_utxo_byte))
        }
    }
}
