use thiserror::Error;

use crate::{rational_number::RationalNumber, ExUnits, ScriptLang};

/// A needed parameter block or field is absent for the active era
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("missing protocol parameter: {0}")]
pub struct MissingParameterError(pub &'static str);

/// Era-scoped protocol parameter snapshot. Each block is present only
/// when the source era defines it; accessors fail with the missing
/// field name rather than defaulting.
#[derive(Debug, Default, PartialEq, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProtocolParams {
    pub shelley: Option<ShelleyParams>,
    pub alonzo: Option<AlonzoParams>,
    pub babbage: Option<BabbageParams>,
    pub conway: Option<ConwayParams>,
}

//
// Shelley protocol parameters
//

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelleyParams {
    #[serde(rename = "minFeeA")]
    pub minfee_a: u32,

    #[serde(rename = "minFeeB")]
    pub minfee_b: u32,

    pub max_tx_size: u32,
    pub key_deposit: u64,
    pub pool_deposit: u64,

    #[serde(rename = "minUTxOValue")]
    pub min_utxo_value: u64,
}

//
// Alonzo protocol parameters
//

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlonzoParams {
    pub lovelace_per_utxo_word: u64, // Deprecated after transition to Babbage
    pub execution_prices: ExUnitPrices,
    pub max_tx_ex_units: ExUnits,
    pub max_block_ex_units: ExUnits,
    pub max_value_size: u32,
    pub collateral_percentage: u32,
    pub max_collateral_inputs: u32,
    pub plutus_v1_cost_model: Option<CostModel>,
}

//
// Babbage protocol parameters
//

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BabbageParams {
    pub coins_per_utxo_byte: u64,
    pub plutus_v2_cost_model: Option<CostModel>,
}

//
// Conway protocol parameters
//

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConwayParams {
    pub d_rep_deposit: u64,
    pub gov_action_deposit: u64,
    pub min_fee_ref_script_cost_per_byte: RationalNumber,
    pub plutus_v3_cost_model: Option<CostModel>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExUnitPrices {
    pub mem_price: RationalNumber,
    pub step_price: RationalNumber,
}

/// Cost model parameters for one Plutus language
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CostModel(Vec<i64>);

impl CostModel {
    pub fn new(costs: Vec<i64>) -> Self {
        Self(costs)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl ProtocolParams {
    pub fn shelley(&self) -> Result<&ShelleyParams, MissingParameterError> {
        self.shelley.as_ref().ok_or(MissingParameterError("shelley"))
    }

    pub fn alonzo(&self) -> Result<&AlonzoParams, MissingParameterError> {
        self.alonzo.as_ref().ok_or(MissingParameterError("alonzo"))
    }

    pub fn babbage(&self) -> Result<&BabbageParams, MissingParameterError> {
        self.babbage.as_ref().ok_or(MissingParameterError("babbage"))
    }

    pub fn conway(&self) -> Result<&ConwayParams, MissingParameterError> {
        self.conway.as_ref().ok_or(MissingParameterError("conway"))
    }

    /// Cost model for a language, if one is configured
    pub fn cost_model(&self, lang: ScriptLang) -> Option<&CostModel> {
        match lang {
            ScriptLang::PlutusV1 => {
                self.alonzo.as_ref().and_then(|p| p.plutus_v1_cost_model.as_ref())
            }
            ScriptLang::PlutusV2 => {
                self.babbage.as_ref().and_then(|p| p.plutus_v2_cost_model.as_ref())
            }
            ScriptLang::PlutusV3 => {
                self.conway.as_ref().and_then(|p| p.plutus_v3_cost_model.as_ref())
            }
        }
    }
}
