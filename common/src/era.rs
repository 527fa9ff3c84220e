//! Era variants and capability tokens.
//!
//! Operations that only exist from a certain era onward take a typed
//! witness rather than re-checking an era tag internally: a caller
//! proves once, at the boundary, that the active era supports Plutus
//! scripts (and with them collateral), and the token carries that proof
//! into the evaluator and collateral calculator.

use crate::ScriptLang;

/// Ledger eras, oldest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Era {
    Byron,
    Shelley,
    Allegra,
    Mary,
    Alonzo,
    Babbage,
    Conway,
}

impl Era {
    /// Capability witness for Plutus script execution and collateral,
    /// available from Alonzo onward
    pub fn plutus(&self) -> Option<PlutusEra> {
        if *self >= Era::Alonzo {
            Some(PlutusEra { era: *self })
        } else {
            None
        }
    }

    pub fn has_plutus(&self) -> bool {
        self.plutus().is_some()
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Proof that the active era supports Plutus scripts. Only obtainable
/// through [`Era::plutus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlutusEra {
    era: Era,
}

impl PlutusEra {
    pub fn era(&self) -> Era {
        self.era
    }

    /// Script languages usable in this era
    pub fn supported_languages(&self) -> &'static [ScriptLang] {
        match self.era {
            Era::Alonzo => &[ScriptLang::PlutusV1],
            Era::Babbage => &[ScriptLang::PlutusV1, ScriptLang::PlutusV2],
            _ => &[
                ScriptLang::PlutusV1,
                ScriptLang::PlutusV2,
                ScriptLang::PlutusV3,
            ],
        }
    }

    pub fn supports(&self, lang: ScriptLang) -> bool {
        self.supported_languages().contains(&lang)
    }
}
