//! Closed error taxonomy of the balancing engine. Every failure is
//! recoverable by changing the draft, the snapshot or the parameters.

use std::collections::BTreeSet;

use entasis_common::{
    Lovelace, MissingParameterError, RedeemerPointer, ScriptLang, UTxOIdentifier,
    UnresolvedInputError, ValueDelta,
};
use thiserror::Error;

/// Failure of a single script-witnessed item during execution unit
/// evaluation. Keyed by redeemer pointer in the evaluation map.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptExecutionError {
    #[error(transparent)]
    MissingInput(#[from] UnresolvedInputError),

    #[error("script requires a datum and none was supplied")]
    MissingDatum,

    #[error("supplied datum does not hash to the output's datum hash")]
    WrongDatum,

    #[error("key-witnessed item carries a script witness")]
    NotScriptWitnessed,

    #[error("redeemer does not point at a known script")]
    RedeemerPointsToUnknownScript,

    #[error("script unavailable; {} other position(s) are resolvable", resolvable.len())]
    MissingScript {
        resolvable: BTreeSet<RedeemerPointer>,
    },

    #[error("no cost model configured for {0:?}")]
    MissingCostModel(ScriptLang),

    #[error("execution unit accumulation overflowed")]
    ExecutionUnitsOverflow,

    #[error("script evaluation failed: {}", logs.join("; "))]
    EvaluationFailed { logs: Vec<String> },
}

/// The draft cannot be evaluated at all, as opposed to individual
/// scripts failing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionValidityError {
    #[error("validity bound beyond the reliable time horizon, last safe slot {max_safe_slot}")]
    TimeHorizonExceeded { max_safe_slot: u64 },

    #[error("transaction could not be translated for evaluation: {0}")]
    TranslationError(String),

    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),

    #[error(transparent)]
    MissingInput(#[from] UnresolvedInputError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollateralError {
    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),

    #[error(transparent)]
    MissingInput(#[from] UnresolvedInputError),

    #[error("{declared} collateral inputs declared, protocol maximum is {maximum}")]
    TooManyCollateralInputs { declared: u32, maximum: u32 },
}

/// Top-level balancing failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxBalanceError {
    #[error("invalid transaction body: {0}")]
    Body(String),

    #[error("{} script(s) failed during evaluation", .0.len())]
    ScriptExecutionFailures(Vec<(RedeemerPointer, ScriptExecutionError)>),

    #[error("scripts were expected to fail but all succeeded")]
    ScriptsExpectedToFailSucceeded,

    #[error("transaction balance is negative: {0:?}")]
    BalanceNegative(ValueDelta),

    #[error("change {actual} for output {output_index} is below the minimum {minimum}")]
    BalanceBelowMinUtxo {
        output_index: usize,
        minimum: Lovelace,
        actual: Lovelace,
    },

    #[error("output {output_index} holds {actual}, below the minimum {minimum}")]
    MinUtxoNotMet {
        output_index: usize,
        minimum: Lovelace,
        actual: Lovelace,
    },

    #[error(transparent)]
    MissingProtocolParameter(#[from] MissingParameterError),

    #[error("validity bound beyond the reliable time horizon, last safe slot {max_safe_slot}")]
    TimeHorizonExceeded { max_safe_slot: u64 },

    #[error("no execution units evaluated for redeemer {0}")]
    MissingExecutionUnits(RedeemerPointer),

    #[error("non-ada assets left over that cannot form a change output: {0:?}")]
    NonAdaBalance(ValueDelta),

    #[error("{declared} collateral inputs declared, protocol maximum is {maximum}")]
    TooManyCollateralInputs { declared: u32, maximum: u32 },

    #[error("input {0} is not present in the UTxO snapshot")]
    MissingInput(UTxOIdentifier),
}

impl From<TransactionValidityError> for TxBalanceError {
    fn from(error: TransactionValidityError) -> Self {
        match error {
            TransactionValidityError::TimeHorizonExceeded { max_safe_slot } => {
                TxBalanceError::TimeHorizonExceeded { max_safe_slot }
            }
            TransactionValidityError::TranslationError(message) => TxBalanceError::Body(message),
            TransactionValidityError::MissingParameter(e) => {
                TxBalanceError::MissingProtocolParameter(e)
            }
        }
    }
}

impl From<BalanceError> for TxBalanceError {
    fn from(error: BalanceError) -> Self {
        match error {
            BalanceError::MissingParameter(e) => TxBalanceError::MissingProtocolParameter(e),
            BalanceError::MissingInput(e) => TxBalanceError::MissingInput(e.0),
        }
    }
}

impl From<CollateralError> for TxBalanceError {
    fn from(error: CollateralError) -> Self {
        match error {
            CollateralError::MissingParameter(e) => TxBalanceError::MissingProtocolParameter(e),
            CollateralError::MissingInput(e) => TxBalanceError::MissingInput(e.0),
            CollateralError::TooManyCollateralInputs { declared, maximum } => {
                TxBalanceError::TooManyCollateralInputs { declared, maximum }
            }
        }
    }
}

impl From<UnresolvedInputError> for TxBalanceError {
    fn from(error: UnresolvedInputError) -> Self {
        TxBalanceError::MissingInput(error.0)
    }
}
