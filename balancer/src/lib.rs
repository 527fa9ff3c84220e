//! Entasis balancer - fee, collateral and change computation for
//! Cardano transaction drafts.

pub mod auto_balance;
pub mod balance;
pub mod collateral;
pub mod error;
pub mod evaluation;
pub mod fee;
pub mod min_utxo;
pub mod witness;

pub use self::auto_balance::{
    make_transaction_body_auto_balance, BalancedTransaction, LedgerDeposits,
    MAX_CHANGE_LOVELACE, MAX_FEE_PLACEHOLDER,
};
pub use self::balance::evaluate_transaction_balance;
pub use self::collateral::{calculate_collateral, required_collateral, CollateralPlan};
pub use self::error::{
    BalanceError, CollateralError, ScriptExecutionError, TransactionValidityError, TxBalanceError,
};
pub use self::evaluation::{
    evaluate_transaction_execution_units, ExecutionUnitsMap, OracleError, ScriptCall,
    ScriptOracle,
};
pub use self::fee::{estimate_transaction_fee, ref_script_fee, script_fee, transaction_fee};
pub use self::min_utxo::calculate_minimum_utxo;
pub use self::witness::estimate_key_witness_count;
