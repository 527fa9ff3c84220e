//! Linear fee model and the pre-body static fee estimator.

use entasis_common::{ConwayParams, ExUnitPrices, ExUnits, Lovelace, ShelleyParams};
use num_rational::Ratio;

// Worst-case CBOR sizes used by the static estimator
const SMALL_ARRAY: u64 = 1;
const UINT: u64 = 5;
const HASH_OBJ: u64 = 2 + 32;
const KEY_OBJ: u64 = 2 + 32;
const SIG_OBJ: u64 = 2 + 64;
const CHAIN_CODE_OBJ: u64 = 2 + 32;
const ADDRESS: u64 = 2 + 57;
const ATTRS_OVERHEAD: u64 = 2;

const INPUT_SIZE: u64 = SMALL_ARRAY + UINT + HASH_OBJ;
const OUTPUT_SIZE: u64 = SMALL_ARRAY + UINT + ADDRESS;
const SHELLEY_WITNESS_SIZE: u64 = SMALL_ARRAY + KEY_OBJ + SIG_OBJ;
const BYRON_WITNESS_BASE_SIZE: u64 = SMALL_ARRAY + KEY_OBJ + SIG_OBJ + CHAIN_CODE_OBJ;

/// The linear fee: `a * size + b`. Total and saturating, never fails.
pub fn transaction_fee(size_bytes: u64, minfee_a: u32, minfee_b: u32) -> Lovelace {
    (minfee_a as u64)
        .saturating_mul(size_bytes)
        .saturating_add(minfee_b as u64)
}

/// Rough fee estimate from component counts alone, before any
/// transaction body exists. Uses pessimistic per-component CBOR sizes,
/// so it over-approximates. Useful for coin selection; the balancer
/// itself always sizes a real encoded body instead.
pub fn estimate_transaction_fee(
    params: &ShelleyParams,
    n_inputs: u64,
    n_outputs: u64,
    n_shelley_witnesses: u64,
    n_byron_witnesses: u64,
    byron_attributes_size: u64,
) -> Lovelace {
    let byron_witness_size = BYRON_WITNESS_BASE_SIZE + ATTRS_OVERHEAD + byron_attributes_size;
    let size = n_inputs
        .saturating_mul(INPUT_SIZE)
        .saturating_add(n_outputs.saturating_mul(OUTPUT_SIZE))
        .saturating_add(n_shelley_witnesses.saturating_mul(SHELLEY_WITNESS_SIZE))
        .saturating_add(n_byron_witnesses.saturating_mul(byron_witness_size));
    transaction_fee(size, params.minfee_a, params.minfee_b)
}

/// Fee owed for script execution, priced per execution unit and
/// rounded up once over the combined rational sum
pub fn script_fee(prices: &ExUnitPrices, units: ExUnits) -> Lovelace {
    let mem = price(prices.mem_price, units.mem);
    let steps = price(prices.step_price, units.steps);
    (mem + steps).ceil().to_integer() as Lovelace
}

fn price(rate: entasis_common::RationalNumber, units: u64) -> Ratio<u128> {
    Ratio::new(
        units as u128 * *rate.numer() as u128,
        (*rate.denom()).max(1) as u128,
    )
}

/// Conway surcharge for reference scripts, rounded up
pub fn ref_script_fee(params: &ConwayParams, ref_script_bytes: u64) -> Lovelace {
    if ref_script_bytes == 0 {
        return 0;
    }
    let cost = params.min_fee_ref_script_cost_per_byte;
    let fee = Ratio::new(
        ref_script_bytes as u128 * *cost.numer() as u128,
        (*cost.denom()).max(1) as u128,
    );
    fee.ceil().to_integer() as Lovelace
}

#[cfg(test)]
mod tests {
    use super::*;
    use entasis_common::RationalNumber;

    fn shelley() -> ShelleyParams {
        ShelleyParams {
            minfee_a: 44,
            minfee_b: 155381,
            max_tx_size: 16384,
            key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            min_utxo_value: 1_000_000,
        }
    }

    #[test]
    fn fee_is_linear_in_size() {
        assert_eq!(transaction_fee(0, 44, 155381), 155381);
        assert_eq!(transaction_fee(100, 44, 155381), 155381 + 4400);
    }

    #[test]
    fn fee_saturates_instead_of_wrapping() {
        assert_eq!(transaction_fee(u64::MAX, u32::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn estimate_grows_with_components() {
        let p = shelley();
        let small = estimate_transaction_fee(&p, 1, 1, 1, 0, 0);
        let large = estimate_transaction_fee(&p, 2, 2, 2, 1, 10);
        assert!(large > small);
    }

    #[test]
    fn script_fee_rounds_up_once() {
        let prices = ExUnitPrices {
            mem_price: RationalNumber::new(577, 10_000),
            step_price: RationalNumber::new(721, 10_000_000),
        };
        // 1000 mem at 577/10000 = 57.7, 10000 steps at 721/10^7 = 0.721,
        // combined 58.421 rounds up to 59
        assert_eq!(script_fee(&prices, ExUnits::new(1000, 10_000)), 59);
        assert_eq!(script_fee(&prices, ExUnits::zero()), 0);
    }

    #[test]
    fn ref_script_fee_rounds_up() {
        let conway = ConwayParams {
            d_rep_deposit: 500_000_000,
            gov_action_deposit: 100_000_000_000,
            min_fee_ref_script_cost_per_byte: RationalNumber::new(15, 2),
            plutus_v3_cost_model: None,
        };
        // 3 bytes at 15/2 per byte = 22.5, rounded up to 23
        assert_eq!(ref_script_fee(&conway, 3), 23);
        assert_eq!(ref_script_fee(&conway, 0), 0);
    }
}
