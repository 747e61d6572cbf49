//! Numeric helpers shared by the calculation engine and the trend analyzer

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept on every persisted CO2e figure
pub const PERSISTED_DECIMALS: u32 = 4;

/// Comparison tolerance for aggregate invariants (kg CO2e)
pub const CO2E_TOLERANCE: f64 = 1e-4;

/// Round to `dp` decimal places, ties to even.
///
/// The value goes through `Decimal` so that a figure such as `2.00005`
/// rounds on its decimal representation rather than on the nearest binary
/// fraction. Values outside the `Decimal` range are returned unchanged.
pub fn round_half_even(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Round a CO2e figure for persistence
pub fn round_co2e(value: f64) -> f64 {
    round_half_even(value, PERSISTED_DECIMALS)
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= CO2E_TOLERANCE
}
