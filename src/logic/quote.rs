use super::types::{Amount, SwapDirection};
use crate::utils::fixed_point::{Price, Q96, mul_div};
use alloy_primitives::U256;

/// Constant-product spot quote for a swap at a fixed price.
///
/// `price` is A in terms of B, so selling A multiplies and selling B divides.
/// The function is total: a zero amount or a zero price quotes zero.
pub fn quote(amount_in: Amount, price: Price, direction: SwapDirection) -> Amount {
    if amount_in.is_zero() || price.is_zero() {
        return U256::ZERO;
    }

    match direction {
        SwapDirection::AtoB => mul_div(amount_in, price.raw(), Q96),
        SwapDirection::BtoA => mul_div(amount_in, Q96, price.raw()),
    }
}
