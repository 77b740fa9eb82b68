use alloy_primitives::{U256, U512};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// 2^96, the scale of every Q96 value in this crate
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Computes `floor(a * b / denominator)` without intermediate overflow.
///
/// Returns zero for a zero denominator and saturates at `U256::MAX`, so callers
/// never have to handle an error path.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    if denominator.is_zero() || a.is_zero() || b.is_zero() {
        return U256::ZERO;
    }

    if let Some(product) = a.checked_mul(b) {
        return product / denominator;
    }

    let wide = U512::from(a) * U512::from(b) / U512::from(denominator);
    U256::saturating_from(wide)
}

/// Applies a basis-point rate to an amount, rounding down
pub fn apply_bps(amount: U256, bps: u32) -> U256 {
    mul_div(amount, U256::from(bps), U256::from(BPS_DENOMINATOR))
}

/// Lossy conversion used for reporting and volatility, never for settlement
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// A price of token A denominated in token B, stored as a Q96 fixed-point number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(U256);

impl Price {
    pub const ZERO: Price = Price(U256::ZERO);
    pub const ONE: Price = Price(Q96);

    pub const fn from_raw(raw_x96: U256) -> Self {
        Self(raw_x96)
    }

    /// Exact price `numerator / denominator`. A zero denominator yields a zero price.
    pub fn from_ratio(numerator: U256, denominator: U256) -> Self {
        Self(mul_div(numerator, Q96, denominator))
    }

    /// Converts a Uniswap v3 style `sqrtPriceX96` into a plain Q96 price.
    pub fn from_sqrt_price_x96(sqrt_price_x96: U256) -> Self {
        Self(mul_div(sqrt_price_x96, sqrt_price_x96, Q96))
    }

    /// Best-effort conversion from a decimal price. Negative, NaN and infinite
    /// inputs map to zero.
    pub fn from_f64(price: f64) -> Self {
        if !price.is_finite() || price <= 0.0 {
            return Self::ZERO;
        }

        let scaled = price * 2f64.powi(96);
        if scaled < 2f64.powi(127) {
            Self(U256::from(scaled as u128))
        } else {
            // keep the top 64 bits of precision and shift back into place
            let coarse = price * 2f64.powi(64);
            if coarse < 2f64.powi(127) {
                Self(U256::from(coarse as u128) << 32)
            } else {
                Self(U256::MAX)
            }
        }
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs_diff(&self, other: Price) -> Price {
        if self.0 >= other.0 { Price(self.0 - other.0) } else { Price(other.0 - self.0) }
    }

    pub fn to_f64(&self) -> f64 {
        u256_to_f64(self.0) / 2f64.powi(96)
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.8}", self.to_f64())
    }
}
