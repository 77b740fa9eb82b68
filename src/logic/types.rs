use crate::errors::GuardError;
use crate::utils::fixed_point::{Price, u256_to_f64};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Token amount in base units
pub type Amount = U256;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum SwapDirection {
    #[strum(serialize = "A_TO_B")]
    #[serde(rename = "A_TO_B")]
    AtoB,
    #[strum(serialize = "B_TO_A")]
    #[serde(rename = "B_TO_A")]
    BtoA,
}

impl SwapDirection {
    pub fn reverse(self) -> Self {
        match self {
            Self::AtoB => Self::BtoA,
            Self::BtoA => Self::AtoB,
        }
    }

    /// The token this direction sells into the pool
    pub fn token_in(self) -> PoolToken {
        match self {
            Self::AtoB => PoolToken::A,
            Self::BtoA => PoolToken::B,
        }
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum PoolToken {
    A,
    B,
}

impl PoolToken {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// One observed swap against a two-asset pool
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub pool: Address,
    pub trader: Address,
    pub direction: SwapDirection,
    pub amount_in: Amount,
    /// Pool price (A in terms of B) right before the swap executed
    pub price_before: Price,
    pub price_after: Price,
    /// Block number or any other strictly increasing sequence
    pub seq: u64,
}

/// Three trades that might form attacker -> victim -> attacker reversal
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SandwichCandidate {
    pub first: TradeRecord,
    pub second: TradeRecord,
    pub third: TradeRecord,
}

impl SandwichCandidate {
    pub fn new(first: TradeRecord, second: TradeRecord, third: TradeRecord) -> Result<Self, GuardError> {
        if first.seq >= second.seq {
            return Err(GuardError::NonMonotonicSequence { previous: first.seq, next: second.seq });
        }
        if second.seq >= third.seq {
            return Err(GuardError::NonMonotonicSequence { previous: second.seq, next: third.seq });
        }
        if first.pool != second.pool {
            return Err(GuardError::PoolMismatch { expected: first.pool, found: second.pool });
        }
        if first.pool != third.pool {
            return Err(GuardError::PoolMismatch { expected: first.pool, found: third.pool });
        }

        Ok(Self { first, second, third })
    }

    pub fn attacker(&self) -> Address {
        self.first.trader
    }

    pub fn victim(&self) -> Address {
        self.second.trader
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LossAssessment {
    pub pool: Address,
    pub victim: Address,
    pub attacker: Address,
    pub victim_seq: u64,
    pub fair_price: Price,
    pub exec_price: Price,
    pub expected_out: Amount,
    pub actual_out: Amount,
    pub loss: Amount,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Compensation {
    pub recipient: Address,
    pub amount: Amount,
    pub victim_seq: u64,
}

/// Reserves of the watched pool at a point in time
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool: Address,
    pub balance_a: Amount,
    pub balance_b: Amount,
    /// Seconds, or a block number when the observer has no wall clock
    pub timestamp: u64,
}

impl PoolSnapshot {
    pub fn total(&self) -> Amount {
        self.balance_a.saturating_add(self.balance_b)
    }

    pub fn balance_of(&self, token: PoolToken) -> Amount {
        match token {
            PoolToken::A => self.balance_a,
            PoolToken::B => self.balance_b,
        }
    }

    /// `balanceA / (balanceA + balanceB)`, 0.5 for an empty pool
    pub fn imbalance_ratio(&self) -> f64 {
        let total = self.total();
        if total.is_zero() {
            return 0.5;
        }
        u256_to_f64(self.balance_a) / u256_to_f64(total)
    }

    /// Spot price of A in B implied by the reserves, `None` when A is empty
    pub fn spot_price(&self) -> Option<f64> {
        if self.balance_a.is_zero() {
            return None;
        }
        Some(u256_to_f64(self.balance_b) / u256_to_f64(self.balance_a))
    }

    /// The token holding more than half of the pool, `None` when balanced
    pub fn overweight_token(&self) -> Option<PoolToken> {
        match self.balance_a.cmp(&self.balance_b) {
            std::cmp::Ordering::Greater => Some(PoolToken::A),
            std::cmp::Ordering::Less => Some(PoolToken::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Everything the chain observer can hand to the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObservedEvent {
    Trade(TradeRecord),
    Snapshot(PoolSnapshot),
    /// Operator top-up of the compensation treasury
    Funding(Amount),
}
