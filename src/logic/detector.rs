use super::config::DetectorConfig;
use super::quote::quote;
use super::types::{Amount, LossAssessment, SandwichCandidate, SwapDirection, TradeRecord};
use crate::utils::fixed_point::Price;
use alloy_primitives::U256;
use tracing::debug;

/// Attacker trades twice around the victim: same side before, opposite side after.
///
/// Self-trades never qualify because the victim must differ from the attacker.
pub fn is_sandwich(candidate: &SandwichCandidate) -> bool {
    let SandwichCandidate { first, second, third } = candidate;

    first.trader == third.trader
        && first.trader != second.trader
        && first.direction == second.direction
        && first.direction != third.direction
}

/// Stateless sandwich detector. Prices come from the trades themselves, no oracle involved.
#[derive(Clone, Debug)]
pub struct Detector {
    config: DetectorConfig,
    min_price_move: Price,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        let min_price_move = Price::from_f64(config.min_price_move);
        Self { config, min_price_move }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn window(&self) -> usize {
        self.config.window.max(1)
    }

    /// Victim loss between the fair price and the price the victim actually got.
    ///
    /// Gaps smaller than the configured minimum price move count as drift and yield zero.
    pub fn compute_loss(&self, fair_price: Price, exec_price: Price, amount_in: Amount, direction: SwapDirection) -> Amount {
        self.quote_loss(fair_price, exec_price, amount_in, direction).2
    }

    fn quote_loss(&self, fair_price: Price, exec_price: Price, amount_in: Amount, direction: SwapDirection) -> (Amount, Amount, Amount) {
        let expected_out = quote(amount_in, fair_price, direction);
        let actual_out = quote(amount_in, exec_price, direction);

        if amount_in.is_zero() || fair_price.is_zero() || exec_price.is_zero() {
            return (expected_out, actual_out, U256::ZERO);
        }
        if fair_price.abs_diff(exec_price) < self.min_price_move {
            return (expected_out, actual_out, U256::ZERO);
        }

        (expected_out, actual_out, expected_out.saturating_sub(actual_out))
    }

    /// Assesses a candidate, `None` when it is not a sandwich
    pub fn assess(&self, candidate: &SandwichCandidate) -> Option<LossAssessment> {
        if !is_sandwich(candidate) {
            return None;
        }

        let victim = &candidate.second;
        let fair_price = candidate.first.price_before;
        let exec_price = victim.price_before;
        let (expected_out, actual_out, loss) = self.quote_loss(fair_price, exec_price, victim.amount_in, victim.direction);

        Some(LossAssessment {
            pool: victim.pool,
            victim: victim.trader,
            attacker: candidate.attacker(),
            victim_seq: victim.seq,
            fair_price,
            exec_price,
            expected_out,
            actual_out,
            loss,
        })
    }

    /// Scans every victim position of an ordered trade list.
    ///
    /// At most one assessment is produced per victim, see `assess_at`.
    pub fn scan(&self, trades: &[TradeRecord]) -> Vec<LossAssessment> {
        (0..trades.len()).filter_map(|victim_idx| self.assess_at(trades, victim_idx)).collect()
    }

    /// Assesses the trade at `victim_idx` as a potential victim.
    ///
    /// The attacker legs closest to the victim win: first legs are searched
    /// from nearest backwards, and for each of them reversal legs from nearest
    /// forwards. The result is only final once `trades` extends `window`
    /// trades past the victim.
    pub fn assess_at(&self, trades: &[TradeRecord], victim_idx: usize) -> Option<LossAssessment> {
        let last_idx = trades.len().checked_sub(1)?;
        if victim_idx > last_idx {
            return None;
        }

        let window = self.window();
        let first_start = victim_idx.saturating_sub(window);
        let third_end = victim_idx.saturating_add(window).min(last_idx);

        for first_idx in (first_start..victim_idx).rev() {
            for third_idx in (victim_idx + 1)..=third_end {
                if let Some(assessment) = self.try_assess(trades, first_idx, victim_idx, third_idx) {
                    return Some(assessment);
                }
            }
        }
        None
    }

    fn try_assess(&self, trades: &[TradeRecord], first_idx: usize, victim_idx: usize, third_idx: usize) -> Option<LossAssessment> {
        let candidate = match SandwichCandidate::new(trades[first_idx], trades[victim_idx], trades[third_idx]) {
            Ok(candidate) => candidate,
            Err(e) => {
                debug!("Rejected sandwich candidate at victim seq {}: {}", trades[victim_idx].seq, e);
                return None;
            }
        };

        let assessment = self.assess(&candidate)?;
        debug!(
            "Sandwich matched: attacker={} victim={} seq={} loss={}",
            assessment.attacker, assessment.victim, assessment.victim_seq, assessment.loss
        );
        Some(assessment)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
