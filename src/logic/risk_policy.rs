use super::config::RiskConfig;
use super::types::{Amount, PoolSnapshot, PoolToken, SwapDirection};
use super::volatility::PriceHistory;
use crate::utils::fixed_point::{BPS_DENOMINATOR, mul_div};
use alloy_primitives::{U256, U512};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use strum_macros::IntoStaticStr;
use tracing::{debug, info};

const HALF_BPS: u32 = BPS_DENOMINATOR / 2;

/// What the executor is asked to do with the pool's liquidity
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    None,
    /// Same-pool swap selling the overweight token
    LocalRebalance { amount: Amount, direction: SwapDirection },
    /// Move the overweight token out through the bridge
    CrossChainEvacuate { amount: Amount, token: PoolToken },
    /// Pull overweight liquidity while the pool looks manipulated
    ProtectiveWithdraw { amount: Amount, token: PoolToken },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::None => U256::ZERO,
            Self::LocalRebalance { amount, .. }
            | Self::CrossChainEvacuate { amount, .. }
            | Self::ProtectiveWithdraw { amount, .. } => *amount,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::LocalRebalance { amount, direction } => write!(f, "LOCAL_REBALANCE({amount}, {direction})"),
            Self::CrossChainEvacuate { amount, token } => write!(f, "CROSS_CHAIN_EVACUATE({amount}, {token})"),
            Self::ProtectiveWithdraw { amount, token } => write!(f, "PROTECTIVE_WITHDRAW({amount}, {token})"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoActionReason {
    Balanced,
    EmptyPool,
    CooldownActive { remaining_secs: u64 },
    BelowMinimumTradeAmount { proposed: Amount },
}

impl Display for NoActionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balanced => write!(f, "deviation within thresholds"),
            Self::EmptyPool => write!(f, "pool has no liquidity"),
            Self::CooldownActive { remaining_secs } => {
                write!(f, "protective action suppressed, cooldown active for another {remaining_secs}s")
            }
            Self::BelowMinimumTradeAmount { proposed } => write!(f, "proposed amount {proposed} below minimum trade amount"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: Action,
    /// Set whenever `action` is `None`
    pub reason: Option<NoActionReason>,
}

impl Decision {
    fn act(action: Action) -> Self {
        Self { action, reason: None }
    }

    fn none(reason: NoActionReason) -> Self {
        Self { action: Action::None, reason: Some(reason) }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RiskState {
    pub imbalance_ratio: f64,
    pub volatility: f64,
    pub last_protective_action_at: Option<u64>,
}

/// Pure decision over one snapshot. Identical inputs always give identical output.
///
/// Priority: protective withdraw, cross-chain evacuation, local rebalance, none.
pub fn decide(state: &RiskState, snapshot: &PoolSnapshot, config: &RiskConfig) -> Decision {
    let total = snapshot.total();
    if total.is_zero() {
        return Decision::none(NoActionReason::EmptyPool);
    }
    let Some(heavy) = snapshot.overweight_token() else {
        return Decision::none(NoActionReason::Balanced);
    };

    let heavy_balance = snapshot.balance_of(heavy);
    let light_balance = snapshot.balance_of(heavy.other());
    let gap = heavy_balance - light_balance;

    let vs_imbalance = compare_deviation(gap, total, config.imbalance_threshold_bps);
    let vs_severe = compare_deviation(gap, total, config.severe_threshold_bps);

    if state.volatility > config.mev_volatility_threshold && vs_imbalance == Ordering::Greater {
        if let Some(last) = state.last_protective_action_at {
            let elapsed = snapshot.timestamp.saturating_sub(last);
            if elapsed < config.cooldown_secs {
                return Decision::none(NoActionReason::CooldownActive { remaining_secs: config.cooldown_secs - elapsed });
            }
        }

        let amount = protective_withdraw_amount(heavy_balance, light_balance, config.removal_step_bps);
        return sized(Action::ProtectiveWithdraw { amount, token: heavy }, config);
    }

    if vs_severe != Ordering::Less {
        let amount = evacuation_amount(heavy_balance, total, config.target_residual_bps);
        return sized(Action::CrossChainEvacuate { amount, token: heavy }, config);
    }

    if vs_imbalance != Ordering::Less {
        let amount = rebalance_amount(heavy_balance, total, config.target_residual_bps);
        let direction = match heavy {
            PoolToken::A => SwapDirection::AtoB,
            PoolToken::B => SwapDirection::BtoA,
        };
        return sized(Action::LocalRebalance { amount, direction }, config);
    }

    Decision::none(NoActionReason::Balanced)
}

fn sized(action: Action, config: &RiskConfig) -> Decision {
    let amount = action.amount();
    if amount.is_zero() || amount < config.min_trade_amount {
        return Decision::none(NoActionReason::BelowMinimumTradeAmount { proposed: amount });
    }
    Decision::act(action)
}

/// Compares `|ratio - 0.5| = gap / (2 * total)` against `threshold_bps / 10000` exactly
fn compare_deviation(gap: U256, total: U256, threshold_bps: u32) -> Ordering {
    let lhs = U512::from(gap) * U512::from(BPS_DENOMINATOR);
    let rhs = U512::from(total) * U512::from(2 * threshold_bps);
    lhs.cmp(&rhs)
}

/// Overweight amount to swap at value parity so its share drops to `0.5 + target`
fn rebalance_amount(heavy: U256, total: U256, target_residual_bps: u32) -> U256 {
    let target_share = HALF_BPS + target_residual_bps;
    heavy.saturating_sub(mul_div(total, U256::from(target_share), U256::from(BPS_DENOMINATOR)))
}

/// Overweight amount to remove so its share of the remaining pool is `0.5 + target`
fn evacuation_amount(heavy: U256, total: U256, target_residual_bps: u32) -> U256 {
    let target_share = HALF_BPS + target_residual_bps;
    if target_share >= BPS_DENOMINATOR {
        return U256::ZERO;
    }

    let lhs = U512::from(heavy) * U512::from(BPS_DENOMINATOR);
    let rhs = U512::from(total) * U512::from(target_share);
    if lhs <= rhs {
        return U256::ZERO;
    }
    U256::saturating_from((lhs - rhs) / U512::from(BPS_DENOMINATOR - target_share))
}

/// Overweight amount to remove so the deviation shrinks by `step_bps`, never past balance
fn protective_withdraw_amount(heavy: U256, light: U256, step_bps: u32) -> U256 {
    let total = U512::from(heavy) + U512::from(light);
    let step = U512::from(step_bps);
    let denominator = U512::from(light) * U512::from(BPS_DENOMINATOR) + step * total;
    if denominator.is_zero() {
        return U256::ZERO;
    }

    let amount = U256::saturating_from(step * total * total / denominator);
    amount.min(heavy - light)
}

/// Owns the price window and the cooldown clock for one pool.
///
/// Single writer: callers serialize `evaluate` and `confirm_protective_withdraw`.
#[derive(Clone, Debug)]
pub struct RiskPolicy {
    config: RiskConfig,
    history: PriceHistory,
    last_protective_action_at: Option<u64>,
}

impl RiskPolicy {
    pub fn new(config: RiskConfig) -> Self {
        let history = PriceHistory::new(config.price_history_capacity.max(2));
        Self { config, history, last_protective_action_at: None }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn last_protective_action_at(&self) -> Option<u64> {
        self.last_protective_action_at
    }

    /// Current state as seen by `snapshot`, without recording it
    pub fn state_for(&self, snapshot: &PoolSnapshot) -> RiskState {
        RiskState {
            imbalance_ratio: snapshot.imbalance_ratio(),
            volatility: self.history.volatility(),
            last_protective_action_at: self.last_protective_action_at,
        }
    }

    /// Records the snapshot's spot price and returns the resulting state
    pub fn observe(&mut self, snapshot: &PoolSnapshot) -> RiskState {
        if let Some(price) = snapshot.spot_price() {
            self.history.push(price);
        }
        self.state_for(snapshot)
    }

    /// Observes the snapshot and proposes an action. Nothing is committed here.
    pub fn evaluate(&mut self, snapshot: &PoolSnapshot) -> Decision {
        let state = self.observe(snapshot);
        let decision = decide(&state, snapshot, &self.config);

        match decision.reason {
            Some(reason) => debug!(
                "Risk decision at {}: NONE ({}), ratio={:.4}, volatility={:.4}",
                snapshot.timestamp, reason, state.imbalance_ratio, state.volatility
            ),
            None => info!(
                "Risk decision at {}: {}, ratio={:.4}, volatility={:.4}",
                snapshot.timestamp, decision.action, state.imbalance_ratio, state.volatility
            ),
        }
        decision
    }

    /// Starts the cooldown once the executor confirmed a protective withdraw
    pub fn confirm_protective_withdraw(&mut self, executed_at: u64) {
        self.last_protective_action_at = Some(executed_at);
        info!("Protective withdraw confirmed at {}, cooldown {}s", executed_at, self.config.cooldown_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const ONE_UNIT: u64 = 1_000_000_000_000_000_000;

    fn units(n: u64) -> U256 {
        U256::from(n) * U256::from(ONE_UNIT)
    }

    fn snapshot(a: u64, b: u64, timestamp: u64) -> PoolSnapshot {
        PoolSnapshot { pool: Address::repeat_byte(0xAA), balance_a: units(a), balance_b: units(b), timestamp }
    }

    fn calm() -> RiskState {
        RiskState { imbalance_ratio: 0.5, volatility: 0.0, last_protective_action_at: None }
    }

    fn volatile() -> RiskState {
        RiskState { imbalance_ratio: 0.5, volatility: 0.5, last_protective_action_at: None }
    }

    #[test]
    fn test_balanced_pool_does_nothing() {
        let decision = decide(&calm(), &snapshot(1000, 1000, 0), &RiskConfig::default());
        assert_eq!(decision.action, Action::None);
        assert_eq!(decision.reason, Some(NoActionReason::Balanced));

        let decision = decide(&calm(), &snapshot(1050, 950, 0), &RiskConfig::default());
        assert_eq!(decision.reason, Some(NoActionReason::Balanced));
    }

    #[test]
    fn test_empty_pool() {
        let decision = decide(&calm(), &snapshot(0, 0, 0), &RiskConfig::default());
        assert_eq!(decision.reason, Some(NoActionReason::EmptyPool));
    }

    #[test]
    fn test_ten_percent_deviation_rebalances_toward_target() {
        let mut policy = RiskPolicy::new(RiskConfig::default());
        policy.evaluate(&snapshot(1000, 1000, 0));
        let decision = policy.evaluate(&snapshot(800, 1200, 5));

        // 1200 - 0.59 * 2000 = 20 units of B sold for A
        assert_eq!(decision.action, Action::LocalRebalance { amount: units(20), direction: SwapDirection::BtoA });
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn test_a_heavy_pool_rebalances_a_to_b() {
        let decision = decide(&calm(), &snapshot(1300, 700, 0), &RiskConfig::default());
        assert_eq!(decision.action, Action::LocalRebalance { amount: units(120), direction: SwapDirection::AtoB });
    }

    #[test]
    fn test_severe_deviation_evacuates() {
        // ratio 0.15, deviation 35%
        let decision = decide(&calm(), &snapshot(300, 1700, 0), &RiskConfig::default());
        let expected = units(5_200_000) / U256::from(4100);
        assert_eq!(decision.action, Action::CrossChainEvacuate { amount: expected, token: PoolToken::B });
    }

    #[test]
    fn test_exact_severe_boundary_evacuates() {
        let decision = decide(&calm(), &snapshot(500, 1500, 0), &RiskConfig::default());
        assert!(matches!(decision.action, Action::CrossChainEvacuate { token: PoolToken::B, .. }));
    }

    #[test]
    fn test_a600_b1400_rebalances_not_evacuates_under_defaults() {
        // a 600/1400 pool deviates 20%, below the default 25% severe threshold
        let decision = decide(&calm(), &snapshot(600, 1400, 0), &RiskConfig::default());
        assert_eq!(decision.action, Action::LocalRebalance { amount: units(220), direction: SwapDirection::BtoA });
    }

    #[test]
    fn test_a600_b1400_evacuates_only_with_twenty_percent_severe_threshold() {
        let config = RiskConfig { severe_threshold_bps: 2000, ..Default::default() };
        let decision = decide(&calm(), &snapshot(600, 1400, 0), &config);
        let expected = units(2_200_000) / U256::from(4100);
        assert_eq!(decision.action, Action::CrossChainEvacuate { amount: expected, token: PoolToken::B });

        // evacuating that amount leaves B at the 59% target share
        let remaining_b = units(1400) - expected;
        let remaining_total = units(2000) - expected;
        let share_bps = remaining_b * U256::from(10_000) / remaining_total;
        assert_eq!(share_bps, U256::from(5900));
    }

    #[test]
    fn test_volatile_imbalanced_pool_withdraws_first() {
        let mut policy = RiskPolicy::new(RiskConfig::default());
        policy.evaluate(&snapshot(1000, 1000, 0));
        let decision = policy.evaluate(&snapshot(600, 1400, 5));

        // 0.05 * 2000^2 / (600 + 0.05 * 2000) units
        let expected = units(2_000_000) / U256::from(7000);
        assert_eq!(decision.action, Action::ProtectiveWithdraw { amount: expected, token: PoolToken::B });
    }

    #[test]
    fn test_protective_requires_strictly_more_than_imbalance_threshold() {
        let decision = decide(&volatile(), &snapshot(800, 1200, 0), &RiskConfig::default());
        assert!(matches!(decision.action, Action::LocalRebalance { .. }));
    }

    #[test]
    fn test_protective_withdraw_never_overshoots_balance() {
        let config = RiskConfig { removal_step_bps: 5000, imbalance_threshold_bps: 100, severe_threshold_bps: 4000, ..Default::default() };
        let decision = decide(&volatile(), &snapshot(950, 1050, 0), &config);
        assert_eq!(decision.action, Action::ProtectiveWithdraw { amount: units(100), token: PoolToken::B });
    }

    #[test]
    fn test_cooldown_suppresses_then_expires() {
        let config = RiskConfig::default();
        let mut state = volatile();
        state.last_protective_action_at = Some(100);

        let decision = decide(&state, &snapshot(600, 1400, 200), &config);
        assert_eq!(decision.action, Action::None);
        assert_eq!(decision.reason, Some(NoActionReason::CooldownActive { remaining_secs: 200 }));

        let decision = decide(&state, &snapshot(600, 1400, 400), &config);
        assert!(matches!(decision.action, Action::ProtectiveWithdraw { .. }));
    }

    #[test]
    fn test_cooldown_allows_at_most_one_withdraw() {
        let mut policy = RiskPolicy::new(RiskConfig::default());
        policy.evaluate(&snapshot(1000, 1000, 0));

        let mut withdraws = 0;
        for t in [10u64, 20, 60, 120, 250] {
            let decision = policy.evaluate(&snapshot(600, 1400, t));
            if let Action::ProtectiveWithdraw { .. } = decision.action {
                withdraws += 1;
                policy.confirm_protective_withdraw(t);
            }
        }
        assert_eq!(withdraws, 1);
        assert_eq!(policy.last_protective_action_at(), Some(10));
    }

    #[test]
    fn test_unconfirmed_withdraw_does_not_start_cooldown() {
        let mut policy = RiskPolicy::new(RiskConfig::default());
        policy.evaluate(&snapshot(1000, 1000, 0));
        let first = policy.evaluate(&snapshot(600, 1400, 10));
        let second = policy.evaluate(&snapshot(600, 1400, 20));

        assert!(matches!(first.action, Action::ProtectiveWithdraw { .. }));
        assert!(matches!(second.action, Action::ProtectiveWithdraw { .. }));
        assert_eq!(policy.last_protective_action_at(), None);
    }

    #[test]
    fn test_tiny_pool_below_minimum_trade() {
        let small = PoolSnapshot { pool: Address::ZERO, balance_a: U256::from(800), balance_b: U256::from(1200), timestamp: 0 };
        let decision = decide(&calm(), &small, &RiskConfig::default());
        assert_eq!(decision.action, Action::None);
        assert_eq!(decision.reason, Some(NoActionReason::BelowMinimumTradeAmount { proposed: U256::from(20) }));
    }

    #[test]
    fn test_decide_is_deterministic() {
        let config = RiskConfig::default();
        for state in [calm(), volatile()] {
            for (a, b) in [(1000, 1000), (800, 1200), (600, 1400), (100, 1900), (1500, 500)] {
                let snap = snapshot(a, b, 42);
                assert_eq!(decide(&state, &snap, &config), decide(&state, &snap, &config));
            }
        }
    }

    #[test]
    fn test_action_kind_and_display() {
        let action = Action::LocalRebalance { amount: U256::from(5), direction: SwapDirection::AtoB };
        assert_eq!(action.kind(), "LOCAL_REBALANCE");
        assert_eq!(action.to_string(), "LOCAL_REBALANCE(5, A_TO_B)");
        assert_eq!(Action::None.kind(), "NONE");
        assert!(Action::None.is_none());
    }
}
