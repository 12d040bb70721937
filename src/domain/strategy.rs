//! Trade policy configuration.

/// Parameters for the indicator-gated policy.
#[derive(Debug, Clone)]
pub struct GatedParams {
    /// RSI level below which an entry may trigger.
    pub rsi_oversold: f64,
    /// Take-profit as a fraction of the buy price.
    pub take_profit_pct: f64,
    /// Stop-loss as a fraction of the buy price.
    pub stop_loss_pct: f64,
}

impl Default for GatedParams {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            take_profit_pct: 0.05,
            stop_loss_pct: 0.02,
        }
    }
}

/// How the simulator trades an eligible series.
#[derive(Debug, Clone)]
pub enum TradePolicy {
    /// Buy at the first eligible bar's open, sell at the last eligible bar's
    /// close. Always produces exactly one trade when any eligible bar exists.
    HoldPeriod,
    /// Enter on RSI-oversold plus a 20/50 SMA bullish crossover; exit on
    /// take-profit, stop-loss, or forced close at period end.
    IndicatorGated(GatedParams),
}

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub policy: TradePolicy,
    /// Whether a zero-P&L trade counts as a win. Off by default: breakeven
    /// trades are tallied as losses.
    pub breakeven_is_win: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            policy: TradePolicy::HoldPeriod,
            breakeven_is_win: false,
        }
    }
}
