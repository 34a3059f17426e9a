//! Random draws consumed by one simulation tick.
//!
//! The draws are sampled up front and handed to the pure tick transition,
//! which keeps the state machine deterministic under test: inject literal
//! draws, or sample from a seeded rng.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Direction label attached to a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    /// A simulated buy.
    Buy,
    /// A simulated sell.
    Sell,
}

impl TradeSide {
    /// Upper-case display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// Every random input one tick consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickDraw {
    /// Bernoulli roll in `[0, 1)`; the tick succeeds iff `roll < success_rate`.
    pub roll: f64,
    /// Trade size in `[30, 100)`.
    pub size: f64,
    /// Profit rate in `[0.01, 0.05)`, applied on success.
    pub profit_rate: f64,
    /// Loss rate in `[0.02, 0.08)`, applied on failure.
    pub loss_rate: f64,
    /// Display side for the log line.
    pub side: TradeSide,
}

impl TickDraw {
    /// Samples a full draw set from the rng.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            roll: rng.random::<f64>(),
            size: rng.random_range(30.0..100.0),
            profit_rate: rng.random_range(0.01..0.05),
            loss_rate: rng.random_range(0.02..0.08),
            side: if rng.random::<bool>() {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            },
        }
    }

    /// A draw that always succeeds, for tests.
    #[cfg(test)]
    pub(crate) fn winning(size: f64, profit_rate: f64) -> Self {
        Self {
            roll: 0.0,
            size,
            profit_rate,
            loss_rate: 0.02,
            side: TradeSide::Buy,
        }
    }

    /// A draw that always fails, for tests.
    #[cfg(test)]
    pub(crate) fn losing(size: f64, loss_rate: f64) -> Self {
        Self {
            roll: 1.0,
            size,
            profit_rate: 0.01,
            loss_rate,
            side: TradeSide::Sell,
        }
    }
}
