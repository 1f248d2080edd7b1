//! The external strategy contract.
//!
//! A strategy is modeled as a capability set — an object-safe trait, not a
//! concrete type — so the simulation harness can hold a heterogeneous
//! `Vec<Box<dyn Strategy>>` the same way the teacher crate's portfolio
//! rebalancer holds `Box<dyn Strategy>` for weight-generation callbacks,
//! generalized here to the order-book event shape this simulator needs:
//! market-data ticks, fills, and rejections instead of rebalance weights.

use std::error::Error;
use std::sync::Arc;

use crate::{BookRegistry, Ledger, MarketDataEngine, MarketTick, OrderRejection, Trade};

/// Handles passed to [`Strategy::initialize`] so a strategy can submit
/// orders and read state once it starts receiving events.
///
/// Strategies that need to place orders hold onto a clone of the relevant
/// handles themselves; this context exists only to hand them out once at
/// startup, mirroring how `initialize` receives "handles to the ledger, the
/// order books, and the market-data engine" per the external contract.
pub struct StrategyContext {
    pub ledger: Ledger,
    pub registry: Arc<BookRegistry>,
    pub market_data: Arc<MarketDataEngine>,
}

impl StrategyContext {
    pub fn new(ledger: Ledger, registry: Arc<BookRegistry>, market_data: Arc<MarketDataEngine>) -> Self {
        Self {
            ledger,
            registry,
            market_data,
        }
    }
}

/// A strategy boxed error, matching the Python original's bare exception
/// catch but expressed through Rust's `Error` trait instead of `Exception`.
pub type StrategyError = Box<dyn Error + Send + Sync>;

/// The callback contract a strategy must satisfy to participate in a
/// simulation.
///
/// Every method returns `Result<(), StrategyError>`; an `Err` is caught by
/// the harness, logged at `warn` level with [`Strategy::name`], and does not
/// stop dispatch to the remaining strategies or external listeners.
pub trait Strategy: Send {
    /// Human-readable name used in log messages when this strategy errors.
    fn name(&self) -> &str;

    /// Called once before any events are dispatched.
    fn initialize(&mut self, _context: &StrategyContext) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called once per market-data tick for a symbol this strategy cares
    /// about.
    fn on_market_data(&mut self, _tick: &MarketTick) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called once per trade the strategy is a counterparty to, or (at the
    /// harness's discretion) for every trade in the simulation.
    fn on_trade(&mut self, _trade: &Trade) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called once per rejected order submission.
    fn on_order_rejection(&mut self, _rejection: &OrderRejection) -> Result<(), StrategyError> {
        Ok(())
    }
}
