//! Synthetic multi-symbol price feed driven by a background worker thread.
//!
//! [`MarketDataEngine`] owns a per-symbol price map under one mutex and
//! evolves it on a fixed cadence via a bounded, zero-mean random walk:
//! `new = old * (1 + eps)`, `eps = rng.gen_range(-1.0..1.0) * sigma`, floored
//! at `p_floor`. The worker is a plain `std::thread`, matching the rest of
//! this corpus's preference for `std::thread` + `Arc<AtomicBool>` over an
//! async runtime for long-lived background loops.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::{Price, Symbol, Timestamp};

/// A single price update for one symbol, emitted once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketTick {
    pub symbol: Symbol,
    pub price: Price,
    pub timestamp: Timestamp,
    /// Best bid/ask at the moment the tick was dispatched, if the caller
    /// chose to attach one (the engine itself has no notion of an order
    /// book and leaves both `None`).
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
}

impl MarketTick {
    fn new(symbol: Symbol, price: Price, timestamp: Timestamp) -> Self {
        Self {
            symbol,
            price,
            timestamp,
            best_bid: None,
            best_ask: None,
        }
    }

    /// Attach a bid/ask snapshot to this tick.
    pub fn with_book_snapshot(mut self, best_bid: Option<Price>, best_ask: Option<Price>) -> Self {
        self.best_bid = best_bid;
        self.best_ask = best_ask;
        self
    }
}

/// Configuration for the stochastic price walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketDataConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Standard-deviation-like scale of the per-tick price perturbation.
    pub sigma: f64,
    /// Prices are clamped to never fall below this floor.
    pub price_floor: Price,
    /// RNG seed; fixing it makes the walk reproducible across runs.
    pub seed: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            sigma: 5e-4,
            price_floor: Price(1),
            seed: 0,
        }
    }
}

type TickCallback = Arc<dyn Fn(&MarketTick) + Send + Sync>;

struct Shared {
    prices: Mutex<FxHashMap<Symbol, Price>>,
    callback: Mutex<Option<TickCallback>>,
    timestamp: AtomicU64,
    stop: Arc<AtomicBool>,
}

/// Multi-symbol synthetic price feed.
///
/// Call [`add_symbol`](Self::add_symbol) for every traded instrument, set a
/// subscriber with [`set_callback`](Self::set_callback), then
/// [`start`](Self::start) the background producer. [`stop`](Self::stop)
/// signals the worker and joins it; it is idempotent.
pub struct MarketDataEngine {
    shared: Arc<Shared>,
    config: MarketDataConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataEngine {
    /// Create an engine with the given configuration and no symbols yet.
    pub fn new(config: MarketDataConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                prices: Mutex::new(FxHashMap::default()),
                callback: Mutex::new(None),
                timestamp: AtomicU64::new(1),
                stop: Arc::new(AtomicBool::new(false)),
            }),
            config,
            worker: Mutex::new(None),
        }
    }

    /// Register `symbol` with a starting price. Safe to call both before
    /// and after [`start`](Self::start) — a symbol added while running
    /// begins ticking on the next cycle.
    pub fn add_symbol(&self, symbol: Symbol, initial_price: Price) {
        self.shared.prices.lock().unwrap().insert(symbol, initial_price);
    }

    /// Current price for `symbol`, or `None` if it was never added.
    pub fn get_current_price(&self, symbol: Symbol) -> Option<Price> {
        self.shared.prices.lock().unwrap().get(&symbol).copied()
    }

    /// Snapshot of every symbol's current price.
    pub fn get_all_prices(&self) -> FxHashMap<Symbol, Price> {
        self.shared.prices.lock().unwrap().clone()
    }

    /// Set the single subscriber invoked once per symbol per tick. Replaces
    /// any previously set callback. Has no effect on ticks already in
    /// flight.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&MarketTick) + Send + Sync + 'static,
    {
        *self.shared.callback.lock().unwrap() = Some(Arc::new(callback));
    }

    /// True if the background producer thread is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.lock().unwrap().is_some()
    }

    /// Launch the background producer thread. No-op if already running.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }
        self.shared.stop.store(false, Ordering::SeqCst);

        let shared = self.shared.clone();
        let config = self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        *worker = Some(thread::spawn(move || {
            while !shared.stop.load(Ordering::SeqCst) {
                thread::sleep(config.tick_interval);
                if shared.stop.load(Ordering::SeqCst) {
                    break;
                }
                tick_once(&shared, &config, &mut rng);
            }
        }));
    }

    /// Signal the producer thread to stop and join it. Idempotent: calling
    /// `stop` with no running worker is a no-op.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Advance every symbol's price by exactly one tick and dispatch the
    /// resulting events, without waiting for `tick_interval` or requiring
    /// the background thread to be running. Used by deterministic tests
    /// that want to drive the walk synchronously.
    pub fn tick_once_for_test(&self, rng: &mut ChaCha8Rng) {
        tick_once(&self.shared, &self.config, rng);
    }
}

impl Drop for MarketDataEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_once(shared: &Shared, config: &MarketDataConfig, rng: &mut ChaCha8Rng) {
    let symbols: Vec<Symbol> = shared.prices.lock().unwrap().keys().copied().collect();
    for symbol in symbols {
        let new_price = {
            let mut prices = shared.prices.lock().unwrap();
            let Some(old) = prices.get(&symbol).copied() else {
                continue;
            };
            let epsilon = rng.gen_range(-1.0..1.0) * config.sigma;
            let walked = (old.0 as f64) * (1.0 + epsilon);
            let floored = walked.max(config.price_floor.0 as f64);
            let new_price = Price(floored.round() as i64);
            prices.insert(symbol, new_price);
            new_price
        };

        let timestamp = shared.timestamp.fetch_add(1, Ordering::Relaxed);
        let tick = MarketTick::new(symbol, new_price, timestamp);
        let callback = shared.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(&tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aapl() -> Symbol {
        Symbol::new("AAPL")
    }

    #[test]
    fn add_symbol_sets_initial_price() {
        let engine = MarketDataEngine::new(MarketDataConfig::default());
        engine.add_symbol(aapl(), Price(150_00));
        assert_eq!(engine.get_current_price(aapl()), Some(Price(150_00)));
    }

    #[test]
    fn unknown_symbol_has_no_price() {
        let engine = MarketDataEngine::new(MarketDataConfig::default());
        assert_eq!(engine.get_current_price(aapl()), None);
    }

    #[test]
    fn tick_once_moves_price_and_fires_callback() {
        let engine = MarketDataEngine::new(MarketDataConfig {
            seed: 42,
            ..MarketDataConfig::default()
        });
        engine.add_symbol(aapl(), Price(100_00));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let collector = seen.clone();
        engine.set_callback(move |tick| collector.lock().unwrap().push(*tick));

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        engine.tick_once_for_test(&mut rng);

        let ticks = seen.lock().unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].symbol, aapl());
        assert!(ticks[0].price.0 > 0);
    }

    #[test]
    fn same_seed_produces_same_walk() {
        let make = || {
            let engine = MarketDataEngine::new(MarketDataConfig {
                seed: 7,
                ..MarketDataConfig::default()
            });
            engine.add_symbol(aapl(), Price(100_00));
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            for _ in 0..20 {
                engine.tick_once_for_test(&mut rng);
            }
            engine.get_current_price(aapl()).unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn price_never_goes_below_floor() {
        let engine = MarketDataEngine::new(MarketDataConfig {
            seed: 1,
            sigma: 0.9,
            price_floor: Price(50),
            ..MarketDataConfig::default()
        });
        engine.add_symbol(aapl(), Price(100));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            engine.tick_once_for_test(&mut rng);
            assert!(engine.get_current_price(aapl()).unwrap().0 >= 50);
        }
    }

    #[test]
    fn start_and_stop_is_idempotent_and_joins() {
        let engine = MarketDataEngine::new(MarketDataConfig {
            tick_interval: Duration::from_millis(1),
            ..MarketDataConfig::default()
        });
        engine.add_symbol(aapl(), Price(100_00));
        engine.start();
        assert!(engine.is_running());
        thread::sleep(Duration::from_millis(10));
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn get_all_prices_snapshots_every_symbol() {
        let engine = MarketDataEngine::new(MarketDataConfig::default());
        engine.add_symbol(aapl(), Price(150_00));
        engine.add_symbol(Symbol::new("MSFT"), Price(300_00));
        let prices = engine.get_all_prices();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[&aapl()], Price(150_00));
    }

    #[test]
    fn market_tick_can_carry_a_book_snapshot() {
        let tick = MarketTick::new(aapl(), Price(100_00), 1).with_book_snapshot(Some(Price(99_00)), Some(Price(101_00)));
        assert_eq!(tick.best_bid, Some(Price(99_00)));
        assert_eq!(tick.best_ask, Some(Price(101_00)));
    }
}
