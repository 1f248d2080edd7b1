//! Simulation harness: wires the ledger, order books, and market-data feed
//! together and fans out events to strategies and external listeners.
//!
//! One market-data producer thread drives the whole loop: a tick updates a
//! book's last-trade price and is handed to every strategy and market-data
//! listener; a strategy's resulting order submission matches synchronously
//! on that same thread, and any trade/rejection it produces is handed back
//! out the same way. A strategy error is caught and logged rather than
//! aborting the dispatch loop, mirroring the Python original's per-strategy
//! try/except but through the `log` facade instead of stdout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    Book, BookRegistry, BookSnapshot, EngineHalted, Ledger, LedgerError, MarketDataConfig,
    MarketDataEngine, MarketTick, OrderId, OrderRejection, OrderType, ParticipantId, Price,
    Quantity, RiskLimits, Side, Strategy, StrategyContext, SubmitOutcome, Symbol, Trade,
};

type TradeListener = Box<dyn Fn(&Trade) + Send>;
type MarketDataListener = Box<dyn Fn(&MarketTick) + Send>;
type RejectionListener = Box<dyn Fn(&OrderRejection) + Send>;

/// Wires a [`Ledger`], a [`BookRegistry`], and a [`MarketDataEngine`]
/// together and dispatches their events to registered strategies and
/// listeners.
pub struct Simulation {
    ledger: Ledger,
    registry: Arc<BookRegistry>,
    market_data: Arc<MarketDataEngine>,
    strategies: Arc<Mutex<Vec<Box<dyn Strategy>>>>,
    trade_listeners: Arc<Mutex<Vec<TradeListener>>>,
    market_data_listeners: Arc<Mutex<Vec<MarketDataListener>>>,
    rejection_listeners: Arc<Mutex<Vec<RejectionListener>>>,
    halted: Arc<Mutex<Option<EngineHalted>>>,
    dispatch_wired: AtomicBool,
}

impl Simulation {
    /// Create a simulation with a fresh ledger, no symbols, no strategies,
    /// and the given market-data configuration.
    pub fn new(config: MarketDataConfig) -> Self {
        let ledger = Ledger::new();
        Self {
            registry: Arc::new(BookRegistry::new(ledger.clone())),
            market_data: Arc::new(MarketDataEngine::new(config)),
            ledger,
            strategies: Arc::new(Mutex::new(Vec::new())),
            trade_listeners: Arc::new(Mutex::new(Vec::new())),
            market_data_listeners: Arc::new(Mutex::new(Vec::new())),
            rejection_listeners: Arc::new(Mutex::new(Vec::new())),
            halted: Arc::new(Mutex::new(None)),
            dispatch_wired: AtomicBool::new(false),
        }
    }

    /// Shared handle to the portfolio ledger.
    pub fn ledger(&self) -> Ledger {
        self.ledger.clone()
    }

    /// Shared handle to the multi-symbol book registry.
    pub fn registry(&self) -> Arc<BookRegistry> {
        self.registry.clone()
    }

    /// Shared handle to the market-data engine.
    pub fn market_data(&self) -> Arc<MarketDataEngine> {
        self.market_data.clone()
    }

    /// True once a settlement inconsistency has halted the engine.
    pub fn is_halted(&self) -> bool {
        self.halted.lock().unwrap().is_some()
    }

    /// Register a participant with starting cash.
    pub fn add_participant(&self, id: ParticipantId, initial_cash: i64) -> Result<(), LedgerError> {
        self.ledger.add_participant(id, initial_cash)
    }

    /// Seed a participant's starting position in a symbol.
    pub fn set_initial_position(
        &self,
        id: ParticipantId,
        symbol: Symbol,
        quantity: i64,
        reference_price: Price,
    ) -> Result<(), LedgerError> {
        self.ledger.set_initial_position(&id, symbol, quantity, reference_price)
    }

    /// Register a traded symbol with unlimited risk limits, wiring its book
    /// to dispatch trades/rejections to strategies and listeners, and
    /// seeding its starting price in the market-data feed.
    pub fn add_symbol(&self, symbol: Symbol, initial_price: Price) {
        self.add_symbol_with_risk_limits(symbol, initial_price, RiskLimits::unlimited());
    }

    /// Register a traded symbol bounded by `risk_limits`, wired the same way
    /// as [`add_symbol`](Self::add_symbol).
    pub fn add_symbol_with_risk_limits(&self, symbol: Symbol, initial_price: Price, risk_limits: RiskLimits) {
        let book = self.registry.get_or_create_with(symbol, risk_limits, Some(initial_price));
        wire_book_callbacks(
            &mut book.lock().unwrap(),
            self.strategies.clone(),
            self.trade_listeners.clone(),
            self.rejection_listeners.clone(),
        );
        self.market_data.add_symbol(symbol, initial_price);
    }

    /// Add a strategy, immediately calling its `initialize` with handles to
    /// the ledger, the book registry, and the market-data engine. An
    /// initialization error is logged and does not prevent the strategy from
    /// receiving later events.
    pub fn add_strategy(&self, mut strategy: Box<dyn Strategy>) {
        let context = StrategyContext::new(self.ledger.clone(), self.registry.clone(), self.market_data.clone());
        if let Err(err) = strategy.initialize(&context) {
            log::warn!("strategy '{}' failed to initialize: {err}", strategy.name());
        }
        self.strategies.lock().unwrap().push(strategy);
    }

    /// Register an external listener invoked after every strategy on every
    /// trade in the simulation.
    pub fn add_trade_listener<F: Fn(&Trade) + Send + 'static>(&self, listener: F) {
        self.trade_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Register an external listener invoked after every strategy on every
    /// market-data tick.
    pub fn add_market_data_listener<F: Fn(&MarketTick) + Send + 'static>(&self, listener: F) {
        self.market_data_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Register an external listener invoked after every strategy on every
    /// order rejection.
    pub fn add_order_rejection_listener<F: Fn(&OrderRejection) + Send + 'static>(&self, listener: F) {
        self.rejection_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Submit an order through the book registry. If a prior call has
    /// halted the engine, returns the stored cause immediately without
    /// touching any book. Otherwise, a fresh [`EngineHalted`] is logged at
    /// `error` level, stored, and the market-data feed is stopped before the
    /// error is returned to the caller.
    pub fn submit_order(
        &self,
        symbol: Symbol,
        participant_id: ParticipantId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Result<SubmitOutcome, EngineHalted> {
        if let Some(cause) = self.halted.lock().unwrap().clone() {
            return Err(cause);
        }

        self.registry
            .submit_order(symbol, participant_id, side, order_type, price, quantity)
            .map_err(|halted| {
                log::error!("settlement invariant violated, halting simulation: {halted}");
                *self.halted.lock().unwrap() = Some(halted.clone());
                self.market_data.stop();
                halted
            })
    }

    /// Cancel a resting order on `symbol`'s book.
    pub fn cancel_order(&self, symbol: Symbol, order_id: OrderId) -> bool {
        self.registry.cancel_order(symbol, order_id)
    }

    /// Best bid/ask for `symbol`.
    pub fn best_bid_ask(&self, symbol: Symbol) -> Option<(Option<Price>, Option<Price>)> {
        self.registry.best_bid_ask(symbol)
    }

    /// Depth snapshot for `symbol`.
    pub fn book_depth(&self, symbol: Symbol, depth: usize) -> Option<BookSnapshot> {
        self.registry.book_depth(symbol, depth)
    }

    /// Current market-data price for `symbol`.
    pub fn get_current_price(&self, symbol: Symbol) -> Option<Price> {
        self.market_data.get_current_price(symbol)
    }

    /// Launch the market-data producer thread. Wires the feed's tick
    /// callback to update book prices and fan out to strategies/listeners
    /// the first time it's called; subsequent calls only (re)start the
    /// producer thread.
    pub fn start(&self) {
        if !self.dispatch_wired.swap(true, Ordering::SeqCst) {
            let registry = self.registry.clone();
            let strategies = self.strategies.clone();
            let market_data_listeners = self.market_data_listeners.clone();
            self.market_data.set_callback(move |tick: &MarketTick| {
                registry.update_market_price(tick.symbol, tick.price);
                dispatch_market_data(&strategies, &market_data_listeners, tick);
            });
        }
        self.market_data.start();
    }

    /// Stop the market-data producer thread. Idempotent.
    pub fn stop(&self) {
        self.market_data.stop();
    }
}

fn wire_book_callbacks(
    book: &mut Book,
    strategies: Arc<Mutex<Vec<Box<dyn Strategy>>>>,
    trade_listeners: Arc<Mutex<Vec<TradeListener>>>,
    rejection_listeners: Arc<Mutex<Vec<RejectionListener>>>,
) {
    let trade_strategies = strategies.clone();
    book.set_trade_callback(move |trade: &Trade| {
        dispatch_trade(&trade_strategies, &trade_listeners, trade);
    });
    book.set_rejection_callback(move |rejection: &OrderRejection| {
        dispatch_rejection(&strategies, &rejection_listeners, rejection);
    });
}

fn dispatch_trade(strategies: &Mutex<Vec<Box<dyn Strategy>>>, listeners: &Mutex<Vec<TradeListener>>, trade: &Trade) {
    {
        let mut strategies = strategies.lock().unwrap();
        for strategy in strategies.iter_mut() {
            if let Err(err) = strategy.on_trade(trade) {
                log::warn!("strategy '{}' on_trade failed: {err}", strategy.name());
            }
        }
    }
    for listener in listeners.lock().unwrap().iter() {
        listener(trade);
    }
}

fn dispatch_market_data(
    strategies: &Mutex<Vec<Box<dyn Strategy>>>,
    listeners: &Mutex<Vec<MarketDataListener>>,
    tick: &MarketTick,
) {
    {
        let mut strategies = strategies.lock().unwrap();
        for strategy in strategies.iter_mut() {
            if let Err(err) = strategy.on_market_data(tick) {
                log::warn!("strategy '{}' on_market_data failed: {err}", strategy.name());
            }
        }
    }
    for listener in listeners.lock().unwrap().iter() {
        listener(tick);
    }
}

fn dispatch_rejection(
    strategies: &Mutex<Vec<Box<dyn Strategy>>>,
    listeners: &Mutex<Vec<RejectionListener>>,
    rejection: &OrderRejection,
) {
    {
        let mut strategies = strategies.lock().unwrap();
        for strategy in strategies.iter_mut() {
            if let Err(err) = strategy.on_order_rejection(rejection) {
                log::warn!("strategy '{}' on_order_rejection failed: {err}", strategy.name());
            }
        }
    }
    for listener in listeners.lock().unwrap().iter() {
        listener(rejection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderStatus;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn aapl() -> Symbol {
        Symbol::new("AAPL")
    }

    fn config() -> MarketDataConfig {
        MarketDataConfig {
            tick_interval: Duration::from_millis(5),
            seed: 1,
            ..MarketDataConfig::default()
        }
    }

    #[test]
    fn submit_order_matches_across_two_participants() {
        let sim = Simulation::new(config());
        sim.add_symbol(aapl(), Price(150_00));
        sim.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
        sim.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();

        sim.submit_order(aapl(), ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(151_00), 10)
            .unwrap();
        let outcome = sim
            .submit_order(aapl(), ParticipantId::new("bob"), Side::Buy, OrderType::Limit, Price(151_00), 10)
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Filled);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(sim.ledger().get_cash(&ParticipantId::new("bob")), 10_000_00 - 1_510_00);
    }

    #[test]
    fn trade_listener_fires_once_per_trade() {
        let sim = Simulation::new(config());
        sim.add_symbol(aapl(), Price(150_00));
        sim.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
        sim.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        sim.add_trade_listener(move |_trade| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sim.submit_order(aapl(), ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(100_00), 10)
            .unwrap();
        sim.submit_order(aapl(), ParticipantId::new("bob"), Side::Buy, OrderType::Limit, Price(100_00), 10)
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    struct NullStrategy {
        trades: Arc<AtomicUsize>,
    }

    impl Strategy for NullStrategy {
        fn name(&self) -> &str {
            "null"
        }

        fn on_trade(&mut self, _trade: &Trade) -> Result<(), crate::StrategyError> {
            self.trades.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn strategy_receives_trade_events() {
        let sim = Simulation::new(config());
        sim.add_symbol(aapl(), Price(150_00));
        sim.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
        sim.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();

        let trades = Arc::new(AtomicUsize::new(0));
        sim.add_strategy(Box::new(NullStrategy { trades: trades.clone() }));

        sim.submit_order(aapl(), ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(100_00), 10)
            .unwrap();
        sim.submit_order(aapl(), ParticipantId::new("bob"), Side::Buy, OrderType::Limit, Price(100_00), 10)
            .unwrap();

        assert_eq!(trades.load(Ordering::SeqCst), 1);
    }

    struct ErroringStrategy;

    impl Strategy for ErroringStrategy {
        fn name(&self) -> &str {
            "erroring"
        }

        fn on_trade(&mut self, _trade: &Trade) -> Result<(), crate::StrategyError> {
            Err("deliberate failure".into())
        }
    }

    #[test]
    fn erroring_strategy_does_not_block_other_listeners() {
        let sim = Simulation::new(config());
        sim.add_symbol(aapl(), Price(150_00));
        sim.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
        sim.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();

        sim.add_strategy(Box::new(ErroringStrategy));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        sim.add_trade_listener(move |_trade| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sim.submit_order(aapl(), ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(100_00), 10)
            .unwrap();
        sim.submit_order(aapl(), ParticipantId::new("bob"), Side::Buy, OrderType::Limit, Price(100_00), 10)
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn market_data_tick_updates_book_price_and_listeners() {
        let sim = Simulation::new(config());
        sim.add_symbol(aapl(), Price(150_00));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        sim.add_market_data_listener(move |_tick| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sim.start();
        std::thread::sleep(Duration::from_millis(40));
        sim.stop();

        assert!(seen.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn unknown_symbol_submission_is_rejected_without_panicking() {
        let sim = Simulation::new(config());
        sim.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
        let outcome = sim
            .submit_order(aapl(), ParticipantId::new("alice"), Side::Buy, OrderType::Limit, Price(100_00), 10)
            .unwrap();
        assert_eq!(outcome.status, OrderStatus::Rejected);
    }

    #[test]
    fn is_halted_starts_false() {
        let sim = Simulation::new(config());
        assert!(!sim.is_halted());
    }
}
