// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # simulator-core
//!
//! A multi-symbol, multi-participant stock-market simulator core: a
//! price-time-priority matching engine, an average-cost-basis portfolio
//! ledger, a synthetic market-data feed, and a harness that wires the two
//! together for pluggable trading strategies.
//!
//! ## Features
//!
//! - **Matching**: limit and market orders, FIFO per price level, best price
//!   crossed first, partial fills rest the remainder.
//! - **Settlement**: every fill atomically debits/credits cash and updates
//!   average-cost-basis positions on a shared [`Ledger`].
//! - **Risk**: cash sufficiency on buys and an optional max-short limit on
//!   sells, checked before resting and again per matched slice.
//! - **Multi-symbol**: one [`Book`] per traded symbol behind its own lock,
//!   collected in a [`BookRegistry`].
//! - **Market data**: [`MarketDataEngine`] evolves a synthetic price per
//!   symbol on a background thread and notifies subscribers per tick.
//! - **Strategies**: a [`Strategy`] trait object receives market-data ticks,
//!   trades, and rejections, and can submit new orders in response.
//!
//! ## Quick Start
//!
//! ```
//! use simulator_core::{Book, Ledger, OrderType, ParticipantId, Price, RiskLimits, Side, Symbol};
//!
//! let ledger = Ledger::new();
//! ledger.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
//! ledger.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();
//!
//! let mut book = Book::new(Symbol::new("AAPL"), ledger.clone(), RiskLimits::unlimited(), None);
//! book.submit_order(ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(101_00), 100)
//!     .unwrap();
//! let outcome = book
//!     .submit_order(ParticipantId::new("bob"), Side::Buy, OrderType::Limit, Price(101_00), 50)
//!     .unwrap();
//!
//! assert_eq!(outcome.trades.len(), 1);
//! assert_eq!(outcome.trades[0].price, Price(101_00));
//! assert_eq!(ledger.get_position(&ParticipantId::new("bob"), &Symbol::new("AAPL")), 50);
//! ```
//!
//! ## Price Representation
//!
//! Prices are stored as [`i64`] in the smallest unit (e.g., cents):
//!
//! ```
//! use simulator_core::Price;
//!
//! let price = Price(100_50);  // $100.50
//! assert_eq!(format!("{}", price), "$100.50");
//! ```
//!
//! ## Multi-Symbol Routing
//!
//! ```
//! use simulator_core::{BookRegistry, Ledger, OrderType, ParticipantId, Price, Side, Symbol};
//!
//! let ledger = Ledger::new();
//! ledger.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
//! let registry = BookRegistry::new(ledger);
//! registry.get_or_create(Symbol::new("AAPL"));
//!
//! let outcome = registry
//!     .submit_order(Symbol::new("AAPL"), ParticipantId::new("alice"), Side::Buy, OrderType::Limit, Price(100_00), 10)
//!     .unwrap();
//! assert_eq!(registry.best_bid_ask(Symbol::new("AAPL")).unwrap().0, Some(Price(100_00)));
//! let _ = outcome;
//! ```
//!
//! ## Market Orders
//!
//! Market orders sweep through price levels at the best available prices:
//!
//! ```
//! use simulator_core::{Book, Ledger, OrderType, ParticipantId, Price, RiskLimits, Side, Symbol};
//!
//! let ledger = Ledger::new();
//! ledger.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
//! ledger.add_participant(ParticipantId::new("bob"), 10_000_00).unwrap();
//! let mut book = Book::new(Symbol::new("AAPL"), ledger, RiskLimits::unlimited(), None);
//!
//! book.submit_order(ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(100_00), 50).unwrap();
//! book.submit_order(ParticipantId::new("alice"), Side::Sell, OrderType::Limit, Price(101_00), 50).unwrap();
//!
//! let outcome = book
//!     .submit_order(ParticipantId::new("bob"), Side::Buy, OrderType::Market, Price::ZERO, 75)
//!     .unwrap();
//! assert_eq!(outcome.trades.len(), 2);
//! assert_eq!(outcome.trades[0].price, Price(100_00));  // Best price first
//! assert_eq!(outcome.trades[1].price, Price(101_00));
//! ```
//!
//! ## Book Snapshots
//!
//! ```
//! use simulator_core::{Book, Ledger, OrderType, ParticipantId, Price, RiskLimits, Side, Symbol};
//!
//! let ledger = Ledger::new();
//! ledger.add_participant(ParticipantId::new("alice"), 10_000_00).unwrap();
//! let mut book = Book::new(Symbol::new("AAPL"), ledger, RiskLimits::unlimited(), None);
//!
//! book.submit_order(ParticipantId::new("alice"), Side::Buy, OrderType::Limit, Price(99_00), 100).unwrap();
//! book.submit_order(ParticipantId::new("alice"), Side::Buy, OrderType::Limit, Price(100_00), 200).unwrap();
//!
//! let snap = book.book_depth(10);
//! assert_eq!(snap.best_bid(), Some(Price(100_00)));
//! ```

mod book;
mod engine;
mod error;
mod ledger;
mod level;
mod market_data;
mod order;
mod position;
mod price_levels;
mod registry;
mod risk;
mod side;
mod simulation;
mod snapshot;
mod strategy;
mod trade;
mod types;

pub use book::OrderBook;
pub use engine::{Book, RejectionCallback, SubmitOutcome, TradeCallback};
pub use error::{EngineHalted, OrderRejection, RejectReason, SettlementError};
pub use ledger::{Ledger, LedgerError};
pub use level::Level;
pub use market_data::{MarketDataConfig, MarketDataEngine, MarketTick};
pub use order::{Order, OrderStatus, OrderType};
pub use position::Position;
pub use price_levels::PriceLevels;
pub use registry::BookRegistry;
pub use risk::RiskLimits;
pub use side::Side;
pub use simulation::Simulation;
pub use snapshot::{BookSnapshot, LevelSnapshot};
pub use strategy::{Strategy, StrategyContext, StrategyError};
pub use trade::Trade;
pub use types::{
    OrderId, ParticipantId, Price, Quantity, Symbol, Timestamp, TradeId,
    INTERNAL_LIQUIDITY_PROVIDER_PREFIX, SYMBOL_CAPACITY,
};
