//! Multi-symbol collection of per-symbol matching engines.
//!
//! One [`Book`] per traded symbol, created lazily and wired to a shared
//! [`Ledger`]. Grounded on the teacher crate's `MultiExchange`, generalized
//! to construct each entry against the shared ledger/risk configuration
//! instead of `Exchange::default()`, and to invoke a book's callbacks only
//! after its own per-symbol lock has been released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::{
    Book, BookSnapshot, EngineHalted, Ledger, OrderId, OrderRejection, OrderStatus, OrderType,
    ParticipantId, Price, Quantity, RejectReason, RiskLimits, Side, SubmitOutcome, Symbol,
};

/// Keyed collection of per-symbol [`Book`]s sharing one [`Ledger`].
///
/// Each book lives behind its own `Mutex`, so submissions to different
/// symbols never contend with each other. [`BookRegistry::submit_order`]
/// releases that per-book lock before invoking the book's trade/rejection
/// callbacks, honoring the no-lock-held-during-callback contract documented
/// on [`Book::set_trade_callback`].
pub struct BookRegistry {
    ledger: Ledger,
    books: Mutex<FxHashMap<Symbol, Arc<Mutex<Book>>>>,
    next_unrouted_order_id: AtomicU64,
}

impl BookRegistry {
    /// Create an empty registry backed by `ledger`.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            books: Mutex::new(FxHashMap::default()),
            next_unrouted_order_id: AtomicU64::new(1),
        }
    }

    /// Look up an existing book for `symbol` without creating one.
    pub fn get(&self, symbol: Symbol) -> Option<Arc<Mutex<Book>>> {
        self.books.lock().unwrap().get(&symbol).cloned()
    }

    /// Get the book for `symbol`, creating an unlimited-risk book seeded
    /// with no prior trade price if it doesn't exist yet.
    pub fn get_or_create(&self, symbol: Symbol) -> Arc<Mutex<Book>> {
        self.get_or_create_with(symbol, RiskLimits::unlimited(), None)
    }

    /// Get the book for `symbol`, creating it with `risk_limits` and
    /// `initial_price` if it doesn't exist yet. Has no effect on an
    /// already-existing book.
    pub fn get_or_create_with(
        &self,
        symbol: Symbol,
        risk_limits: RiskLimits,
        initial_price: Option<Price>,
    ) -> Arc<Mutex<Book>> {
        let mut books = self.books.lock().unwrap();
        books
            .entry(symbol)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Book::new(
                    symbol,
                    self.ledger.clone(),
                    risk_limits,
                    initial_price,
                )))
            })
            .clone()
    }

    /// All symbols with a registered book, in unspecified order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.books.lock().unwrap().keys().copied().collect()
    }

    /// Number of registered books.
    pub fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }

    /// True if no books have been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submit an order to the book for `symbol`.
    ///
    /// If no book exists for `symbol`, the order is rejected with
    /// [`RejectReason::UnknownSymbol`] without ever touching a book or the
    /// ledger. Otherwise the book's `submit_order` runs under its own lock;
    /// that lock is released before the book's trade/rejection callbacks
    /// (if any) are invoked with the resulting events.
    pub fn submit_order(
        &self,
        symbol: Symbol,
        participant_id: ParticipantId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Result<SubmitOutcome, EngineHalted> {
        let Some(book) = self.get(symbol) else {
            let order_id = OrderId(self.next_unrouted_order_id.fetch_add(1, Ordering::Relaxed));
            return Ok(SubmitOutcome {
                order_id,
                status: OrderStatus::Rejected,
                trades: Vec::new(),
                rejection: Some(OrderRejection {
                    order_id,
                    participant_id,
                    symbol,
                    reason: RejectReason::UnknownSymbol,
                }),
            });
        };

        let (outcome, trade_callback, rejection_callback) = {
            let mut book = book.lock().unwrap();
            let outcome = book.submit_order(participant_id, side, order_type, price, quantity)?;
            (outcome, book.trade_callback(), book.rejection_callback())
        };

        if let Some(callback) = trade_callback {
            for trade in &outcome.trades {
                callback(trade);
            }
        }
        if let Some(callback) = rejection_callback {
            if let Some(rejection) = &outcome.rejection {
                callback(rejection);
            }
        }

        Ok(outcome)
    }

    /// Cancel a resting order on the book for `symbol`. Returns `false` if
    /// the symbol or order is unknown, or the order is already terminal.
    pub fn cancel_order(&self, symbol: Symbol, order_id: OrderId) -> bool {
        match self.get(symbol) {
            Some(book) => book.lock().unwrap().cancel_order(order_id),
            None => false,
        }
    }

    /// Push a market-data tick price into the book for `symbol`, if it
    /// exists. No-op for unregistered symbols.
    pub fn update_market_price(&self, symbol: Symbol, price: Price) {
        if let Some(book) = self.get(symbol) {
            book.lock().unwrap().update_market_price(price);
        }
    }

    /// Best bid/ask for `symbol`, or `None` if the symbol has no book.
    pub fn best_bid_ask(&self, symbol: Symbol) -> Option<(Option<Price>, Option<Price>)> {
        self.get(symbol).map(|book| {
            let book = book.lock().unwrap();
            (book.best_bid(), book.best_ask())
        })
    }

    /// Depth snapshot for `symbol`, or `None` if the symbol has no book.
    pub fn book_depth(&self, symbol: Symbol, depth: usize) -> Option<BookSnapshot> {
        self.get(symbol).map(|book| book.lock().unwrap().book_depth(depth))
    }
}
