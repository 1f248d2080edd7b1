//! Per-symbol matching engine: admission, risk checks, settlement, callbacks.
//!
//! [`Book`] wraps the low-level [`crate::OrderBook`] FIFO structure and adds
//! everything that structure doesn't know about: participant identity, cash
//! and position risk checks against the shared [`Ledger`], atomic settlement
//! through the ledger on every fill, and trade/rejection callbacks.

use std::sync::Arc;

use crate::{
    BookSnapshot, EngineHalted, Ledger, Order, OrderBook, OrderId, OrderRejection, OrderStatus,
    OrderType, ParticipantId, Price, Quantity, RejectReason, RiskLimits, Side, Symbol, Trade,
};

/// A trade callback: invoked once per fill, after the book's matching loop
/// has released any state it privately holds.
pub type TradeCallback = Arc<dyn Fn(&Trade) + Send + Sync>;
/// A rejection callback: invoked once per rejected order.
pub type RejectionCallback = Arc<dyn Fn(&OrderRejection) + Send + Sync>;

/// Outcome of a single [`Book::submit_order`] call.
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    /// Id assigned to the submitted order, even if it was rejected.
    pub order_id: OrderId,
    /// Final status reached during admission/matching.
    pub status: OrderStatus,
    /// Trades generated while matching this order, in execution order.
    pub trades: Vec<Trade>,
    /// Set if the order was rejected (structurally invalid or failed risk).
    pub rejection: Option<OrderRejection>,
}

/// The matching engine for a single symbol.
///
/// Holds its own bid/ask queues plus a handle to the shared [`Ledger`] and
/// per-symbol [`RiskLimits`]. Intended to live behind one mutex per symbol
/// (see [`crate::BookRegistry`]) so concurrent submissions to different
/// symbols never contend with each other.
pub struct Book {
    symbol: Symbol,
    book: OrderBook,
    ledger: Ledger,
    risk_limits: RiskLimits,
    last_trade_price: Option<Price>,
    trade_callback: Option<TradeCallback>,
    rejection_callback: Option<RejectionCallback>,
}

impl Book {
    /// Create a new, empty book for `symbol`, wired to `ledger` and bounded
    /// by `risk_limits`. `initial_price` seeds the last-trade price reported
    /// before any real trade has occurred, typically the market-data
    /// engine's starting price for this symbol.
    pub fn new(symbol: Symbol, ledger: Ledger, risk_limits: RiskLimits, initial_price: Option<Price>) -> Self {
        Self {
            symbol,
            book: OrderBook::new(),
            ledger,
            risk_limits,
            last_trade_price: initial_price,
            trade_callback: None,
            rejection_callback: None,
        }
    }

    /// Replace this book's portfolio ledger handle.
    pub fn set_portfolio(&mut self, ledger: Ledger) {
        self.ledger = ledger;
    }

    /// Register the single callback invoked once per fill produced by this
    /// book, in execution order. Replaces any previously set callback.
    ///
    /// Invoked after [`submit_order`](Self::submit_order) has finished
    /// mutating book state — callers holding this book behind a mutex
    /// should release the guard before letting the callback run (see
    /// [`crate::BookRegistry`]) so a callback that submits a new order never
    /// deadlocks on this book's own lock.
    pub fn set_trade_callback<F>(&mut self, callback: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        self.trade_callback = Some(Arc::new(callback));
    }

    /// Register the single callback invoked when an order is rejected.
    /// Replaces any previously set callback.
    pub fn set_rejection_callback<F>(&mut self, callback: F)
    where
        F: Fn(&OrderRejection) + Send + Sync + 'static,
    {
        self.rejection_callback = Some(Arc::new(callback));
    }

    /// Clone of the currently registered trade callback, if any.
    pub(crate) fn trade_callback(&self) -> Option<TradeCallback> {
        self.trade_callback.clone()
    }

    /// Clone of the currently registered rejection callback, if any.
    pub(crate) fn rejection_callback(&self) -> Option<RejectionCallback> {
        self.rejection_callback.clone()
    }

    /// The symbol this book trades.
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Best bid price, or `None` if the bid side is empty.
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    /// Best ask price, or `None` if the ask side is empty.
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// Midpoint of the best bid and ask, or `None` unless both sides have
    /// resting liquidity.
    pub fn mid(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price((bid.0 + ask.0) / 2)),
            _ => None,
        }
    }

    /// Most recent trade price, falling back to the last price pushed via
    /// [`update_market_price`](Self::update_market_price) if no trade has
    /// occurred yet.
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Inform the book of the current synthetic fair-value tick from the
    /// market-data engine. Real trades overwrite this the next time they
    /// occur; it otherwise serves as the book's best guess at fair value
    /// when it has no trade history of its own.
    pub fn update_market_price(&mut self, price: Price) {
        self.last_trade_price = Some(price);
    }

    /// Snapshot the top `depth` price levels on each side.
    pub fn book_depth(&self, depth: usize) -> BookSnapshot {
        self.book.snapshot(depth)
    }

    /// Look up an order by id, including historical (filled/cancelled/rejected) ones.
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        self.book.get_order(order_id)
    }

    /// Cancel a resting order. Returns `false` if the order is unknown or
    /// already in a terminal state — no event is emitted either way.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        self.book.cancel_order(order_id).is_some()
    }

    /// Submit a new order for admission and matching.
    ///
    /// Returns `Err(EngineHalted)` only when the ledger reports a
    /// settlement invariant violation partway through matching — at that
    /// point the caller must stop submitting to this book (and, per the
    /// harness's contract, to every book sharing this ledger).
    pub fn submit_order(
        &mut self,
        participant_id: ParticipantId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Result<SubmitOutcome, EngineHalted> {
        if let Some(reason) = validate_order(order_type, price, quantity).err().or_else(|| {
            (!self.ledger.has_participant(&participant_id)).then_some(RejectReason::UnknownParticipant)
        }) {
            let order_id = self.book.next_order_id();
            self.book.next_timestamp();
            return Ok(SubmitOutcome {
                order_id,
                status: OrderStatus::Rejected,
                trades: Vec::new(),
                rejection: Some(OrderRejection {
                    order_id,
                    participant_id,
                    symbol: self.symbol,
                    reason,
                }),
            });
        }

        let order_id = self.book.next_order_id();
        let timestamp = self.book.next_timestamp();
        let mut order = Order::new(
            order_id,
            participant_id.clone(),
            self.symbol,
            side,
            order_type,
            price,
            quantity,
            timestamp,
        );

        // Admission-time risk check, against the best available execution
        // reference. A market order with no opposite liquidity can't trade
        // at all yet, so there is nothing to check against.
        let admission_reference = match order_type {
            OrderType::Limit => Some(price),
            OrderType::Market => self.book.side(side.opposite()).best_price(),
        };
        if let Some(reference_price) = admission_reference {
            if let Err(reason) = check_pretrade_risk(
                &self.ledger,
                &self.risk_limits,
                &participant_id,
                &self.symbol,
                side,
                reference_price,
                quantity,
            ) {
                order.reject();
                self.book.record_order(order);
                return Ok(SubmitOutcome {
                    order_id,
                    status: OrderStatus::Rejected,
                    trades: Vec::new(),
                    rejection: Some(OrderRejection {
                        order_id,
                        participant_id,
                        symbol: self.symbol,
                        reason,
                    }),
                });
            }
        }

        let mut trades = Vec::new();
        let mut rejection = None;

        loop {
            if order.remaining_quantity == 0 {
                break;
            }
            let opposite = side.opposite();
            let Some(best_price) = self.book.side(opposite).best_price() else {
                break;
            };
            let crosses = match order_type {
                OrderType::Market => true,
                OrderType::Limit => match side {
                    Side::Buy => price >= best_price,
                    Side::Sell => price <= best_price,
                },
            };
            if !crosses {
                break;
            }

            let resting_id = self
                .book
                .side(opposite)
                .best_level()
                .and_then(|level| level.front())
                .expect("best_price implies a non-empty level");
            let (resting_remaining, resting_participant) = {
                let resting_order = self.book.get_order(resting_id).expect("resting order is indexed");
                (resting_order.remaining_quantity, resting_order.participant_id.clone())
            };

            if resting_participant == participant_id {
                // Self-trade prevention: cancel the resting order that would
                // otherwise wash-trade against this participant's own order,
                // then retry matching against whatever is next in the book.
                self.book.cancel_order(resting_id);
                continue;
            }

            let fill_qty = order.remaining_quantity.min(resting_remaining);
            let fill_price = best_price;

            if let Err(reason) = check_pretrade_risk(
                &self.ledger,
                &self.risk_limits,
                &participant_id,
                &self.symbol,
                side,
                fill_price,
                fill_qty,
            ) {
                if order.filled_quantity == 0 {
                    order.reject();
                } else {
                    order.cancel();
                }
                rejection = Some(OrderRejection {
                    order_id,
                    participant_id: participant_id.clone(),
                    symbol: self.symbol,
                    reason,
                });
                break;
            }

            let (buyer_id, seller_id, buy_order_id, sell_order_id) = match side {
                Side::Buy => (participant_id.clone(), resting_participant, order_id, resting_id),
                Side::Sell => (resting_participant, participant_id.clone(), resting_id, order_id),
            };

            self.ledger
                .apply_trade(&buyer_id, &seller_id, self.symbol, fill_qty, fill_price)
                .map_err(EngineHalted)?;

            order.fill(fill_qty);
            let resting_filled = {
                let resting_order = self.book.get_order_mut(resting_id).expect("resting order is indexed");
                resting_order.fill(fill_qty);
                resting_order.remaining_quantity == 0
            };

            if resting_filled {
                let levels = self.book.side_mut(opposite);
                if let Some(level) = levels.get_level_mut(fill_price) {
                    level.pop_front(fill_qty);
                }
                if levels.get_level(fill_price).map(|l| l.is_empty()).unwrap_or(false) {
                    levels.remove_level(fill_price);
                }
            } else if let Some(level) = self.book.side_mut(opposite).get_level_mut(fill_price) {
                level.decrease_quantity(fill_qty);
            }

            let trade_id = self.book.next_trade_id();
            let trade_timestamp = self.book.next_timestamp();
            trades.push(Trade::new(
                trade_id,
                self.symbol,
                fill_price,
                fill_qty,
                buyer_id,
                seller_id,
                buy_order_id,
                sell_order_id,
                order_id,
                side,
                trade_timestamp,
            ));
            self.last_trade_price = Some(fill_price);
        }

        let final_status = order.status;
        let remaining = order.remaining_quantity;
        let should_rest = remaining > 0 && final_status.is_active() && order_type.can_rest();
        if remaining > 0 && final_status.is_active() && !order_type.can_rest() {
            order.cancel();
        }
        let final_status = if remaining > 0 && final_status.is_active() && !order_type.can_rest() {
            OrderStatus::Cancelled
        } else {
            final_status
        };

        self.book.record_order(order);
        if should_rest {
            self.book.rest_order(order_id);
        }

        Ok(SubmitOutcome {
            order_id,
            status: final_status,
            trades,
            rejection,
        })
    }
}

fn validate_order(order_type: OrderType, price: Price, quantity: Quantity) -> Result<(), RejectReason> {
    if quantity == 0 {
        return Err(RejectReason::NonPositiveQuantity);
    }
    match order_type {
        OrderType::Limit if price.0 <= 0 => Err(RejectReason::InvalidLimitPrice),
        OrderType::Market if price.0 != 0 => Err(RejectReason::InvalidMarketPrice),
        _ => Ok(()),
    }
}

fn required_cash(quantity: Quantity, price: Price) -> i64 {
    quantity as i64 * price.0
}

fn check_pretrade_risk(
    ledger: &Ledger,
    risk_limits: &RiskLimits,
    participant_id: &ParticipantId,
    symbol: &Symbol,
    side: Side,
    execution_price: Price,
    quantity: Quantity,
) -> Result<(), RejectReason> {
    match side {
        Side::Buy => {
            if ledger.get_cash(participant_id) < required_cash(quantity, execution_price) {
                return Err(RejectReason::InsufficientCash);
            }
        }
        Side::Sell => {
            if let Some(max_short) = risk_limits.max_short {
                let prospective = ledger.get_position(participant_id, symbol) - quantity as i64;
                if prospective < -(max_short as i64) {
                    return Err(RejectReason::ShortLimitExceeded);
                }
            }
        }
    }
    Ok(())
}
