//! Trade representation

use crate::{OrderId, ParticipantId, Price, Quantity, Side, Symbol, Timestamp, TradeId};
use std::fmt;

/// A completed trade between two orders.
///
/// Trades are created when an incoming (aggressor) order matches against a
/// resting (passive) order on the book.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    /// Unique identifier assigned by the engine
    pub id: TradeId,
    /// Instrument traded
    pub symbol: Symbol,
    /// Execution price (always the resting order's price)
    pub price: Price,
    /// Quantity executed
    pub quantity: Quantity,
    /// Buyer's participant id
    pub buyer_id: ParticipantId,
    /// Seller's participant id
    pub seller_id: ParticipantId,
    /// Buy-side order id
    pub buy_order_id: OrderId,
    /// Sell-side order id
    pub sell_order_id: OrderId,
    /// Order that initiated the trade (taker)
    pub aggressor_order_id: OrderId,
    /// Side of the aggressor order
    pub aggressor_side: Side,
    /// When the trade occurred
    pub timestamp: Timestamp,
}

impl Trade {
    /// Create a new trade.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TradeId,
        symbol: Symbol,
        price: Price,
        quantity: Quantity,
        buyer_id: ParticipantId,
        seller_id: ParticipantId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        aggressor_order_id: OrderId,
        aggressor_side: Side,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            symbol,
            price,
            quantity,
            buyer_id,
            seller_id,
            buy_order_id,
            sell_order_id,
            aggressor_order_id,
            aggressor_side,
            timestamp,
        }
    }

    /// Returns the order id that was resting on the book (the maker).
    #[inline]
    pub fn passive_order_id(&self) -> OrderId {
        match self.aggressor_side {
            Side::Buy => self.sell_order_id,
            Side::Sell => self.buy_order_id,
        }
    }

    /// Returns the side of the passive (maker) order.
    #[inline]
    pub fn passive_side(&self) -> Side {
        self.aggressor_side.opposite()
    }

    /// Returns the notional value (price × quantity).
    #[inline]
    pub fn notional(&self) -> i64 {
        self.price.0 * self.quantity as i64
    }

    /// Compute the volume-weighted average price (VWAP) of a trade series.
    ///
    /// Returns `None` if the slice is empty or total quantity is zero.
    ///
    /// ```
    /// use simulator_core::{Trade, Price, TradeId, OrderId, ParticipantId, Side, Symbol};
    ///
    /// let trades = vec![
    ///     Trade::new(TradeId(1), Symbol::new("AAPL"), Price(100_00), 50,
    ///         ParticipantId::new("a"), ParticipantId::new("b"),
    ///         OrderId(1), OrderId(2), OrderId(1), Side::Buy, 1),
    ///     Trade::new(TradeId(2), Symbol::new("AAPL"), Price(102_00), 150,
    ///         ParticipantId::new("c"), ParticipantId::new("d"),
    ///         OrderId(3), OrderId(4), OrderId(3), Side::Buy, 2),
    /// ];
    /// let vwap = Trade::vwap(&trades).unwrap();
    /// // (100_00 * 50 + 102_00 * 150) / 200 = 101_50
    /// assert_eq!(vwap, Price(101_50));
    /// ```
    pub fn vwap(trades: &[Trade]) -> Option<Price> {
        if trades.is_empty() {
            return None;
        }
        let total_qty: u64 = trades.iter().map(|t| t.quantity).sum();
        if total_qty == 0 {
            return None;
        }
        let total_notional: i64 = trades.iter().map(|t| t.price.0 * t.quantity as i64).sum();
        Some(Price(total_notional / total_qty as i64))
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {} @ {} ({} aggressor)",
            self.id,
            self.quantity,
            self.symbol,
            if self.aggressor_side == Side::Buy {
                "bought"
            } else {
                "sold"
            },
            self.price,
            self.aggressor_order_id
        )
    }
}
