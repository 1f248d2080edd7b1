//! Order representation and lifecycle

use crate::{OrderId, ParticipantId, Price, Quantity, Side, Symbol, Timestamp};

/// Whether an order is a resting limit order or an immediately-executed
/// market order.
///
/// Market orders never rest: unmatched remainder is cancelled rather than
/// inserted into the book. This collapses the teacher crate's separate
/// time-in-force axis (GTC/IOC/FOK) into the two order types this system
/// actually needs — the distinction the rest of the engine cares about is
/// "does this order rest" (Limit) vs. "does it not" (Market).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderType {
    /// Executes immediately against the best available price(s). Any
    /// unfilled remainder is cancelled, never rests.
    Market,
    /// Executes at its limit price or better; unfilled remainder rests on
    /// the book.
    #[default]
    Limit,
}

impl OrderType {
    /// Returns true if orders of this type can rest on the book once
    /// admitted.
    #[inline]
    pub fn can_rest(self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

/// Status of an order in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderStatus {
    /// Order accepted, resting on book (no fills yet)
    #[default]
    Pending,
    /// Some quantity filled, remainder still on book
    PartiallyFilled,
    /// Fully executed, no longer on book
    Filled,
    /// Removed by user request, no longer on book
    Cancelled,
    /// Never admitted: failed structural validation or pre-trade risk
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is still active (can be filled or
    /// cancelled).
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }

    /// Returns true if the order is terminal (no further state changes).
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An order in the order book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Unique identifier assigned by the engine
    pub id: OrderId,
    /// Participant who submitted this order
    pub participant_id: ParticipantId,
    /// Instrument this order trades
    pub symbol: Symbol,
    /// Buy or sell
    pub side: Side,
    /// Market or limit
    pub order_type: OrderType,
    /// Limit price (zero for market orders)
    pub price: Price,
    /// Original quantity when submitted
    pub original_quantity: Quantity,
    /// Quantity still available to fill
    pub remaining_quantity: Quantity,
    /// Quantity that has been filled
    pub filled_quantity: Quantity,
    /// When the order was admitted by the engine
    pub timestamp: Timestamp,
    /// Current lifecycle status
    pub status: OrderStatus,
}

impl Order {
    /// Create a new order with the given parameters.
    ///
    /// The order starts with `remaining_quantity == original_quantity`,
    /// `filled_quantity == 0`, and `status == Pending`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        participant_id: ParticipantId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            participant_id,
            symbol,
            side,
            order_type,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            filled_quantity: 0,
            timestamp,
            status: OrderStatus::Pending,
        }
    }

    /// Returns true if the order can still be filled or cancelled.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Fill the order by the given quantity.
    ///
    /// Updates `remaining_quantity`, `filled_quantity`, and `status`.
    ///
    /// # Panics
    ///
    /// Panics if `quantity > remaining_quantity`.
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity <= self.remaining_quantity,
            "fill quantity {} exceeds remaining {}",
            quantity,
            self.remaining_quantity
        );

        self.remaining_quantity -= quantity;
        self.filled_quantity += quantity;

        self.status = if self.remaining_quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Cancel the order, setting status to Cancelled.
    ///
    /// Returns the quantity that was cancelled (remaining at time of
    /// cancel).
    ///
    /// # Panics
    ///
    /// Panics if the order is already in a terminal state.
    pub fn cancel(&mut self) -> Quantity {
        assert!(
            self.is_active(),
            "cannot cancel order in terminal state {:?}",
            self.status
        );

        let cancelled = self.remaining_quantity;
        self.remaining_quantity = 0;
        self.status = OrderStatus::Cancelled;
        cancelled
    }

    /// Mark the order rejected. Only valid before any fill has occurred.
    ///
    /// # Panics
    ///
    /// Panics if the order has already filled or reached a terminal state.
    pub fn reject(&mut self) {
        assert!(
            self.status == OrderStatus::Pending,
            "cannot reject order already in state {:?}",
            self.status
        );
        self.remaining_quantity = 0;
        self.status = OrderStatus::Rejected;
    }
}
