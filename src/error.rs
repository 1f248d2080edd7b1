//! Error taxonomy: non-fatal order rejections vs. fatal settlement failures.

use crate::{OrderId, ParticipantId, Symbol};
use thiserror::Error;

/// Why an order was rejected rather than admitted to the book.
///
/// Rejection is a normal, expected outcome — it does not halt the engine.
/// The rejected order transitions to [`crate::OrderStatus::Rejected`] and a
/// rejection event is dispatched to interested callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    /// Quantity must be greater than zero.
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,
    /// Limit orders must carry a strictly positive price.
    #[error("limit order price must be greater than zero")]
    InvalidLimitPrice,
    /// Market orders must not carry a limit price.
    #[error("market orders must not specify a price")]
    InvalidMarketPrice,
    /// The submitting participant has not been registered with the ledger.
    #[error("unknown participant")]
    UnknownParticipant,
    /// The order references a symbol with no order book.
    #[error("unknown symbol")]
    UnknownSymbol,
    /// A buy order's worst-case cost exceeds the participant's available cash.
    #[error("insufficient cash to cover order")]
    InsufficientCash,
    /// A sell order would push the participant's short position past the
    /// configured limit.
    #[error("order would exceed maximum short position")]
    ShortLimitExceeded,
}

/// A structural or risk validation failure that kept an order from being
/// fully admitted: either it never touched the book (rejected before any
/// fill) or a mid-match risk check cut it short after one or more fills
/// (partially filled, then cancelled). `order_id`/`participant_id`/`symbol`
/// let a caller correlate the rejection with the submission that caused it;
/// any fills that occurred before the cutoff are still reported separately
/// via the trade callback/`SubmitOutcome::trades`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("order rejected for {participant_id} on {symbol}: {reason}")]
pub struct OrderRejection {
    pub order_id: OrderId,
    pub participant_id: ParticipantId,
    pub symbol: Symbol,
    pub reason: RejectReason,
}

/// A violation of ledger settlement invariants.
///
/// Unlike [`RejectReason`], this is fatal: conservation of cash or shares
/// has been broken, which means the ledger's internal bookkeeping can no
/// longer be trusted. Any caller observing this error must stop accepting
/// new orders for the affected engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// A trade referenced a participant the ledger has no account for.
    #[error("settlement failed: unknown participant {0}")]
    UnknownParticipant(ParticipantId),
    /// Buyer and seller on a trade must be different participants.
    #[error("settlement failed: self-trade by {0}")]
    SelfTrade(ParticipantId),
}

/// Marker returned by engine operations once a [`SettlementError`] has put
/// the engine into a halted state. No further orders are accepted; the
/// underlying cause is preserved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("engine halted after settlement failure: {0}")]
pub struct EngineHalted(#[source] pub SettlementError);
