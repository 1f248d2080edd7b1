//! Core types: Symbol, ParticipantId, Price, Quantity, Timestamp, OrderId, TradeId

use std::fmt;

/// Maximum byte length of a `Symbol`. Covers real-world ticker lengths
/// ("AAPL", "BRK.B", "GOOGL") with room to spare, while keeping the type
/// `Copy` and stack-allocated.
pub const SYMBOL_CAPACITY: usize = 12;

/// A short instrument identifier (e.g. "AAPL").
///
/// Stored inline as a fixed-size byte buffer rather than a `String` so it
/// stays `Copy` and hashes cheaply — `Symbol` is the key of every per-symbol
/// map in this crate (order books, price feeds, ledger rows).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    bytes: [u8; SYMBOL_CAPACITY],
    len: u8,
}

impl Symbol {
    /// Create a symbol from a short string.
    ///
    /// # Panics
    ///
    /// Panics if `s` is longer than [`SYMBOL_CAPACITY`] bytes.
    pub fn new(s: &str) -> Self {
        assert!(
            s.len() <= SYMBOL_CAPACITY,
            "symbol '{s}' exceeds {SYMBOL_CAPACITY} bytes"
        );
        let mut bytes = [0u8; SYMBOL_CAPACITY];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Self {
            bytes,
            len: s.len() as u8,
        }
    }

    /// Borrow the symbol as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize])
            .expect("Symbol always holds valid UTF-8")
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

/// Reserved prefix identifying internal liquidity providers.
///
/// Reporting code may use this to exclude market makers from
/// participant-facing summaries; the engine itself does not treat these
/// participants specially.
pub const INTERNAL_LIQUIDITY_PROVIDER_PREFIX: &str = "__market_maker";

/// Opaque participant identifier.
///
/// Unlike `Symbol`, the participant set is small relative to the number of
/// orders, so an owned `String` is the right tradeoff here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for ids reserved for internal liquidity providers
    /// (e.g. `__market_maker_1`).
    pub fn is_internal_liquidity_provider(&self) -> bool {
        self.0.starts_with(INTERNAL_LIQUIDITY_PROVIDER_PREFIX)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId::new(s)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        ParticipantId::new(s)
    }
}

/// Price in smallest units (e.g., cents, basis points).
///
/// `Price(10050)` represents $100.50 if tick size is $0.01.
/// Using fixed-point avoids floating-point errors in financial calculations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);
    pub const MAX: Price = Price(i64::MAX);
    pub const MIN: Price = Price(i64::MIN);
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display as dollars.cents assuming cents
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

/// Quantity of shares/contracts. Always positive.
pub type Quantity = u64;

/// Timestamp in nanoseconds since exchange start.
/// Monotonically increasing, assigned by exchange.
pub type Timestamp = u64;

/// Unique order identifier assigned by exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Unique trade identifier assigned by exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
