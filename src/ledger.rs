//! Multi-participant portfolio ledger with atomic two-sided settlement.

use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{ParticipantId, Position, Price, Quantity, SettlementError, Symbol};

/// Structural ledger errors — a caller mistake (duplicate registration,
/// lookup of a participant that was never added) rather than a settlement
/// invariant violation. Distinct from [`SettlementError`], which is fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("participant {0} already exists")]
    ParticipantAlreadyExists(ParticipantId),
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),
}

#[derive(Clone, Debug)]
struct Account {
    cash: i64,
    initial_cash: i64,
    initial_position_value: i64,
    positions: FxHashMap<Symbol, Position>,
}

impl Account {
    fn new(initial_cash: i64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            initial_position_value: 0,
            positions: FxHashMap::default(),
        }
    }

    fn position_qty(&self, symbol: &Symbol) -> i64 {
        self.positions.get(symbol).map(|p| p.quantity).unwrap_or(0)
    }

    fn position_value(&self, price_of: impl Fn(&Symbol) -> i64) -> i64 {
        self.positions
            .iter()
            .map(|(sym, pos)| pos.market_value(price_of(sym)))
            .sum()
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    accounts: FxHashMap<ParticipantId, Account>,
}

/// Shared, thread-safe handle to the portfolio ledger.
///
/// Cloning a `Ledger` shares the same underlying state via `Arc` — this is
/// how the same ledger is wired into every per-symbol order book. All
/// methods take `&self`; interior mutability is via a single coarse mutex,
/// matching the "one lock for the whole ledger" model this crate uses
/// rather than lock-striping per participant.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl Ledger {
    /// Create an empty ledger with no registered participants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant with a starting cash balance.
    pub fn add_participant(&self, id: ParticipantId, initial_cash: i64) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        match inner.accounts.entry(id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::ParticipantAlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(Account::new(initial_cash));
                Ok(())
            }
        }
    }

    /// Returns true if `id` has been registered.
    pub fn has_participant(&self, id: &ParticipantId) -> bool {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.accounts.contains_key(id)
    }

    /// Seed a participant's starting position in `symbol`, establishing the
    /// average entry price used for unrealized P&L going forward. Intended
    /// for scenario setup, before any trading begins.
    pub fn set_initial_position(
        &self,
        id: &ParticipantId,
        symbol: Symbol,
        qty: i64,
        reference_price: Price,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        let account = inner
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;
        let position = account.positions.entry(symbol).or_insert_with(|| Position::new(symbol));
        position.seed(qty, reference_price.0);
        account.initial_position_value += qty * reference_price.0;
        Ok(())
    }

    /// Cash balance for `id`. Unknown participants read as zero.
    pub fn get_cash(&self, id: &ParticipantId) -> i64 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.accounts.get(id).map(|a| a.cash).unwrap_or(0)
    }

    /// Signed position quantity for `id` in `symbol`. Unknown participants
    /// or symbols never traded read as zero.
    pub fn get_position(&self, id: &ParticipantId, symbol: &Symbol) -> i64 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.accounts.get(id).map(|a| a.position_qty(symbol)).unwrap_or(0)
    }

    /// Mark-to-market portfolio value: cash plus the value of every position
    /// priced from `price_map`. Symbols absent from `price_map` price at zero.
    pub fn get_portfolio_value(&self, id: &ParticipantId, price_map: &FxHashMap<Symbol, Price>) -> i64 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let Some(account) = inner.accounts.get(id) else {
            return 0;
        };
        account.cash + account.position_value(|sym| price_map.get(sym).map(|p| p.0).unwrap_or(0))
    }

    /// Total P&L (realized and unrealized) since the participant's initial
    /// cash and seeded positions.
    pub fn get_pnl(&self, id: &ParticipantId, price_map: &FxHashMap<Symbol, Price>) -> i64 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let Some(account) = inner.accounts.get(id) else {
            return 0;
        };
        let portfolio_value =
            account.cash + account.position_value(|sym| price_map.get(sym).map(|p| p.0).unwrap_or(0));
        portfolio_value - account.initial_cash - account.initial_position_value
    }

    /// Sum of realized P&L across every symbol the participant has traded.
    pub fn realized_pnl(&self, id: &ParticipantId) -> i64 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner
            .accounts
            .get(id)
            .map(|a| a.positions.values().map(|p| p.realized_pnl).sum())
            .unwrap_or(0)
    }

    /// All registered participant ids, in no particular order.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.accounts.keys().cloned().collect()
    }

    /// Number of registered participants.
    pub fn entry_count(&self) -> usize {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.accounts.len()
    }

    /// Atomically settle a trade: debit the buyer's cash and credit the
    /// seller's by the notional, and update both sides' positions.
    ///
    /// Either both legs apply or neither does — a buyer or seller missing
    /// from the ledger, or a self-trade, is rejected before any balance is
    /// touched.
    pub fn apply_trade(
        &self,
        buyer: &ParticipantId,
        seller: &ParticipantId,
        symbol: Symbol,
        qty: Quantity,
        price: Price,
    ) -> Result<(), SettlementError> {
        if buyer == seller {
            return Err(SettlementError::SelfTrade(buyer.clone()));
        }

        let mut inner = self.inner.lock().expect("ledger mutex poisoned");

        if !inner.accounts.contains_key(buyer) {
            return Err(SettlementError::UnknownParticipant(buyer.clone()));
        }
        if !inner.accounts.contains_key(seller) {
            return Err(SettlementError::UnknownParticipant(seller.clone()));
        }

        let notional = qty as i64 * price.0;

        {
            let buyer_account = inner.accounts.get_mut(buyer).expect("checked above");
            buyer_account.cash -= notional;
            let pos = buyer_account.positions.entry(symbol).or_insert_with(|| Position::new(symbol));
            pos.apply_fill(qty as i64, price.0);
        }
        {
            let seller_account = inner.accounts.get_mut(seller).expect("checked above");
            seller_account.cash += notional;
            let pos = seller_account.positions.entry(symbol).or_insert_with(|| Position::new(symbol));
            pos.apply_fill(-(qty as i64), price.0);
        }

        Ok(())
    }
}
