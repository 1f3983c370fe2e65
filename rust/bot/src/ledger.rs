use crate::accounts::{AccountError, AccountStore, PlayerId};
use casino_engine::outcome::{GameOutcome, GameType};
use casino_engine::Coins;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One settled wager. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub player_id: PlayerId,
    pub game: GameType,
    pub bet_amount: Coins,
    pub outcome: GameOutcome,
    /// Balance change excluding the returned stake.
    pub net_win_amount: Coins,
    pub timestamp: NaiveDateTime,
}

/// A settled wager waiting for its ledger id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wager {
    pub player_id: PlayerId,
    pub game: GameType,
    pub bet_amount: Coins,
    pub outcome: GameOutcome,
    pub net_win_amount: Coins,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_games: usize,
    pub wins: usize,
    pub total_wagered: Coins,
    /// Sum of player net results; negative means the house is ahead.
    pub player_net: Coins,
}

/// Append-only wager log. Recording also bumps the owner's game counters.
#[derive(Debug)]
pub struct Ledger {
    entries: RwLock<Vec<LedgerEntry>>,
    next_id: AtomicU64,
    accounts: Arc<AccountStore>,
}

impl Ledger {
    pub fn new(accounts: Arc<AccountStore>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            accounts,
        }
    }

    /// Appends a settled wager.
    ///
    /// # Panics
    ///
    /// Panics if the wager's player has no account. Every game path creates
    /// the account before staking, so a miss here means the books are wrong.
    ///
    /// The entry lock is taken before the account counters move, so a
    /// poisoned ledger leaves `games_played` untouched.
    pub fn record(&self, wager: Wager) -> Result<LedgerEntry, LedgerError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LedgerError::StoragePoisoned)?;

        match self
            .accounts
            .record_game(&wager.player_id, wager.outcome.is_win())
        {
            Ok(_) => {}
            Err(AccountError::UnknownPlayer(id)) => {
                // release the ledger before unwinding so it is not poisoned
                drop(entries);
                panic!("ledger entry recorded for missing account {id}")
            }
            Err(_) => return Err(LedgerError::StoragePoisoned),
        }

        let entry = LedgerEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            player_id: wager.player_id,
            game: wager.game,
            bet_amount: wager.bet_amount,
            outcome: wager.outcome,
            net_win_amount: wager.net_win_amount,
            timestamp: wager.timestamp,
        };

        entries.push(entry.clone());

        tracing::debug!(
            entry_id = entry.id,
            player_id = %entry.player_id,
            game = %entry.game,
            outcome = %entry.outcome,
            net = entry.net_win_amount,
            "ledger entry appended"
        );
        Ok(entry)
    }

    /// A player's entries, most recent first.
    pub fn history(&self, player_id: &str, limit: usize) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.player_id == player_id)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn games_played_on(&self, date: NaiveDate) -> Result<usize, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        Ok(entries
            .iter()
            .filter(|e| e.timestamp.date() == date)
            .count())
    }

    pub fn total_entries(&self) -> Result<usize, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        Ok(entries.len())
    }

    pub fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        Ok(entries.iter().fold(LedgerStats::default(), |mut acc, e| {
            acc.total_games += 1;
            if e.outcome.is_win() {
                acc.wins += 1;
            }
            acc.total_wagered = acc.total_wagered.saturating_add(e.bet_amount);
            acc.player_net = acc.player_net.saturating_add(e.net_win_amount);
            acc
        }))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger storage poisoned")]
    StoragePoisoned,
}
