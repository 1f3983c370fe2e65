use casino_engine::Coins;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

pub type PlayerId = String;

pub const DEFAULT_STARTING_BALANCE: Coins = 10_000;
pub const DEFAULT_DAILY_BONUS: Coins = 1_000;

/// One player's economic state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    player_id: PlayerId,
    display_name: String,
    balance: Coins,
    /// Stake held by a live blackjack hand; already counted in `balance`.
    reserved: Coins,
    is_admin: bool,
    last_daily_claim: Option<NaiveDateTime>,
    games_played: u32,
    games_won: u32,
}

impl Account {
    fn new(player_id: PlayerId, display_name: String, balance: Coins) -> Self {
        Self {
            player_id,
            display_name,
            balance,
            reserved: 0,
            is_admin: false,
            last_daily_claim: None,
            games_played: 0,
            games_won: 0,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn balance(&self) -> Coins {
        self.balance
    }

    pub fn reserved(&self) -> Coins {
        self.reserved
    }

    /// Coins that may be staked, transferred or taken right now.
    pub fn available(&self) -> Coins {
        self.balance - self.reserved
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn last_daily_claim(&self) -> Option<NaiveDateTime> {
        self.last_daily_claim
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    pub fn games_won(&self) -> u32 {
        self.games_won
    }

    /// Win rate rendered with one decimal, `"0%"` before the first game.
    pub fn win_rate(&self) -> String {
        if self.games_played == 0 {
            return "0%".to_string();
        }
        format!(
            "{:.1}%",
            self.games_won as f64 / self.games_played as f64 * 100.0
        )
    }

    /// The only place a balance changes. Callers guarantee the result stays
    /// non-negative; a result past [`Coins::MAX`] leaves the balance as it was.
    pub(crate) fn apply_delta(&mut self, delta: Coins) -> Result<(), AccountError> {
        self.balance = self
            .balance
            .checked_add(delta)
            .ok_or(AccountError::BalanceOverflow {
                balance: self.balance,
                delta,
            })?;
        Ok(())
    }

    /// Holds `amount` of the balance; callers check [`Account::available`] first.
    pub(crate) fn reserve(&mut self, amount: Coins) {
        self.reserved += amount;
    }

    /// Gives back a stake taken by [`Account::reserve`]. Releasing more than
    /// is held means the stake bookkeeping is broken and nothing changes.
    pub(crate) fn release(&mut self, amount: Coins) -> Result<(), AccountError> {
        if amount < 0 || amount > self.reserved {
            return Err(AccountError::StakeMismatch {
                released: amount,
                reserved: self.reserved,
            });
        }
        self.reserved -= amount;
        Ok(())
    }

    fn record_game(&mut self, won: bool) {
        self.games_played += 1;
        if won {
            self.games_won += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyClaim {
    pub granted: bool,
    pub amount: Coins,
    pub new_balance: Coins,
    /// Whole hours until the next local midnight; 0 when granted.
    pub hours_until_next_reset: i64,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Account>,
    index: HashMap<PlayerId, usize>,
}

impl Table {
    fn get(&self, player_id: &str) -> Option<&Account> {
        self.index.get(player_id).map(|&i| &self.rows[i])
    }

    fn get_mut(&mut self, player_id: &str) -> Option<&mut Account> {
        match self.index.get(player_id) {
            Some(&i) => Some(&mut self.rows[i]),
            None => None,
        }
    }

    fn get_or_insert(&mut self, player_id: &str, display_name: &str, balance: Coins) -> &mut Account {
        let idx = match self.index.get(player_id) {
            Some(&i) => i,
            None => {
                self.rows.push(Account::new(
                    player_id.to_string(),
                    display_name.to_string(),
                    balance,
                ));
                let i = self.rows.len() - 1;
                self.index.insert(player_id.to_string(), i);
                tracing::info!(
                    player_id = %player_id,
                    balance = balance,
                    "created account"
                );
                i
            }
        };
        &mut self.rows[idx]
    }
}

/// In-memory account table keyed by external player id. Rows keep their
/// insertion order, which breaks leaderboard ties.
#[derive(Debug)]
pub struct AccountStore {
    table: RwLock<Table>,
    starting_balance: Coins,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::with_starting_balance(DEFAULT_STARTING_BALANCE)
    }

    pub fn with_starting_balance(starting_balance: Coins) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            starting_balance,
        }
    }

    pub fn starting_balance(&self) -> Coins {
        self.starting_balance
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, AccountError> {
        self.table.read().map_err(|_| AccountError::StoragePoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, AccountError> {
        self.table.write().map_err(|_| AccountError::StoragePoisoned)
    }

    pub fn get(&self, player_id: &str) -> Result<Option<Account>, AccountError> {
        Ok(self.read()?.get(player_id).cloned())
    }

    pub fn require(&self, player_id: &str) -> Result<Account, AccountError> {
        self.get(player_id)?
            .ok_or_else(|| AccountError::UnknownPlayer(player_id.to_string()))
    }

    pub fn contains(&self, player_id: &str) -> Result<bool, AccountError> {
        Ok(self.read()?.index.contains_key(player_id))
    }

    pub fn get_or_create(&self, player_id: &str, display_name: &str) -> Result<Account, AccountError> {
        let mut table = self.write()?;
        Ok(table
            .get_or_insert(player_id, display_name, self.starting_balance)
            .clone())
    }

    /// `balance += delta` with no sign check of its own.
    pub fn apply_delta(&self, player_id: &str, delta: Coins) -> Result<Account, AccountError> {
        self.update(player_id, |account| {
            account.apply_delta(delta)?;
            Ok(account.clone())
        })
    }

    /// Runs `f` on the account while holding the table lock, so checks made
    /// inside `f` still hold when it mutates.
    pub fn update<T, E>(
        &self,
        player_id: &str,
        f: impl FnOnce(&mut Account) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<AccountError>,
    {
        let mut table = self.write()?;
        let account = table
            .get_mut(player_id)
            .ok_or_else(|| AccountError::UnknownPlayer(player_id.to_string()))?;
        f(account)
    }

    /// Like [`AccountStore::update`], creating the account first if needed.
    pub fn upsert<T, E>(
        &self,
        player_id: &str,
        display_name: &str,
        f: impl FnOnce(&mut Account) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<AccountError>,
    {
        let mut table = self.write()?;
        f(table.get_or_insert(player_id, display_name, self.starting_balance))
    }

    /// Moves `amount` from an existing sender to a recipient, creating the
    /// recipient if needed. Both sides change under one lock.
    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        to_display_name: &str,
        amount: Coins,
    ) -> Result<(Account, Account), AccountError> {
        let mut table = self.write()?;
        let available = table
            .get(from)
            .ok_or_else(|| AccountError::UnknownPlayer(from.to_string()))?
            .available();
        if available < amount {
            return Err(AccountError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        // checked before the recipient row exists, so a refusal leaves no trace
        let recipient_balance = table
            .get(to)
            .map_or(self.starting_balance, |a| a.balance);
        if recipient_balance.checked_add(amount).is_none() {
            return Err(AccountError::BalanceOverflow {
                balance: recipient_balance,
                delta: amount,
            });
        }

        table
            .get_or_insert(to, to_display_name, self.starting_balance)
            .apply_delta(amount)?;
        let sender = table
            .get_mut(from)
            .ok_or_else(|| AccountError::UnknownPlayer(from.to_string()))?;
        sender.apply_delta(-amount)?;
        let sender = sender.clone();
        let recipient = table
            .get(to)
            .cloned()
            .ok_or_else(|| AccountError::UnknownPlayer(to.to_string()))?;
        Ok((sender, recipient))
    }

    /// Grants `bonus` once per calendar day of `now`.
    pub fn claim_daily(
        &self,
        player_id: &str,
        now: NaiveDateTime,
        bonus: Coins,
    ) -> Result<DailyClaim, AccountError> {
        self.update(player_id, |account| {
            let claimed_today = account
                .last_daily_claim
                .is_some_and(|last| last.date() == now.date());
            if claimed_today {
                return Ok(DailyClaim {
                    granted: false,
                    amount: 0,
                    new_balance: account.balance,
                    hours_until_next_reset: hours_until_midnight(now),
                });
            }
            account.apply_delta(bonus)?;
            account.last_daily_claim = Some(now);
            Ok(DailyClaim {
                granted: true,
                amount: bonus,
                new_balance: account.balance,
                hours_until_next_reset: 0,
            })
        })
    }

    /// Richest first; equal balances keep insertion order.
    pub fn top_by_balance(&self, limit: usize) -> Result<Vec<Account>, AccountError> {
        let mut rows = self.read()?.rows.clone();
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(limit);
        Ok(rows)
    }

    pub fn reset_balance(&self, player_id: &str, amount: Coins) -> Result<Account, AccountError> {
        self.update(player_id, |account| {
            account.apply_delta(amount - account.balance)?;
            Ok(account.clone())
        })
    }

    pub fn set_admin_flag(&self, player_id: &str, is_admin: bool) -> Result<Account, AccountError> {
        self.update(player_id, |account| {
            account.is_admin = is_admin;
            Ok(account.clone())
        })
    }

    pub(crate) fn record_game(&self, player_id: &str, won: bool) -> Result<Account, AccountError> {
        self.update(player_id, |account| {
            account.record_game(won);
            Ok(account.clone())
        })
    }

    pub fn total_users(&self) -> Result<usize, AccountError> {
        Ok(self.read()?.rows.len())
    }

    /// Sum of all balances, pinned at [`Coins::MAX`] rather than wrapping.
    pub fn total_coins(&self) -> Result<Coins, AccountError> {
        Ok(self
            .read()?
            .rows
            .iter()
            .fold(0, |sum: Coins, a| sum.saturating_add(a.balance)))
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

fn hours_until_midnight(now: NaiveDateTime) -> i64 {
    let next_midnight = (now.date() + Duration::days(1)).and_time(NaiveTime::MIN);
    (next_midnight - now).num_hours()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Coins, available: Coins },
    #[error("Balance {balance} cannot change by {delta} without overflowing")]
    BalanceOverflow { balance: Coins, delta: Coins },
    #[error("Cannot release {released} coins, only {reserved} are held")]
    StakeMismatch { released: Coins, reserved: Coins },
    #[error("Account storage poisoned")]
    StoragePoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::thread;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = AccountStore::new();
        let first = store.get_or_create("p1", "Alice").expect("create");
        assert_eq!(first.balance(), 10_000);
        assert_eq!(first.games_played(), 0);
        assert!(!first.is_admin());

        store.apply_delta("p1", -500).expect("delta");
        let again = store.get_or_create("p1", "Someone else").expect("get");
        assert_eq!(again.balance(), 9_500);
        assert_eq!(again.display_name(), "Alice");
        assert_eq!(store.total_users().expect("count"), 1);
    }

    #[test]
    fn apply_delta_requires_existing_account() {
        let store = AccountStore::new();
        assert_eq!(
            store.apply_delta("ghost", 10),
            Err(AccountError::UnknownPlayer("ghost".into()))
        );
    }

    #[test]
    fn daily_bonus_is_granted_once_per_calendar_day() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");

        let first = store.claim_daily("p1", at(25, 9, 0), 1_000).expect("claim");
        assert!(first.granted);
        assert_eq!(first.new_balance, 11_000);

        let second = store.claim_daily("p1", at(25, 21, 30), 1_000).expect("claim");
        assert!(!second.granted);
        assert_eq!(second.amount, 0);
        assert_eq!(second.new_balance, 11_000);
        assert_eq!(second.hours_until_next_reset, 2);

        // calendar rollover, not a 24h window
        let next_day = store.claim_daily("p1", at(26, 0, 5), 1_000).expect("claim");
        assert!(next_day.granted);
        assert_eq!(next_day.new_balance, 12_000);
    }

    #[test]
    fn concurrent_daily_claims_grant_once() {
        let store = Arc::new(AccountStore::new());
        store.get_or_create("p1", "Alice").expect("create");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .claim_daily("p1", at(25, 12, 0), 1_000)
                    .expect("claim")
                    .granted
            }));
        }
        let grants = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .filter(|&g| g)
            .count();
        assert_eq!(grants, 1);
        assert_eq!(store.require("p1").expect("account").balance(), 11_000);
    }

    #[test]
    fn leaderboard_ties_keep_insertion_order() {
        let store = AccountStore::new();
        for id in ["a", "b", "c", "d"] {
            store.get_or_create(id, id).expect("create");
        }
        store.apply_delta("c", 500).expect("delta");
        store.apply_delta("a", -100).expect("delta");

        let top: Vec<String> = store
            .top_by_balance(3)
            .expect("top")
            .iter()
            .map(|a| a.player_id().to_string())
            .collect();
        assert_eq!(top, vec!["c", "b", "d"]);
    }

    #[test]
    fn transfer_is_zero_sum_and_creates_recipient() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        let before = store.total_coins().expect("total");

        let (sender, recipient) = store.transfer("p1", "p2", "Bob", 2_500).expect("transfer");
        assert_eq!(sender.balance(), 7_500);
        assert_eq!(recipient.balance(), 12_500);
        assert_eq!(recipient.display_name(), "Bob");
        // recipient's starting grant is the only new money
        assert_eq!(store.total_coins().expect("total"), before + 10_000);
    }

    #[test]
    fn transfer_respects_reserved_stake() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        store
            .update("p1", |a| -> Result<(), AccountError> {
                a.reserve(9_000);
                Ok(())
            })
            .expect("reserve");

        assert_eq!(
            store.transfer("p1", "p2", "Bob", 1_001).map(|_| ()),
            Err(AccountError::InsufficientFunds {
                requested: 1_001,
                available: 1_000
            })
        );
        assert!(!store.contains("p2").expect("contains"));
    }

    #[test]
    fn reset_and_admin_flag() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        assert_eq!(store.reset_balance("p1", 42).expect("reset").balance(), 42);
        assert!(store.set_admin_flag("p1", true).expect("flag").is_admin());
        assert_eq!(store.total_coins().expect("total"), 42);
    }

    #[test]
    fn win_rate_formatting() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        assert_eq!(store.require("p1").expect("acct").win_rate(), "0%");
        store.record_game("p1", true).expect("record");
        store.record_game("p1", false).expect("record");
        store.record_game("p1", false).expect("record");
        assert_eq!(store.require("p1").expect("acct").win_rate(), "33.3%");
    }

    #[test]
    fn overflowing_delta_leaves_balance_alone() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        assert_eq!(
            store.apply_delta("p1", Coins::MAX).map(|_| ()),
            Err(AccountError::BalanceOverflow {
                balance: 10_000,
                delta: Coins::MAX
            })
        );
        assert_eq!(store.require("p1").expect("acct").balance(), 10_000);
        // the store is still usable afterwards
        assert_eq!(store.apply_delta("p1", 5).expect("delta").balance(), 10_005);
    }

    #[test]
    fn transfer_refuses_to_overflow_recipient() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        store.get_or_create("rich", "Rich").expect("create");
        store
            .apply_delta("rich", Coins::MAX - 10_000)
            .expect("top up");

        assert!(matches!(
            store.transfer("p1", "rich", "Rich", 1),
            Err(AccountError::BalanceOverflow { .. })
        ));
        assert_eq!(store.require("p1").expect("acct").balance(), 10_000);
        assert_eq!(store.require("rich").expect("acct").balance(), Coins::MAX);
        assert_eq!(store.total_coins().expect("total"), Coins::MAX);
    }

    #[test]
    fn release_beyond_reservation_is_refused() {
        let store = AccountStore::new();
        store.get_or_create("p1", "Alice").expect("create");
        let result = store.update("p1", |a| -> Result<(), AccountError> {
            a.reserve(100);
            a.release(150)
        });
        assert_eq!(
            result,
            Err(AccountError::StakeMismatch {
                released: 150,
                reserved: 100
            })
        );
        assert_eq!(store.require("p1").expect("acct").reserved(), 100);
    }
}
