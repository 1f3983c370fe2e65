//! Command dispatch over the account store, ledger and game engines.
//!
//! A wager follows one path on every table: validate the stake against the
//! coins the player can spend, resolve the game, apply the net result, then
//! append a ledger entry. Blackjack reserves its stake while the hand is live
//! and settles it in the same balance update that applies the result.

use crate::accounts::{Account, AccountError, AccountStore};
use crate::clock::{Clock, SystemClock};
use crate::commands::{format_coins, Command, CommandOutcome, CommandRequest, LeaderboardScope};
use crate::errors::{CasinoError, IntoErrorResponse};
use crate::ledger::{Ledger, Wager, DEFAULT_HISTORY_LIMIT};
use crate::session::{ExpiredSession, SessionError, SessionManager, SessionUpdate};
use crate::settings::AppSettings;
use casino_engine::blackjack::{BlackjackAction, BlackjackGame, BlackjackOutcome};
use casino_engine::errors::GameError;
use casino_engine::outcome::{GameOutcome, GameType};
use casino_engine::rng::{RandomSource, SeededSource};
use casino_engine::roulette::{self, BetCategory, RouletteBet, RouletteResult};
use casino_engine::rules::validate_wager;
use casino_engine::slots::{self, SlotsResult};
use casino_engine::Coins;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const ADMIN_STATS_TOP: usize = 5;

pub type CasinoResult = Result<CommandOutcome, CasinoError>;

pub struct Casino {
    settings: AppSettings,
    accounts: Arc<AccountStore>,
    ledger: Arc<Ledger>,
    sessions: Arc<SessionManager>,
    rng: Mutex<Box<dyn RandomSource>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Casino {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Casino")
            .field("settings", &self.settings)
            .field("accounts", &self.accounts)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl Casino {
    /// Seeded from `settings.seed` when present, otherwise from OS entropy.
    pub fn new(settings: AppSettings) -> Result<Self, CasinoError> {
        let rng: Box<dyn RandomSource> = match settings.seed {
            Some(seed) => Box::new(SeededSource::new_with_seed(seed)),
            None => Box::new(SeededSource::from_entropy()),
        };
        Self::with_dependencies(settings, rng, Arc::new(SystemClock))
    }

    pub fn with_dependencies(
        settings: AppSettings,
        rng: Box<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CasinoError> {
        settings.validate()?;
        let accounts = Arc::new(AccountStore::with_starting_balance(settings.starting_balance));
        let ledger = Arc::new(Ledger::new(Arc::clone(&accounts)));
        let sessions = Arc::new(SessionManager::with_timeout(settings.blackjack_timeout()));
        tracing::info!(
            starting_balance = settings.starting_balance,
            min_bet = settings.min_bet,
            seeded = settings.seed.is_some(),
            "casino ready"
        );
        Ok(Self {
            settings,
            accounts,
            ledger,
            sessions,
            rng: Mutex::new(rng),
            clock,
        })
    }

    /// Replaces the blackjack turn timeout. Only meaningful before any hand
    /// is dealt.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.sessions = Arc::new(SessionManager::with_timeout(timeout));
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn accounts(&self) -> &Arc<AccountStore> {
        &self.accounts
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Runs one command. Failures come back as an unsuccessful outcome with
    /// balances untouched.
    pub fn execute(&self, request: CommandRequest) -> CommandOutcome {
        let span = tracing::info_span!(
            "command",
            player_id = %request.player_id,
            command = request.command.name()
        );
        let _entered = span.enter();

        let player = request.player_id.as_str();
        let name = request.name();
        let result = match &request.command {
            Command::Balance { target } => self.check_balance(player, target.as_deref()),
            Command::Daily => self.claim_daily(player),
            Command::Transfer {
                target,
                target_name,
                amount,
            } => self.transfer(
                player,
                target,
                target_name.as_deref().unwrap_or(target),
                *amount,
            ),
            Command::Roulette {
                amount,
                category,
                number,
            } => self.roulette_bet(player, name, *amount, *category, *number),
            Command::BlackjackStart { amount } => self.blackjack_start(player, name, *amount),
            Command::BlackjackAction { action } => self.blackjack_action(player, *action),
            Command::Slots { amount } => self.slots_spin(player, name, *amount),
            Command::Leaderboard { limit, scope } => self.leaderboard(*limit, *scope),
            Command::History { limit } => self.history(player, *limit),
            Command::AdminGive { target, amount } => self.admin_give(player, target, *amount),
            Command::AdminTake { target, amount } => self.admin_take(player, target, *amount),
            Command::AdminReset { target, amount } => self.admin_reset(player, target, *amount),
            Command::AdminStats => self.admin_stats(player),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => err.into_outcome(),
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(rng.as_mut())
    }

    /// Appends the ledger entry for a wager whose balance change has already
    /// been applied. A ledger failure is reported after the fact; the balance
    /// stays moved.
    fn settle(
        &self,
        player: &str,
        game: GameType,
        bet_amount: Coins,
        outcome: GameOutcome,
        net: Coins,
    ) -> Result<(), CasinoError> {
        let entry = self.ledger.record(Wager {
            player_id: player.to_string(),
            game,
            bet_amount,
            outcome,
            net_win_amount: net,
            timestamp: self.clock.now(),
        })?;
        tracing::info!(
            player_id = %player,
            game = %game,
            bet = bet_amount,
            outcome = %outcome,
            net,
            entry_id = entry.id,
            "wager settled"
        );
        Ok(())
    }

    pub fn check_balance(&self, player: &str, target: Option<&str>) -> CasinoResult {
        let account = self.accounts.require(target.unwrap_or(player))?;
        let mut outcome = CommandOutcome::success()
            .with_balance(account.balance(), 0)
            .field(
                format!("{}'s Balance", account.display_name()),
                format!("{} coins", format_coins(account.balance())),
            )
            .field("Games Played", account.games_played().to_string())
            .field("Games Won", account.games_won().to_string())
            .field("Win Rate", account.win_rate());
        if account.reserved() > 0 {
            outcome = outcome.field(
                "In Play",
                format!("{} coins on a blackjack hand", format_coins(account.reserved())),
            );
        }
        Ok(outcome)
    }

    pub fn claim_daily(&self, player: &str) -> CasinoResult {
        let claim = self
            .accounts
            .claim_daily(player, self.clock.now(), self.settings.daily_bonus)?;
        if !claim.granted {
            tracing::debug!(player_id = %player, "daily bonus already claimed");
            return Ok(CommandOutcome::success()
                .with_tag("already_claimed")
                .with_balance(claim.new_balance, 0)
                .field(
                    "Daily Bonus",
                    format!(
                        "You already claimed today's bonus. Come back in {} hours.",
                        claim.hours_until_next_reset
                    ),
                ));
        }

        tracing::info!(player_id = %player, amount = claim.amount, "daily bonus granted");
        Ok(CommandOutcome::success()
            .with_tag("claimed")
            .with_balance(claim.new_balance, claim.amount)
            .field(
                "Daily Bonus",
                format!("You received {} coins!", format_coins(claim.amount)),
            )
            .field("Balance", format!("{} coins", format_coins(claim.new_balance))))
    }

    pub fn transfer(&self, player: &str, target: &str, target_name: &str, amount: Coins) -> CasinoResult {
        if amount < 1 {
            return Err(CasinoError::validation("Transfer amount must be at least 1 coin!"));
        }
        if player == target {
            return Err(CasinoError::validation(
                "You can't transfer coins to yourself!",
            ));
        }

        let (sender, recipient) = self.accounts.transfer(player, target, target_name, amount)?;
        tracing::info!(from = %player, to = %target, amount, "coins transferred");
        Ok(CommandOutcome::success()
            .with_tag("transferred")
            .with_balance(sender.balance(), -amount)
            .field(
                "Transfer",
                format!(
                    "You sent {} coins to {}!",
                    format_coins(amount),
                    recipient.display_name()
                ),
            )
            .field("Balance", format!("{} coins", format_coins(sender.balance()))))
    }

    /// Validates the stake and runs `resolve` while the player's account is
    /// locked, so nothing else can spend the same coins in between.
    fn wager<R>(
        &self,
        player: &str,
        name: &str,
        amount: Coins,
        resolve: impl FnOnce(&mut dyn RandomSource) -> Result<R, GameError>,
        net_of: impl Fn(&R) -> Coins,
    ) -> Result<(R, Account), CasinoError> {
        let min_bet = self.settings.min_bet;
        self.accounts
            .upsert(player, name, |account| -> Result<_, CasinoError> {
                validate_wager(amount, min_bet, account.available())?;
                let result = self.draw(resolve)?;
                account.apply_delta(net_of(&result))?;
                Ok((result, account.clone()))
            })
    }

    pub fn roulette_bet(
        &self,
        player: &str,
        name: &str,
        amount: Coins,
        category: BetCategory,
        number: Option<u8>,
    ) -> CasinoResult {
        let bet = RouletteBet::from_category(category, number)?;
        let (result, account) = self.wager(
            player,
            name,
            amount,
            |rng| roulette::play(bet, amount, rng),
            |r: &RouletteResult| r.net,
        )?;
        self.settle(player, GameType::Roulette, amount, result.outcome(), result.net)?;

        let verdict = if result.won {
            format!(
                "You won {} coins! (x{} payout)",
                format_coins(result.credited()),
                bet.multiplier()
            )
        } else {
            format!("You lost {} coins.", format_coins(amount))
        };
        Ok(CommandOutcome::success()
            .with_tag(result.outcome())
            .with_balance(account.balance(), result.net)
            .field("Result", result.spin.to_string())
            .field(
                "Your Bet",
                format!("{} coins on {}", format_coins(amount), bet),
            )
            .field("Outcome", verdict)
            .field("Balance", format!("{} coins", format_coins(account.balance()))))
    }

    pub fn slots_spin(&self, player: &str, name: &str, amount: Coins) -> CasinoResult {
        let (result, account) = self.wager(
            player,
            name,
            amount,
            |rng| slots::play(amount, rng),
            |r: &SlotsResult| r.net,
        )?;
        self.settle(player, GameType::Slots, amount, result.outcome, result.net)?;

        let verdict = match result.multiplier {
            Some(multiplier) => format!(
                "Three of a kind! x{} pays {} coins.",
                multiplier,
                format_coins(result.win_amount)
            ),
            None => format!("No match. You lost {} coins.", format_coins(amount)),
        };
        Ok(CommandOutcome::success()
            .with_tag(result.outcome)
            .with_balance(account.balance(), result.net)
            .field("Reels", result.reels.to_string())
            .field("Your Bet", format!("{} coins", format_coins(amount)))
            .field("Outcome", verdict)
            .field("Balance", format!("{} coins", format_coins(account.balance()))))
    }

    pub fn blackjack_start(&self, player: &str, name: &str, amount: Coins) -> CasinoResult {
        if let Some(expired) = self.sessions.take_expired(player)? {
            self.release_stake(player, expired.bet)?;
            tracing::info!(player_id = %player, bet = expired.bet, "stale blackjack hand cleared, bet returned");
        }
        if self.sessions.has_session(player)? {
            return Err(SessionError::Conflict(player.to_string()).into());
        }

        let min_bet = self.settings.min_bet;
        self.accounts
            .upsert(player, name, |account| -> Result<(), CasinoError> {
                validate_wager(amount, min_bet, account.available())?;
                // a natural must still fit once the hand pays out
                let best = BlackjackOutcome::Blackjack.net(amount);
                if account.balance().checked_add(best).is_none() {
                    return Err(AccountError::BalanceOverflow {
                        balance: account.balance(),
                        delta: best,
                    }
                    .into());
                }
                account.reserve(amount);
                Ok(())
            })?;

        let started = self
            .draw(|rng| BlackjackGame::start(amount, rng))
            .map_err(CasinoError::from)
            .and_then(|game| self.sessions.start(player, game).map_err(CasinoError::from));

        match started {
            Ok(SessionUpdate::Continuing(game)) => Ok(self.render_turn(&game)),
            Ok(SessionUpdate::Resolved(game)) => self.settle_blackjack(player, &game),
            Ok(SessionUpdate::TimedOut { .. }) => {
                self.release_stake(player, amount)?;
                Err(CasinoError::Invariant(
                    "fresh blackjack session reported a timeout".to_string(),
                ))
            }
            Err(err) => {
                self.release_stake(player, amount)?;
                Err(err)
            }
        }
    }

    pub fn blackjack_action(&self, player: &str, action: BlackjackAction) -> CasinoResult {
        match self.sessions.act(player, action)? {
            SessionUpdate::Continuing(game) => Ok(self.render_turn(&game)),
            SessionUpdate::Resolved(game) => self.settle_blackjack(player, &game),
            SessionUpdate::TimedOut { bet } => {
                let account = self.release_stake(player, bet)?;
                Ok(CommandOutcome::success()
                    .with_tag("timed_out")
                    .with_balance(account.balance(), 0)
                    .field(
                        "Time's Up",
                        format!(
                            "You took too long to act. The game was cancelled and your {} coin bet was returned.",
                            format_coins(bet)
                        ),
                    ))
            }
        }
    }

    fn release_stake(&self, player: &str, amount: Coins) -> Result<Account, CasinoError> {
        Ok(self.accounts.update(player, |account| -> Result<_, CasinoError> {
            account.release(amount)?;
            Ok(account.clone())
        })?)
    }

    fn render_turn(&self, game: &BlackjackGame) -> CommandOutcome {
        CommandOutcome::success()
            .with_tag("in_progress")
            .field("Your Bet", format!("{} coins", format_coins(game.bet())))
            .field("Your Hand", game.player_hand().to_string())
            .field("Dealer's Hand", game.dealer_hand().masked())
            .field("Actions", "hit or stand")
    }

    /// Releases the reservation and applies the result in one update, then
    /// records the hand. A payout the balance cannot hold voids the hand with
    /// the stake returned.
    fn settle_blackjack(&self, player: &str, game: &BlackjackGame) -> CasinoResult {
        let outcome = game.outcome().ok_or_else(|| {
            CasinoError::Invariant("settling an unresolved blackjack hand".to_string())
        })?;
        let bet = game.bet();
        let net = outcome.net(bet);
        let account = self.accounts.update(player, |account| -> Result<_, CasinoError> {
            account.release(bet)?;
            account.apply_delta(net)?;
            Ok(account.clone())
        })?;
        self.settle(player, GameType::Blackjack, bet, outcome.game_outcome(), net)?;

        let verdict = match outcome {
            BlackjackOutcome::Blackjack => format!(
                "Blackjack! You win {} coins!",
                format_coins(outcome.credit(bet))
            ),
            BlackjackOutcome::Win if game.dealer_hand().is_bust() => format!(
                "Dealer busts! You win {} coins!",
                format_coins(outcome.credit(bet))
            ),
            BlackjackOutcome::Win => format!("You win {} coins!", format_coins(outcome.credit(bet))),
            BlackjackOutcome::Push => "Push. Your bet is returned.".to_string(),
            BlackjackOutcome::Loss if game.player_hand().is_bust() => {
                format!("Bust! You lose {} coins.", format_coins(bet))
            }
            BlackjackOutcome::Loss => format!("Dealer wins. You lose {} coins.", format_coins(bet)),
        };
        Ok(CommandOutcome::success()
            .with_tag(outcome.game_outcome())
            .with_balance(account.balance(), net)
            .field("Your Hand", game.player_hand().to_string())
            .field("Dealer's Hand", game.dealer_hand().to_string())
            .field("Result", verdict)
            .field("Balance", format!("{} coins", format_coins(account.balance()))))
    }

    pub fn leaderboard(&self, limit: Option<usize>, scope: LeaderboardScope) -> CasinoResult {
        let limit = limit.unwrap_or(self.settings.leaderboard_limit);
        if limit == 0 {
            return Err(CasinoError::validation("Leaderboard limit must be at least 1!"));
        }
        let top = self.accounts.top_by_balance(limit)?;
        let mut outcome = CommandOutcome::success()
            .with_tag("leaderboard")
            .field("Title", scope.title());
        if top.is_empty() {
            return Ok(outcome.field("Leaderboard", "Nobody has played yet."));
        }
        for (rank, account) in top.iter().enumerate() {
            outcome = outcome.field(format!("#{} {}", rank + 1, account.display_name()), standing(account));
        }
        Ok(outcome)
    }

    pub fn history(&self, player: &str, limit: Option<usize>) -> CasinoResult {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit == 0 {
            return Err(CasinoError::validation("History limit must be at least 1!"));
        }
        let account = self.accounts.require(player)?;
        let entries = self.ledger.history(player, limit)?;
        let mut outcome = CommandOutcome::success()
            .with_tag("history")
            .with_balance(account.balance(), 0);
        if entries.is_empty() {
            return Ok(outcome.field("History", "No games played yet."));
        }
        for entry in &entries {
            outcome = outcome.field(
                format!("#{} {}", entry.id, entry.game),
                format!(
                    "{} on {} coins, net {:+} ({})",
                    entry.outcome,
                    format_coins(entry.bet_amount),
                    entry.net_win_amount,
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                ),
            );
        }
        Ok(outcome)
    }

    fn require_admin(&self, actor: &str) -> Result<(), CasinoError> {
        let flagged = self
            .accounts
            .get(actor)?
            .is_some_and(|account| account.is_admin());
        if flagged || self.settings.is_listed_admin(actor) {
            Ok(())
        } else {
            tracing::warn!(player_id = %actor, "admin command refused");
            Err(CasinoError::PermissionDenied(actor.to_string()))
        }
    }

    pub fn admin_give(&self, actor: &str, target: &str, amount: Coins) -> CasinoResult {
        self.require_admin(actor)?;
        if amount < 1 {
            return Err(CasinoError::validation("Amount must be at least 1 coin!"));
        }
        let account = self
            .accounts
            .upsert(target, target, |account| -> Result<_, CasinoError> {
                account.apply_delta(amount)?;
                Ok(account.clone())
            })?;
        tracing::info!(admin = %actor, target = %target, amount, "admin gave coins");
        Ok(CommandOutcome::success()
            .with_tag("admin_give")
            .with_balance(account.balance(), amount)
            .field(
                "Coins Added",
                format!(
                    "Gave {} coins to {}. New balance: {} coins.",
                    format_coins(amount),
                    account.display_name(),
                    format_coins(account.balance())
                ),
            ))
    }

    pub fn admin_take(&self, actor: &str, target: &str, amount: Coins) -> CasinoResult {
        self.require_admin(actor)?;
        if amount < 1 {
            return Err(CasinoError::validation("Amount must be at least 1 coin!"));
        }
        let account = self
            .accounts
            .update(target, |account| -> Result<_, CasinoError> {
                if account.available() < amount {
                    return Err(AccountError::InsufficientFunds {
                        requested: amount,
                        available: account.available(),
                    }
                    .into());
                }
                account.apply_delta(-amount)?;
                Ok(account.clone())
            })?;
        tracing::info!(admin = %actor, target = %target, amount, "admin took coins");
        Ok(CommandOutcome::success()
            .with_tag("admin_take")
            .with_balance(account.balance(), -amount)
            .field(
                "Coins Removed",
                format!(
                    "Took {} coins from {}. New balance: {} coins.",
                    format_coins(amount),
                    account.display_name(),
                    format_coins(account.balance())
                ),
            ))
    }

    pub fn admin_reset(&self, actor: &str, target: &str, amount: Option<Coins>) -> CasinoResult {
        self.require_admin(actor)?;
        let amount = amount.unwrap_or(self.settings.reset_balance);
        if amount < 0 {
            return Err(CasinoError::validation("Balance cannot be negative!"));
        }
        let (account, delta) = self
            .accounts
            .upsert(target, target, |account| -> Result<_, CasinoError> {
                if amount < account.reserved() {
                    return Err(CasinoError::validation(format!(
                        "{} has {} coins riding on a blackjack hand.",
                        account.display_name(),
                        format_coins(account.reserved())
                    )));
                }
                let delta = amount - account.balance();
                account.apply_delta(delta)?;
                Ok((account.clone(), delta))
            })?;
        tracing::info!(admin = %actor, target = %target, amount, "admin reset balance");
        Ok(CommandOutcome::success()
            .with_tag("admin_reset")
            .with_balance(account.balance(), delta)
            .field(
                "Balance Reset",
                format!(
                    "{}'s balance was reset to {} coins.",
                    account.display_name(),
                    format_coins(amount)
                ),
            ))
    }

    pub fn admin_stats(&self, actor: &str) -> CasinoResult {
        self.require_admin(actor)?;
        let today = self.clock.now().date();
        let mut outcome = CommandOutcome::success()
            .with_tag("admin_stats")
            .field("Total Users", format_coins(self.accounts.total_users()? as Coins))
            .field(
                "Total Coins",
                format_coins(self.accounts.total_coins()?),
            )
            .field(
                "Games Today",
                format_coins(self.ledger.games_played_on(today)? as Coins),
            );
        for (rank, account) in self.accounts.top_by_balance(ADMIN_STATS_TOP)?.iter().enumerate() {
            outcome = outcome.field(
                format!("Top #{} {}", rank + 1, account.display_name()),
                format!("{} coins", format_coins(account.balance())),
            );
        }
        Ok(outcome)
    }

    /// Drops blackjack hands whose turn deadline passed and hands their
    /// stakes back.
    pub fn expire_idle_sessions(&self) -> Vec<ExpiredSession> {
        let expired = self.sessions.cleanup_expired_sessions();
        for session in &expired {
            match self.release_stake(&session.player_id, session.bet) {
                Ok(_) => tracing::info!(
                    player_id = %session.player_id,
                    bet = session.bet,
                    "blackjack hand abandoned, bet returned"
                ),
                Err(err) => tracing::error!(
                    player_id = %session.player_id,
                    error = %err,
                    "failed to release abandoned blackjack stake"
                ),
            }
        }
        expired
    }

    /// Expires idle sessions every `every` and forwards each one to `notify`.
    /// Stops once the receiver is dropped.
    pub fn spawn_reaper(
        self: Arc<Self>,
        every: Duration,
        notify: mpsc::UnboundedSender<ExpiredSession>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for session in self.expire_idle_sessions() {
                    if notify.send(session).is_err() {
                        tracing::debug!("reaper listener gone, stopping");
                        return;
                    }
                }
                if notify.is_closed() {
                    return;
                }
            }
        })
    }
}

fn standing(account: &Account) -> String {
    let balance = format!("{} coins", format_coins(account.balance()));
    if account.games_played() == 0 {
        return balance;
    }
    format!(
        "{} | {}/{} wins ({})",
        balance,
        account.games_won(),
        account.games_played(),
        account.win_rate()
    )
}
