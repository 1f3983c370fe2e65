use crate::accounts::PlayerId;
use casino_engine::blackjack::{BlackjackAction, BlackjackGame};
use casino_engine::errors::GameError;
use casino_engine::Coins;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// A live blackjack hand waiting on its player.
#[derive(Debug, Clone)]
pub struct BlackjackSession {
    player_id: PlayerId,
    game: BlackjackGame,
    deadline: Instant,
}

impl BlackjackSession {
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn game(&self) -> &BlackjackGame {
        &self.game
    }

    pub fn bet(&self) -> Coins {
        self.game.bet()
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Where a hand stands after a start or an action.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// The player must act again before the deadline.
    Continuing(BlackjackGame),
    /// The hand is settled and the session is gone.
    Resolved(BlackjackGame),
    /// The deadline passed first; the stake goes back untouched.
    TimedOut { bet: Coins },
}

/// A session dropped by the reaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredSession {
    pub player_id: PlayerId,
    pub bet: Coins,
}

/// Blackjack sessions keyed by player, at most one each. Membership checks
/// and inserts happen under one lock.
#[derive(Debug)]
pub struct SessionManager {
    sessions: Mutex<HashMap<PlayerId, BlackjackSession>>,
    timeout: Duration,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TURN_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PlayerId, BlackjackSession>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::StoragePoisoned)
    }

    pub fn has_session(&self, player_id: &str) -> Result<bool, SessionError> {
        Ok(self.lock()?.contains_key(player_id))
    }

    pub fn active_sessions(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    /// Registers a freshly dealt game. A game that resolved on the deal is
    /// handed straight back without ever being stored.
    pub fn start(&self, player_id: &str, game: BlackjackGame) -> Result<SessionUpdate, SessionError> {
        let mut sessions = self.lock()?;
        if sessions.contains_key(player_id) {
            return Err(SessionError::Conflict(player_id.to_string()));
        }
        if game.is_over() {
            return Ok(SessionUpdate::Resolved(game));
        }

        sessions.insert(
            player_id.to_string(),
            BlackjackSession {
                player_id: player_id.to_string(),
                game: game.clone(),
                deadline: Instant::now() + self.timeout,
            },
        );
        tracing::info!(
            player_id = %player_id,
            bet = game.bet(),
            "blackjack session started"
        );
        Ok(SessionUpdate::Continuing(game))
    }

    /// Applies a hit or stand. Acting after the deadline discards the
    /// session instead.
    pub fn act(&self, player_id: &str, action: BlackjackAction) -> Result<SessionUpdate, SessionError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(player_id)
            .ok_or_else(|| SessionError::NotFound(player_id.to_string()))?;

        if session.is_expired(Instant::now()) {
            let bet = session.bet();
            sessions.remove(player_id);
            tracing::info!(player_id = %player_id, bet, "blackjack session timed out");
            return Ok(SessionUpdate::TimedOut { bet });
        }

        session.game.apply(action)?;
        if session.game.is_over() {
            let game = session.game.clone();
            sessions.remove(player_id);
            tracing::debug!(
                player_id = %player_id,
                action = ?action,
                outcome = ?game.outcome(),
                "blackjack session resolved"
            );
            return Ok(SessionUpdate::Resolved(game));
        }

        session.deadline = Instant::now() + self.timeout;
        Ok(SessionUpdate::Continuing(session.game.clone()))
    }

    /// Removes `player_id`'s session if its deadline has passed, so a new
    /// hand can be dealt without waiting for the next sweep.
    pub fn take_expired(&self, player_id: &str) -> Result<Option<ExpiredSession>, SessionError> {
        let mut sessions = self.lock()?;
        let expired = sessions
            .get(player_id)
            .is_some_and(|session| session.is_expired(Instant::now()));
        if !expired {
            return Ok(None);
        }
        Ok(sessions.remove(player_id).map(|session| {
            tracing::info!(player_id = %player_id, bet = session.bet(), "blackjack session timed out");
            ExpiredSession {
                player_id: session.player_id,
                bet: session.game.bet(),
            }
        }))
    }

    /// Drops every session whose deadline has passed.
    pub fn cleanup_expired_sessions(&self) -> Vec<ExpiredSession> {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.retain(|id, session| {
            if session.is_expired(now) {
                expired.push(ExpiredSession {
                    player_id: id.clone(),
                    bet: session.bet(),
                });
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expired idle blackjack sessions");
        }
        expired
    }

    #[cfg(test)]
    pub(crate) fn force_deadline(&self, player_id: &str, deadline: Instant) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some(session) = sessions.get_mut(player_id) {
                session.deadline = deadline;
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active blackjack game for {0}")]
    NotFound(PlayerId),
    #[error("{0} already has a blackjack game in progress")]
    Conflict(PlayerId),
    #[error("Session storage poisoned")]
    StoragePoisoned,
    #[error(transparent)]
    Game(#[from] GameError),
}
