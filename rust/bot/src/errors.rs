//! Error classification for command results.
//!
//! Every component error folds into [`CasinoError`], which the facade turns
//! into a failed [`CommandOutcome`] through [`IntoErrorResponse`]. Player
//! mistakes log at debug, broken internals at error.

use crate::accounts::{AccountError, PlayerId};
use crate::commands::CommandOutcome;
use crate::ledger::LedgerError;
use crate::session::SessionError;
use crate::settings::SettingsError;
use casino_engine::errors::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure class carried in a [`CommandOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InsufficientFunds,
    UnknownPlayer,
    SessionConflict,
    NoActiveSession,
    PermissionDenied,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::UnknownPlayer => "unknown_player",
            ErrorKind::SessionConflict => "session_conflict",
            ErrorKind::NoActiveSession => "no_active_session",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Internal => "internal",
        })
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Player input was rejected; nothing changed.
    Client,
    /// Something inside the casino failed.
    Server,
    /// Shared state is unusable.
    Critical,
}

/// Converts an error into the failure shape returned to the player, logging
/// it on the way out.
pub trait IntoErrorResponse {
    fn error_kind(&self) -> ErrorKind;

    fn error_message(&self) -> String;

    fn severity(&self) -> ErrorSeverity {
        match self.error_kind() {
            ErrorKind::Internal => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }

    fn into_outcome(self) -> CommandOutcome
    where
        Self: Sized,
    {
        let kind = self.error_kind();
        let message = self.error_message();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::debug!(error_kind = %kind, message = %message, "command rejected")
            }
            ErrorSeverity::Server => {
                tracing::error!(error_kind = %kind, message = %message, "command failed")
            }
            ErrorSeverity::Critical => tracing::error!(
                error_kind = %kind,
                message = %message,
                critical = true,
                "command failed on corrupted state"
            ),
        }
        CommandOutcome::failure(kind, message)
    }
}

#[derive(Debug, Error)]
pub enum CasinoError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} is not allowed to use admin commands")]
    PermissionDenied(PlayerId),
    #[error("Invariant violated: {0}")]
    Invariant(String),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl CasinoError {
    pub fn validation(message: impl Into<String>) -> Self {
        CasinoError::Validation(message.into())
    }
}

fn game_error_kind(err: &GameError) -> ErrorKind {
    match err {
        GameError::InvalidBetAmount { .. }
        | GameError::AmountTooLarge { .. }
        | GameError::InvalidPocket(_)
        | GameError::MissingNumber => ErrorKind::Validation,
        GameError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
        GameError::HandAlreadyComplete => ErrorKind::NoActiveSession,
        GameError::DeckExhausted | GameError::DuplicateCard(_) => ErrorKind::Internal,
    }
}

impl IntoErrorResponse for CasinoError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            CasinoError::Validation(_) => ErrorKind::Validation,
            CasinoError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CasinoError::Game(err) => game_error_kind(err),
            CasinoError::Account(AccountError::UnknownPlayer(_)) => ErrorKind::UnknownPlayer,
            CasinoError::Account(AccountError::InsufficientFunds { .. }) => {
                ErrorKind::InsufficientFunds
            }
            CasinoError::Account(AccountError::BalanceOverflow { .. }) => ErrorKind::Validation,
            CasinoError::Account(AccountError::StakeMismatch { .. })
            | CasinoError::Account(AccountError::StoragePoisoned) => ErrorKind::Internal,
            CasinoError::Session(SessionError::NotFound(_)) => ErrorKind::NoActiveSession,
            CasinoError::Session(SessionError::Conflict(_)) => ErrorKind::SessionConflict,
            CasinoError::Session(SessionError::Game(err)) => game_error_kind(err),
            CasinoError::Session(SessionError::StoragePoisoned) => ErrorKind::Internal,
            CasinoError::Invariant(_) | CasinoError::Ledger(_) | CasinoError::Settings(_) => {
                ErrorKind::Internal
            }
        }
    }

    fn error_message(&self) -> String {
        match self {
            CasinoError::Game(GameError::InvalidBetAmount { minimum, .. }) => {
                format!("Minimum bet is {minimum} coins!")
            }
            CasinoError::Game(GameError::AmountTooLarge { maximum, .. }) => {
                format!("Maximum bet is {maximum} coins!")
            }
            CasinoError::Account(AccountError::BalanceOverflow { .. }) => {
                "That amount would overflow the balance.".to_string()
            }
            CasinoError::Game(GameError::InsufficientFunds { available, .. })
            | CasinoError::Account(AccountError::InsufficientFunds { available, .. }) => {
                format!("Insufficient funds! You have {available} coins available.")
            }
            CasinoError::Account(AccountError::UnknownPlayer(_)) => {
                "Player not found in the casino system!".to_string()
            }
            CasinoError::Session(SessionError::NotFound(_)) => {
                "You don't have an active blackjack game!".to_string()
            }
            CasinoError::Session(SessionError::Conflict(_)) => {
                "You already have an active blackjack game!".to_string()
            }
            other => other.to_string(),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            CasinoError::Account(AccountError::StoragePoisoned)
            | CasinoError::Session(SessionError::StoragePoisoned)
            | CasinoError::Ledger(LedgerError::StoragePoisoned) => ErrorSeverity::Critical,
            _ if self.error_kind() == ErrorKind::Internal => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}
