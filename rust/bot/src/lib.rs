//! # casino-bot: virtual casino economy
//!
//! The chat-facing half of the casino. A [`Casino`] owns the account store,
//! the wager ledger and the blackjack session table, and turns each
//! [`CommandRequest`] into a [`CommandOutcome`] that a chat adapter renders.
//!
//! ```
//! use casino_bot::{AppSettings, Casino, Command, CommandRequest};
//! use casino_bot::clock::SystemClock;
//! use casino_engine::rng::ScriptedSource;
//! use std::sync::Arc;
//!
//! let casino = Casino::with_dependencies(
//!     AppSettings::default(),
//!     Box::new(ScriptedSource::with_draws([0, 0, 0])),
//!     Arc::new(SystemClock),
//! )
//! .unwrap();
//!
//! // three cherries pay 5x
//! let outcome = casino.execute(CommandRequest::new("42", Command::Slots { amount: 100 }));
//! assert_eq!(outcome.balance_after, Some(10_400));
//! ```

pub mod accounts;
pub mod casino;
pub mod clock;
pub mod commands;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod session;
pub mod settings;

pub use accounts::{Account, AccountError, AccountStore, DailyClaim, PlayerId};
pub use casino::Casino;
pub use commands::{Command, CommandOutcome, CommandRequest, LeaderboardScope, NarrativeField};
pub use errors::{CasinoError, ErrorKind, ErrorSeverity, IntoErrorResponse};
pub use ledger::{Ledger, LedgerEntry, LedgerError, LedgerStats, Wager};
pub use logging::{LogEntry, LogFormat, TestLogSubscriber, init_logging, init_test_logging};
pub use session::{ExpiredSession, SessionError, SessionManager, SessionUpdate};
pub use settings::{AppSettings, ConfigSources, SettingsError, SettingsResolved, ValueSource};
