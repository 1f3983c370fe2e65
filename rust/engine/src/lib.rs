//! # casino-engine: game resolution core
//!
//! Stateless resolvers for the casino's three tables plus the blackjack
//! state machine. Every random draw goes through a [`rng::RandomSource`], so
//! a table can run on a seeded ChaCha stream or on scripted results.
//!
//! ## Core Modules
//!
//! - [`cards`] - Suit, Rank and Card with blackjack values
//! - [`deck`] - 52-card deck, shuffled or stacked
//! - [`rng`] - Seeded and scripted randomness sources
//! - [`hand`] - Blackjack hand valuation with soft-ace demotion
//! - [`blackjack`] - Deal / hit / stand state machine and payouts
//! - [`roulette`] - Bet categories, wheel colours and payouts
//! - [`slots`] - Reel symbols and the three-of-a-kind pay table
//! - [`rules`] - Stake validation shared by all tables
//! - [`outcome`] - Game and outcome tags recorded in the ledger
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use casino_engine::rng::ScriptedSource;
//! use casino_engine::roulette::{self, BetCategory, RouletteBet};
//!
//! // Force the wheel onto 1 (red) and bet 100 on red
//! let mut rng = ScriptedSource::with_draws([1]);
//! let bet = RouletteBet::from_category(BetCategory::Red, None).unwrap();
//! let result = roulette::play(bet, 100, &mut rng).unwrap();
//!
//! assert!(result.won);
//! assert_eq!(result.net, 100);
//! ```

pub mod blackjack;
pub mod cards;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod outcome;
pub mod rng;
pub mod roulette;
pub mod rules;
pub mod slots;

/// Casino currency. Signed so that deltas and balances share one type.
pub type Coins = i64;
