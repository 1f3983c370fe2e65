use serde::{Deserialize, Serialize};
use std::fmt;

/// The three tables the casino runs.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Roulette,
    Blackjack,
    Slots,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameType::Roulette => "roulette",
            GameType::Blackjack => "blackjack",
            GameType::Slots => "slots",
        })
    }
}

/// Result tag recorded for a resolved wager, shared across all tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Win,
    Loss,
    Push,
    Blackjack,
    NoMatch,
    SmallWin,
    MediumWin,
    BigWin,
    Jackpot,
}

impl GameOutcome {
    /// Whether the outcome counts towards a player's `games_won`.
    pub fn is_win(self) -> bool {
        match self {
            GameOutcome::Win
            | GameOutcome::Blackjack
            | GameOutcome::SmallWin
            | GameOutcome::MediumWin
            | GameOutcome::BigWin
            | GameOutcome::Jackpot => true,
            GameOutcome::Loss | GameOutcome::Push | GameOutcome::NoMatch => false,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameOutcome::Win => "win",
            GameOutcome::Loss => "loss",
            GameOutcome::Push => "push",
            GameOutcome::Blackjack => "blackjack",
            GameOutcome::NoMatch => "no_match",
            GameOutcome::SmallWin => "small_win",
            GameOutcome::MediumWin => "medium_win",
            GameOutcome::BigWin => "big_win",
            GameOutcome::Jackpot => "jackpot",
        })
    }
}
