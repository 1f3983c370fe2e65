//! Three-reel slot machine. Only three of a kind pays; there is no partial
//! match payout, and a winning line replaces the stake rather than adding
//! to it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GameError;
use crate::outcome::GameOutcome;
use crate::rng::RandomSource;
use crate::rules::MAX_BET;
use crate::Coins;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Cherries,
    Lemon,
    Orange,
    Grapes,
    Bell,
    Diamond,
    Seven,
}

impl Symbol {
    pub const ALL: [Symbol; 7] = [
        Symbol::Cherries,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Grapes,
        Symbol::Bell,
        Symbol::Diamond,
        Symbol::Seven,
    ];

    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Cherries => "🍒",
            Symbol::Lemon => "🍋",
            Symbol::Orange => "🍊",
            Symbol::Grapes => "🍇",
            Symbol::Bell => "🔔",
            Symbol::Diamond => "💎",
            Symbol::Seven => "7️⃣",
        }
    }

    /// Multiplier and tier paid for three of this symbol.
    pub fn triple_payout(self) -> (Coins, GameOutcome) {
        match self {
            Symbol::Cherries => (5, GameOutcome::SmallWin),
            Symbol::Lemon => (8, GameOutcome::SmallWin),
            Symbol::Orange => (10, GameOutcome::MediumWin),
            Symbol::Grapes => (15, GameOutcome::MediumWin),
            Symbol::Bell => (20, GameOutcome::BigWin),
            Symbol::Diamond => (30, GameOutcome::BigWin),
            Symbol::Seven => (50, GameOutcome::Jackpot),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reels(pub [Symbol; 3]);

impl Reels {
    pub fn triple(&self) -> Option<Symbol> {
        let [a, b, c] = self.0;
        (a == b && b == c).then_some(a)
    }
}

impl fmt::Display for Reels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "| {} | {} | {} |", a.glyph(), b.glyph(), c.glyph())
    }
}

pub fn spin_reels(rng: &mut dyn RandomSource) -> Reels {
    let mut pick = || Symbol::ALL[rng.draw(Symbol::ALL.len() as u32) as usize];
    Reels([pick(), pick(), pick()])
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotsResult {
    pub reels: Reels,
    pub amount: Coins,
    pub outcome: GameOutcome,
    pub multiplier: Option<Coins>,
    /// `amount * multiplier` on a winning line, 0 otherwise.
    pub win_amount: Coins,
    /// Balance change: `win_amount - amount`.
    pub net: Coins,
}

/// # Errors
///
/// [`GameError::AmountTooLarge`] when a winning line would not fit in [`Coins`].
pub fn resolve(reels: Reels, amount: Coins) -> Result<SlotsResult, GameError> {
    let result = match reels.triple().map(Symbol::triple_payout) {
        Some((multiplier, outcome)) => {
            let win_amount = amount
                .checked_mul(multiplier)
                .ok_or(GameError::AmountTooLarge {
                    amount,
                    maximum: MAX_BET,
                })?;
            SlotsResult {
                reels,
                amount,
                outcome,
                multiplier: Some(multiplier),
                win_amount,
                net: win_amount - amount,
            }
        }
        None => SlotsResult {
            reels,
            amount,
            outcome: GameOutcome::NoMatch,
            multiplier: None,
            win_amount: 0,
            net: -amount,
        },
    };
    Ok(result)
}

pub fn play(amount: Coins, rng: &mut dyn RandomSource) -> Result<SlotsResult, GameError> {
    resolve(spin_reels(rng), amount)
}
