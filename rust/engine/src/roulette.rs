//! Single-zero roulette.
//!
//! One spin draws a pocket uniformly from 0..=36. Zero is green and loses
//! every outside bet (even, column three, ...); only a straight-up bet on 0
//! collects on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GameError;
use crate::outcome::GameOutcome;
use crate::rng::RandomSource;
use crate::rules::MAX_BET;
use crate::Coins;

pub const POCKETS: u32 = 37;
pub const MAX_POCKET: u8 = 36;

pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];
pub const BLACK_NUMBERS: [u8; 18] = [2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35];

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl Color {
    pub fn of(pocket: u8) -> Color {
        if RED_NUMBERS.contains(&pocket) {
            Color::Red
        } else if BLACK_NUMBERS.contains(&pocket) {
            Color::Black
        } else {
            Color::Green
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Color::Red => "🔴",
            Color::Black => "⚫",
            Color::Green => "🟢",
        }
    }
}

/// Wire names accepted for a roulette bet, as offered by the command layer.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum BetCategory {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "red")]
    Red,
    #[serde(rename = "black")]
    Black,
    #[serde(rename = "even")]
    Even,
    #[serde(rename = "odd")]
    Odd,
    #[serde(rename = "1-18", alias = "low")]
    Low,
    #[serde(rename = "19-36", alias = "high")]
    High,
    #[serde(rename = "1st dozen")]
    FirstDozen,
    #[serde(rename = "2nd dozen")]
    SecondDozen,
    #[serde(rename = "3rd dozen")]
    ThirdDozen,
    #[serde(rename = "1st column")]
    FirstColumn,
    #[serde(rename = "2nd column")]
    SecondColumn,
    #[serde(rename = "3rd column")]
    ThirdColumn,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Third {
    First,
    Second,
    Third,
}

/// A fully validated roulette bet.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouletteBet {
    Straight(u8),
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
    Dozen(Third),
    Column(Third),
}

impl RouletteBet {
    /// Builds a bet from its category and, for straight-up bets, the chosen
    /// pocket. A number given with any other category is ignored.
    pub fn from_category(category: BetCategory, number: Option<u8>) -> Result<Self, GameError> {
        if let Some(n) = number {
            if n > MAX_POCKET {
                return Err(GameError::InvalidPocket(n));
            }
        }
        Ok(match category {
            BetCategory::Number => RouletteBet::Straight(number.ok_or(GameError::MissingNumber)?),
            BetCategory::Red => RouletteBet::Red,
            BetCategory::Black => RouletteBet::Black,
            BetCategory::Even => RouletteBet::Even,
            BetCategory::Odd => RouletteBet::Odd,
            BetCategory::Low => RouletteBet::Low,
            BetCategory::High => RouletteBet::High,
            BetCategory::FirstDozen => RouletteBet::Dozen(Third::First),
            BetCategory::SecondDozen => RouletteBet::Dozen(Third::Second),
            BetCategory::ThirdDozen => RouletteBet::Dozen(Third::Third),
            BetCategory::FirstColumn => RouletteBet::Column(Third::First),
            BetCategory::SecondColumn => RouletteBet::Column(Third::Second),
            BetCategory::ThirdColumn => RouletteBet::Column(Third::Third),
        })
    }

    /// Payout odds, X in X:1.
    pub fn multiplier(self) -> Coins {
        match self {
            RouletteBet::Straight(_) => 35,
            RouletteBet::Red
            | RouletteBet::Black
            | RouletteBet::Even
            | RouletteBet::Odd
            | RouletteBet::Low
            | RouletteBet::High => 1,
            RouletteBet::Dozen(_) | RouletteBet::Column(_) => 2,
        }
    }

    pub fn wins(self, pocket: u8) -> bool {
        match self {
            RouletteBet::Straight(n) => n == pocket,
            RouletteBet::Red => Color::of(pocket) == Color::Red,
            RouletteBet::Black => Color::of(pocket) == Color::Black,
            RouletteBet::Even => pocket != 0 && pocket % 2 == 0,
            RouletteBet::Odd => pocket % 2 == 1,
            RouletteBet::Low => (1..=18).contains(&pocket),
            RouletteBet::High => (19..=36).contains(&pocket),
            RouletteBet::Dozen(Third::First) => (1..=12).contains(&pocket),
            RouletteBet::Dozen(Third::Second) => (13..=24).contains(&pocket),
            RouletteBet::Dozen(Third::Third) => (25..=36).contains(&pocket),
            RouletteBet::Column(Third::First) => pocket % 3 == 1,
            RouletteBet::Column(Third::Second) => pocket % 3 == 2,
            RouletteBet::Column(Third::Third) => pocket != 0 && pocket % 3 == 0,
        }
    }
}

impl fmt::Display for RouletteBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouletteBet::Straight(n) => write!(f, "number {}", n),
            RouletteBet::Red => f.write_str("red"),
            RouletteBet::Black => f.write_str("black"),
            RouletteBet::Even => f.write_str("even"),
            RouletteBet::Odd => f.write_str("odd"),
            RouletteBet::Low => f.write_str("1-18"),
            RouletteBet::High => f.write_str("19-36"),
            RouletteBet::Dozen(Third::First) => f.write_str("1st dozen"),
            RouletteBet::Dozen(Third::Second) => f.write_str("2nd dozen"),
            RouletteBet::Dozen(Third::Third) => f.write_str("3rd dozen"),
            RouletteBet::Column(Third::First) => f.write_str("1st column"),
            RouletteBet::Column(Third::Second) => f.write_str("2nd column"),
            RouletteBet::Column(Third::Third) => f.write_str("3rd column"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub pocket: u8,
    pub color: Color,
}

impl Spin {
    pub fn landed(pocket: u8) -> Self {
        Self {
            pocket,
            color: Color::of(pocket),
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.color.emoji();
        write!(f, "{} **{}** {}", e, self.pocket, e)
    }
}

pub fn spin(rng: &mut dyn RandomSource) -> Spin {
    // draw() < 37 always fits in u8
    Spin::landed(rng.draw(POCKETS) as u8)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct RouletteResult {
    pub bet: RouletteBet,
    pub amount: Coins,
    pub spin: Spin,
    pub won: bool,
    /// Balance change: `amount * multiplier` on a win, `-amount` otherwise.
    pub net: Coins,
}

impl RouletteResult {
    pub fn outcome(&self) -> GameOutcome {
        if self.won {
            GameOutcome::Win
        } else {
            GameOutcome::Loss
        }
    }

    /// Total credited on a win, returned stake included.
    pub fn credited(&self) -> Coins {
        if self.won {
            self.amount + self.net
        } else {
            0
        }
    }
}

/// Settles `bet` against a pocket that has already been drawn.
///
/// # Errors
///
/// [`GameError::AmountTooLarge`] when the payout would not fit in [`Coins`].
pub fn resolve(bet: RouletteBet, amount: Coins, spin: Spin) -> Result<RouletteResult, GameError> {
    let won = bet.wins(spin.pocket);
    let net = if won {
        // stake plus winnings must fit, so `credited` cannot overflow either
        amount
            .checked_mul(bet.multiplier() + 1)
            .map(|total| total - amount)
            .ok_or(GameError::AmountTooLarge {
                amount,
                maximum: MAX_BET,
            })?
    } else {
        -amount
    };
    Ok(RouletteResult {
        bet,
        amount,
        spin,
        won,
        net,
    })
}

/// Spins once and settles the bet.
pub fn play(
    bet: RouletteBet,
    amount: Coins,
    rng: &mut dyn RandomSource,
) -> Result<RouletteResult, GameError> {
    resolve(bet, amount, spin(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_partition_the_wheel() {
        let red = (0..=MAX_POCKET).filter(|&n| Color::of(n) == Color::Red).count();
        let black = (0..=MAX_POCKET).filter(|&n| Color::of(n) == Color::Black).count();
        assert_eq!((red, black), (18, 18));
        assert_eq!(Color::of(0), Color::Green);
    }

    #[test]
    fn zero_only_pays_straight_up() {
        let outside = [
            RouletteBet::Red,
            RouletteBet::Black,
            RouletteBet::Even,
            RouletteBet::Odd,
            RouletteBet::Low,
            RouletteBet::High,
            RouletteBet::Dozen(Third::First),
            RouletteBet::Column(Third::First),
            RouletteBet::Column(Third::Second),
            RouletteBet::Column(Third::Third),
        ];
        for bet in outside {
            assert!(!bet.wins(0), "{bet} should lose on zero");
        }
        assert!(RouletteBet::Straight(0).wins(0));
    }

    #[test]
    fn columns_follow_modulo_three() {
        assert!(RouletteBet::Column(Third::First).wins(34));
        assert!(RouletteBet::Column(Third::Second).wins(35));
        assert!(RouletteBet::Column(Third::Third).wins(36));
        assert!(!RouletteBet::Column(Third::Third).wins(35));
    }

    #[test]
    fn straight_bet_requires_valid_number() {
        assert_eq!(
            RouletteBet::from_category(BetCategory::Number, None),
            Err(GameError::MissingNumber)
        );
        assert_eq!(
            RouletteBet::from_category(BetCategory::Number, Some(37)),
            Err(GameError::InvalidPocket(37))
        );
        assert_eq!(
            RouletteBet::from_category(BetCategory::Number, Some(17)),
            Ok(RouletteBet::Straight(17))
        );
        assert_eq!(
            RouletteBet::from_category(BetCategory::Red, None),
            Ok(RouletteBet::Red)
        );
    }

    #[test]
    fn categories_use_wire_names() {
        let low: BetCategory = serde_json::from_str("\"1-18\"").expect("parse");
        assert_eq!(low, BetCategory::Low);
        let dozen: BetCategory = serde_json::from_str("\"2nd dozen\"").expect("parse");
        assert_eq!(dozen, BetCategory::SecondDozen);
        let high: BetCategory = serde_json::from_str("\"high\"").expect("parse");
        assert_eq!(high, BetCategory::High);
    }

    #[test]
    fn payouts_match_odds() {
        let settle = |bet, pocket| resolve(bet, 10, Spin::landed(pocket)).expect("settle");
        let straight = settle(RouletteBet::Straight(7), 7);
        assert_eq!(straight.net, 350);
        assert_eq!(straight.credited(), 360);

        let dozen = settle(RouletteBet::Dozen(Third::Third), 30);
        assert_eq!(dozen.net, 20);

        let red = settle(RouletteBet::Red, 1);
        assert_eq!(red.net, 10);
        assert_eq!(red.outcome(), GameOutcome::Win);

        let miss = settle(RouletteBet::Black, 1);
        assert_eq!(miss.net, -10);
        assert_eq!(miss.credited(), 0);
        assert_eq!(miss.outcome(), GameOutcome::Loss);
    }

    #[test]
    fn oversized_winning_stake_is_refused() {
        assert_eq!(
            resolve(RouletteBet::Straight(7), Coins::MAX / 2, Spin::landed(7)),
            Err(GameError::AmountTooLarge {
                amount: Coins::MAX / 2,
                maximum: MAX_BET
            })
        );
        // a losing spin never multiplies
        let miss = resolve(RouletteBet::Straight(7), Coins::MAX / 2, Spin::landed(8)).expect("settle");
        assert_eq!(miss.net, -(Coins::MAX / 2));
    }
}
