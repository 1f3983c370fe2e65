//! Single-deck blackjack against the house.
//!
//! A [`BlackjackGame`] moves through [`Phase::Dealing`], [`Phase::PlayerTurn`]
//! and [`Phase::DealerTurn`] to [`Phase::Resolved`]. A natural on the deal
//! skips straight to resolution, a bust on a hit resolves without the dealer
//! playing, and the dealer draws to 17 and stands on every 17 including the
//! soft ones.
//!
//! ```
//! use casino_engine::blackjack::{BlackjackAction, BlackjackGame, BlackjackOutcome, Phase};
//! use casino_engine::cards::{Card, Rank, Suit};
//! use casino_engine::deck::Deck;
//!
//! // player 10 + 9, dealer 10 + 7
//! let deck = Deck::stacked(&[
//!     Card::new(Rank::Ten, Suit::Hearts),
//!     Card::new(Rank::King, Suit::Clubs),
//!     Card::new(Rank::Nine, Suit::Spades),
//!     Card::new(Rank::Seven, Suit::Diamonds),
//! ])
//! .unwrap();
//! let mut game = BlackjackGame::deal(100, deck).unwrap();
//! assert_eq!(game.phase(), Phase::PlayerTurn);
//!
//! game.apply(BlackjackAction::Stand).unwrap();
//! assert_eq!(game.outcome(), Some(BlackjackOutcome::Win));
//! assert_eq!(game.credit(), Some(200));
//! ```

use serde::{Deserialize, Serialize};

use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{Hand, BLACKJACK};
use crate::outcome::GameOutcome;
use crate::rng::RandomSource;
use crate::rules::MAX_BET;
use crate::Coins;

/// The dealer keeps drawing while below this total.
pub const DEALER_STANDS_AT: u32 = 17;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Resolved,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackAction {
    Hit,
    Stand,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackOutcome {
    Win,
    /// Two-card 21 against a dealer without one.
    Blackjack,
    Push,
    Loss,
}

impl BlackjackOutcome {
    /// Coins credited back after the stake has been taken: stake plus 100%
    /// on a win, stake plus 150% (rounded down) on a natural, the stake alone
    /// on a push, nothing on a loss.
    pub fn credit(self, bet: Coins) -> Coins {
        match self {
            BlackjackOutcome::Win => bet * 2,
            BlackjackOutcome::Blackjack => bet * 5 / 2,
            BlackjackOutcome::Push => bet,
            BlackjackOutcome::Loss => 0,
        }
    }

    /// Balance change once the stake is settled.
    pub fn net(self, bet: Coins) -> Coins {
        self.credit(bet) - bet
    }

    pub fn game_outcome(self) -> GameOutcome {
        match self {
            BlackjackOutcome::Win => GameOutcome::Win,
            BlackjackOutcome::Blackjack => GameOutcome::Blackjack,
            BlackjackOutcome::Push => GameOutcome::Push,
            BlackjackOutcome::Loss => GameOutcome::Loss,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlackjackGame {
    bet: Coins,
    deck: Deck,
    player: Hand,
    dealer: Hand,
    phase: Phase,
    outcome: Option<BlackjackOutcome>,
}

impl BlackjackGame {
    /// Shuffles a fresh deck and deals the opening hands.
    pub fn start(bet: Coins, rng: &mut dyn RandomSource) -> Result<Self, GameError> {
        Self::deal(bet, Deck::shuffled(rng))
    }

    /// Deals player, dealer, player, dealer from `deck`. A player natural
    /// resolves the game immediately. Stakes above [`MAX_BET`] are refused so
    /// a 3:2 payout always fits.
    pub fn deal(bet: Coins, deck: Deck) -> Result<Self, GameError> {
        if bet > MAX_BET {
            return Err(GameError::AmountTooLarge {
                amount: bet,
                maximum: MAX_BET,
            });
        }
        let mut game = Self {
            bet,
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::Dealing,
            outcome: None,
        };
        for _ in 0..2 {
            let card = game.draw()?;
            game.player.push(card);
            let card = game.draw()?;
            game.dealer.push(card);
        }

        if game.player.total() == BLACKJACK {
            let outcome = if game.dealer.total() == BLACKJACK {
                BlackjackOutcome::Push
            } else {
                BlackjackOutcome::Blackjack
            };
            game.resolve(outcome);
        } else {
            game.phase = Phase::PlayerTurn;
        }
        Ok(game)
    }

    pub fn apply(&mut self, action: BlackjackAction) -> Result<Phase, GameError> {
        match action {
            BlackjackAction::Hit => self.hit(),
            BlackjackAction::Stand => self.stand(),
        }
    }

    pub fn hit(&mut self) -> Result<Phase, GameError> {
        self.ensure_player_turn()?;
        let card = self.draw()?;
        self.player.push(card);
        if self.player.is_bust() {
            self.resolve(BlackjackOutcome::Loss);
        }
        Ok(self.phase)
    }

    pub fn stand(&mut self) -> Result<Phase, GameError> {
        self.ensure_player_turn()?;
        self.phase = Phase::DealerTurn;
        self.play_dealer()?;
        Ok(self.phase)
    }

    fn play_dealer(&mut self) -> Result<(), GameError> {
        while self.dealer.total() < DEALER_STANDS_AT {
            let card = self.draw()?;
            self.dealer.push(card);
        }

        let dealer = self.dealer.total();
        let player = self.player.total();
        let outcome = if dealer > BLACKJACK || dealer < player {
            BlackjackOutcome::Win
        } else if dealer > player {
            BlackjackOutcome::Loss
        } else {
            BlackjackOutcome::Push
        };
        self.resolve(outcome);
        Ok(())
    }

    fn ensure_player_turn(&self) -> Result<(), GameError> {
        if self.phase == Phase::PlayerTurn {
            Ok(())
        } else {
            Err(GameError::HandAlreadyComplete)
        }
    }

    fn draw(&mut self) -> Result<crate::cards::Card, GameError> {
        self.deck.deal_card().ok_or(GameError::DeckExhausted)
    }

    fn resolve(&mut self, outcome: BlackjackOutcome) {
        self.outcome = Some(outcome);
        self.phase = Phase::Resolved;
    }

    pub fn bet(&self) -> Coins {
        self.bet
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Resolved
    }

    pub fn outcome(&self) -> Option<BlackjackOutcome> {
        self.outcome
    }

    pub fn player_hand(&self) -> &Hand {
        &self.player
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }

    pub fn cards_remaining(&self) -> usize {
        self.deck.remaining()
    }

    /// Amount credited at settlement; `None` until resolved.
    pub fn credit(&self) -> Option<Coins> {
        self.outcome.map(|o| o.credit(self.bet))
    }

    /// Net balance change at settlement; `None` until resolved.
    pub fn net(&self) -> Option<Coins> {
        self.outcome.map(|o| o.net(self.bet))
    }
}
