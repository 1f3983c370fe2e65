use thiserror::Error;

use crate::cards::Card;
use crate::Coins;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid bet amount: {amount}, minimum: {minimum}")]
    InvalidBetAmount { amount: Coins, minimum: Coins },
    #[error("Bet amount {amount} exceeds the maximum of {maximum}")]
    AmountTooLarge { amount: Coins, maximum: Coins },
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Coins, available: Coins },
    #[error("Roulette number must be between 0 and 36, got {0}")]
    InvalidPocket(u8),
    #[error("A straight-up roulette bet needs a number")]
    MissingNumber,
    #[error("Deck exhausted")]
    DeckExhausted,
    #[error("Card {0} appears twice in the deck")]
    DuplicateCard(Card),
    #[error("Hand already complete")]
    HandAlreadyComplete,
}
