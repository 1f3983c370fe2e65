use std::fmt;

use crate::cards::Card;

pub const BLACKJACK: u32 = 21;

/// Best total of a blackjack hand after demoting aces as needed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HandValue {
    pub total: u32,
    /// At least one ace still counts 11 and the total is not bust.
    pub soft: bool,
}

/// Values a run of cards: every ace starts at 11 and is demoted to 1, one at
/// a time, while the total exceeds 21.
pub fn hand_value(cards: &[Card]) -> HandValue {
    let mut total: u32 = cards.iter().map(|c| c.rank.blackjack_value()).sum();
    let mut high_aces = cards.iter().filter(|c| c.rank.is_ace()).count();
    while total > BLACKJACK && high_aces > 0 {
        total -= 10;
        high_aces -= 1;
    }
    HandValue {
        total,
        soft: high_aces > 0 && total <= BLACKJACK,
    }
}

/// Cards held by the player or the dealer. The value is always derived from
/// the cards, never cached.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn value(&self) -> HandValue {
        hand_value(&self.cards)
    }

    pub fn total(&self) -> u32 {
        self.value().total
    }

    pub fn is_bust(&self) -> bool {
        self.total() > BLACKJACK
    }

    /// Two-card 21.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.total() == BLACKJACK
    }

    /// Rendering with the first card face down, as shown while the player acts.
    pub fn masked(&self) -> String {
        let mut out = String::from("[?]");
        for c in self.cards.iter().skip(1) {
            out.push(' ');
            out.push_str(&c.to_string());
        }
        out
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.cards.iter().map(|c| c.to_string()).collect();
        let value = self.value();
        write!(f, "{} = {}", cards.join(" "), value.total)?;
        if value.soft {
            f.write_str(" (soft)")?;
        }
        Ok(())
    }
}
