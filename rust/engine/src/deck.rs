use crate::cards::{full_deck, Card};
use crate::errors::GameError;
use crate::rng::RandomSource;

/// Single 52-card shoe dealt from the top.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
}

impl Deck {
    pub fn shuffled(rng: &mut dyn RandomSource) -> Self {
        let mut cards = full_deck();
        rng.shuffle(&mut cards);
        Self { cards, position: 0 }
    }

    /// Deck whose first cards are `top` in that order, followed by every
    /// remaining card of a fresh deck.
    pub fn stacked(top: &[Card]) -> Result<Self, GameError> {
        let mut cards: Vec<Card> = Vec::with_capacity(52);
        for &c in top {
            if cards.contains(&c) {
                return Err(GameError::DuplicateCard(c));
            }
            cards.push(c);
        }
        cards.extend(full_deck().into_iter().filter(|c| !top.contains(c)));
        Ok(Self { cards, position: 0 })
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        if self.position >= self.cards.len() {
            None
        } else {
            let c = self.cards[self.position];
            self.position += 1;
            Some(c)
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn stacked_deck_deals_top_first_then_rest() {
        let top = [
            Card::new(Rank::Ace, Suit::Clubs),
            Card::new(Rank::Nine, Suit::Hearts),
        ];
        let mut deck = Deck::stacked(&top).expect("stack");
        assert_eq!(deck.remaining(), 52);
        assert_eq!(deck.deal_card(), Some(top[0]));
        assert_eq!(deck.deal_card(), Some(top[1]));
        let rest: Vec<Card> = std::iter::from_fn(|| deck.deal_card()).collect();
        assert_eq!(rest.len(), 50);
        assert!(!rest.contains(&top[0]));
        assert!(deck.deal_card().is_none());
    }

    #[test]
    fn stacked_deck_rejects_duplicates() {
        let c = Card::new(Rank::Five, Suit::Spades);
        assert_eq!(
            Deck::stacked(&[c, c]).unwrap_err(),
            GameError::DuplicateCard(c)
        );
    }
}
