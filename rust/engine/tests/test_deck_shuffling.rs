use std::collections::HashSet;

use casino_engine::cards::Card;
use casino_engine::deck::Deck;
use casino_engine::rng::SeededSource;

#[test]
fn shuffled_deck_has_52_unique_cards() {
    let mut rng = SeededSource::new_with_seed(42);
    let mut deck = Deck::shuffled(&mut rng);
    let mut set = HashSet::new();
    for i in 0..52 {
        let c = deck.deal_card().expect("should have 52 cards");
        assert!(set.insert(c), "card {:?} duplicated at position {}", c, i);
    }
    assert!(
        deck.deal_card().is_none(),
        "after 52 cards, deck should be empty"
    );
}

#[test]
fn shuffle_is_deterministic_with_same_seed() {
    let mut r1 = SeededSource::new_with_seed(12345);
    let mut r2 = SeededSource::new_with_seed(12345);
    let mut d1 = Deck::shuffled(&mut r1);
    let mut d2 = Deck::shuffled(&mut r2);
    let a: Vec<Card> = (0..10).map(|_| d1.deal_card().unwrap()).collect();
    let b: Vec<Card> = (0..10).map(|_| d2.deal_card().unwrap()).collect();
    assert_eq!(a, b, "same seed must yield identical order");
}

#[test]
fn shuffle_differs_with_different_seed() {
    let mut r1 = SeededSource::new_with_seed(1);
    let mut r2 = SeededSource::new_with_seed(2);
    let mut d1 = Deck::shuffled(&mut r1);
    let mut d2 = Deck::shuffled(&mut r2);
    let a: Vec<Card> = (0..10).map(|_| d1.deal_card().unwrap()).collect();
    let b: Vec<Card> = (0..10).map(|_| d2.deal_card().unwrap()).collect();
    assert_ne!(
        a, b,
        "different seeds should produce different orders (high probability)"
    );
}

#[test]
fn consecutive_shuffles_from_one_source_differ() {
    let mut rng = SeededSource::new_with_seed(99);
    let mut d1 = Deck::shuffled(&mut rng);
    let mut d2 = Deck::shuffled(&mut rng);
    let a: Vec<Card> = (0..52).map(|_| d1.deal_card().unwrap()).collect();
    let b: Vec<Card> = (0..52).map(|_| d2.deal_card().unwrap()).collect();
    assert_ne!(a, b);
}
