/// End-to-end command flows through the casino facade
/// Every game runs on scripted randomness so balances can be asserted exactly
use casino_bot::clock::ManualClock;
use casino_bot::{AppSettings, Casino, Command, CommandOutcome, CommandRequest, ErrorKind};
use casino_engine::blackjack::BlackjackAction;
use casino_engine::cards::{Card, Rank, Suit};
use casino_engine::outcome::{GameOutcome, GameType};
use casino_engine::rng::ScriptedSource;
use casino_engine::roulette::BetCategory;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn evening() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 25)
        .and_then(|d| d.and_hms_opt(18, 30, 0))
        .expect("valid timestamp")
}

fn open_casino(rng: ScriptedSource) -> (Casino, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(evening()));
    let casino = Casino::with_dependencies(AppSettings::default(), Box::new(rng), clock.clone())
        .expect("create casino");
    (casino, clock)
}

fn run(casino: &Casino, player: &str, command: Command) -> CommandOutcome {
    casino.execute(CommandRequest::new(player, command).with_display_name(player.to_uppercase()))
}

fn card(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

fn balance(casino: &Casino, player: &str) -> i64 {
    casino
        .accounts()
        .require(player)
        .expect("account exists")
        .balance()
}

#[test]
fn new_player_wins_red_on_one() {
    let (casino, _) = open_casino(ScriptedSource::with_draws([1]));

    let outcome = run(
        &casino,
        "alice",
        Command::Roulette {
            amount: 100,
            category: BetCategory::Red,
            number: None,
        },
    );

    assert!(outcome.success);
    assert_eq!(outcome.balance_after, Some(10_100));
    assert_eq!(outcome.text("Result"), Some("🔴 **1** 🔴"));
    assert_eq!(outcome.text("Your Bet"), Some("100 coins on red"));

    let history = casino.ledger().history("alice", 10).expect("history");
    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(
        (entry.game, entry.bet_amount, entry.outcome, entry.net_win_amount),
        (GameType::Roulette, 100, GameOutcome::Win, 100)
    );
    assert_eq!(entry.timestamp, evening());
}

#[test]
fn zero_loses_every_outside_bet() {
    let (casino, _) = open_casino(ScriptedSource::with_draws([0, 0]));

    let even = run(
        &casino,
        "alice",
        Command::Roulette {
            amount: 100,
            category: BetCategory::Even,
            number: None,
        },
    );
    assert_eq!(even.outcome_tag.as_deref(), Some("loss"));

    let straight = run(
        &casino,
        "alice",
        Command::Roulette {
            amount: 10,
            category: BetCategory::Number,
            number: Some(0),
        },
    );
    assert_eq!(straight.balance_delta, 350);
    assert_eq!(balance(&casino, "alice"), 10_000 - 100 + 350);
}

#[test]
fn slots_pay_only_triples() {
    // seven, seven, bell then three cherries
    let (casino, _) = open_casino(ScriptedSource::with_draws([6, 6, 4, 0, 0, 0]));

    let near_miss = run(&casino, "bob", Command::Slots { amount: 50 });
    assert_eq!(near_miss.outcome_tag.as_deref(), Some("no_match"));
    assert_eq!(near_miss.balance_delta, -50);

    let cherries = run(&casino, "bob", Command::Slots { amount: 50 });
    assert_eq!(cherries.outcome_tag.as_deref(), Some("small_win"));
    assert_eq!(cherries.balance_delta, 200);
    assert_eq!(cherries.text("Reels"), Some("| 🍒 | 🍒 | 🍒 |"));
    assert_eq!(balance(&casino, "bob"), 10_150);

    let account = casino.accounts().require("bob").expect("account");
    assert_eq!((account.games_played(), account.games_won()), (2, 1));
}

#[test]
fn natural_blackjack_pays_three_to_two_rounded_down() {
    let mut rng = ScriptedSource::new();
    rng.push_deck_top(vec![
        card(Rank::Ace, Suit::Spades),
        card(Rank::Nine, Suit::Clubs),
        card(Rank::King, Suit::Spades),
        card(Rank::Eight, Suit::Diamonds),
    ]);
    let (casino, _) = open_casino(rng);

    let outcome = run(&casino, "carol", Command::BlackjackStart { amount: 15 });
    assert_eq!(outcome.outcome_tag.as_deref(), Some("blackjack"));
    // floor(2.5 * 15) = 37 credited, 22 net
    assert_eq!(outcome.balance_delta, 22);
    assert_eq!(balance(&casino, "carol"), 10_022);
    assert!(!casino.sessions().has_session("carol").expect("lookup"));

    let entry = &casino.ledger().history("carol", 1).expect("history")[0];
    assert_eq!(entry.outcome, GameOutcome::Blackjack);
    assert_eq!(entry.net_win_amount, 22);
}

#[test]
fn both_naturals_push() {
    let mut rng = ScriptedSource::new();
    rng.push_deck_top(vec![
        card(Rank::Ace, Suit::Spades),
        card(Rank::Ace, Suit::Hearts),
        card(Rank::King, Suit::Spades),
        card(Rank::Queen, Suit::Diamonds),
    ]);
    let (casino, _) = open_casino(rng);

    let outcome = run(&casino, "carol", Command::BlackjackStart { amount: 200 });
    assert_eq!(outcome.outcome_tag.as_deref(), Some("push"));
    assert_eq!(outcome.balance_delta, 0);
    assert_eq!(balance(&casino, "carol"), 10_000);

    let account = casino.accounts().require("carol").expect("account");
    assert_eq!((account.games_played(), account.games_won()), (1, 0));
}

#[test]
fn dealer_stands_on_soft_seventeen() {
    let mut rng = ScriptedSource::new();
    // player 10 + 8, dealer A + 6
    rng.push_deck_top(vec![
        card(Rank::Ten, Suit::Hearts),
        card(Rank::Ace, Suit::Clubs),
        card(Rank::Eight, Suit::Spades),
        card(Rank::Six, Suit::Diamonds),
    ]);
    let (casino, _) = open_casino(rng);

    let started = run(&casino, "dave", Command::BlackjackStart { amount: 100 });
    assert_eq!(started.outcome_tag.as_deref(), Some("in_progress"));
    assert_eq!(started.text("Your Hand"), Some("[10♥] [8♠] = 18"));

    let stood = run(
        &casino,
        "dave",
        Command::BlackjackAction {
            action: BlackjackAction::Stand,
        },
    );
    assert_eq!(stood.outcome_tag.as_deref(), Some("win"));
    assert_eq!(stood.text("Dealer's Hand"), Some("[A♣] [6♦] = 17 (soft)"));
    assert_eq!(balance(&casino, "dave"), 10_100);
}

#[test]
fn transfers_are_zero_sum() {
    let (casino, _) = open_casino(ScriptedSource::new());
    casino.accounts().get_or_create("alice", "Alice").expect("create");
    casino.accounts().get_or_create("bob", "Bob").expect("create");
    let before = casino.accounts().total_coins().expect("total");

    let sent = run(
        &casino,
        "alice",
        Command::Transfer {
            target: "bob".into(),
            target_name: Some("Bob".into()),
            amount: 2_500,
        },
    );
    assert!(sent.success);
    assert_eq!(sent.balance_after, Some(7_500));
    assert_eq!(sent.text("Transfer"), Some("You sent 2,500 coins to Bob!"));
    assert_eq!(balance(&casino, "bob"), 12_500);
    assert_eq!(casino.accounts().total_coins().expect("total"), before);
}

#[test]
fn daily_bonus_once_per_calendar_day() {
    let (casino, clock) = open_casino(ScriptedSource::new());
    casino.accounts().get_or_create("erin", "Erin").expect("create");

    let first = run(&casino, "erin", Command::Daily);
    assert_eq!(first.outcome_tag.as_deref(), Some("claimed"));
    assert_eq!(first.balance_after, Some(11_000));

    clock.advance(ChronoDuration::hours(2));
    let again = run(&casino, "erin", Command::Daily);
    assert_eq!(again.outcome_tag.as_deref(), Some("already_claimed"));
    assert_eq!(again.balance_delta, 0);
    // 20:30 leaves three whole hours until midnight
    assert_eq!(
        again.text("Daily Bonus"),
        Some("You already claimed today's bonus. Come back in 3 hours.")
    );

    clock.advance(ChronoDuration::hours(4));
    let tomorrow = run(&casino, "erin", Command::Daily);
    assert_eq!(tomorrow.outcome_tag.as_deref(), Some("claimed"));
    assert_eq!(balance(&casino, "erin"), 12_000);
}

#[test]
fn balance_lookup_of_stranger_is_unknown_player() {
    let (casino, _) = open_casino(ScriptedSource::new());
    casino.accounts().get_or_create("alice", "Alice").expect("create");

    let stranger = run(
        &casino,
        "alice",
        Command::Balance {
            target: Some("nobody".into()),
        },
    );
    assert_eq!(stranger.error_kind, Some(ErrorKind::UnknownPlayer));

    let own = run(&casino, "alice", Command::Balance { target: None });
    assert_eq!(own.balance_after, Some(10_000));
    assert_eq!(own.text("Win Rate"), Some("0%"));
}

#[test]
fn history_lists_newest_first() {
    let (casino, _) = open_casino(ScriptedSource::with_draws([1, 6, 6, 6]));
    run(
        &casino,
        "fay",
        Command::Roulette {
            amount: 10,
            category: BetCategory::Black,
            number: None,
        },
    );
    run(&casino, "fay", Command::Slots { amount: 10 });

    let history = run(&casino, "fay", Command::History { limit: None });
    let labels: Vec<&str> = history
        .narrative
        .iter()
        .map(|f| f.label.as_str())
        .collect();
    assert_eq!(labels, vec!["#2 slots", "#1 roulette"]);
    assert!(history.narrative[0].text.starts_with("jackpot on 10 coins, net +490"));

    let stranger = run(&casino, "ghost", Command::History { limit: None });
    assert_eq!(stranger.error_kind, Some(ErrorKind::UnknownPlayer));
}

#[tokio::test]
async fn idle_hand_times_out_and_returns_the_bet() {
    let (casino, _) = open_casino(ScriptedSource::new());
    let casino = casino.with_session_timeout(Duration::from_millis(30));

    let started = run(&casino, "gus", Command::BlackjackStart { amount: 500 });
    assert_eq!(started.outcome_tag.as_deref(), Some("in_progress"));
    assert_eq!(
        casino.accounts().require("gus").expect("account").available(),
        9_500
    );

    tokio::time::sleep(Duration::from_millis(60)).await;
    let late = run(
        &casino,
        "gus",
        Command::BlackjackAction {
            action: BlackjackAction::Hit,
        },
    );
    assert!(late.success);
    assert_eq!(late.outcome_tag.as_deref(), Some("timed_out"));

    let account = casino.accounts().require("gus").expect("account");
    assert_eq!((account.balance(), account.available()), (10_000, 10_000));
    assert_eq!(account.games_played(), 0);
    assert_eq!(casino.ledger().total_entries().expect("total"), 0);
}

#[tokio::test]
async fn stale_hand_does_not_block_a_new_start() {
    let (casino, _) = open_casino(ScriptedSource::new());
    let casino = casino.with_session_timeout(Duration::from_millis(30));

    let first = run(&casino, "ivy", Command::BlackjackStart { amount: 100 });
    assert_eq!(first.outcome_tag.as_deref(), Some("in_progress"));

    // no reaper running: the next start itself clears the stale hand
    tokio::time::sleep(Duration::from_millis(80)).await;
    let second = run(&casino, "ivy", Command::BlackjackStart { amount: 250 });
    assert!(second.success, "{second:?}");
    assert_eq!(second.outcome_tag.as_deref(), Some("in_progress"));

    let account = casino.accounts().require("ivy").expect("account");
    assert_eq!(account.balance(), 10_000);
    assert_eq!(account.reserved(), 250);
    assert_eq!(casino.sessions().active_sessions().expect("count"), 1);
    assert_eq!(casino.ledger().total_entries().expect("total"), 0);
}

#[tokio::test]
async fn reaper_announces_abandoned_hands() {
    let (casino, _) = open_casino(ScriptedSource::new());
    let casino = Arc::new(casino.with_session_timeout(Duration::from_millis(20)));

    run(&casino, "hal", Command::BlackjackStart { amount: 300 });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let reaper = Arc::clone(&casino).spawn_reaper(Duration::from_millis(10), tx);

    let expired = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reaper fired")
        .expect("notice delivered");
    assert_eq!(expired.player_id, "hal");
    assert_eq!(expired.bet, 300);

    assert!(!casino.sessions().has_session("hal").expect("lookup"));
    assert_eq!(
        casino.accounts().require("hal").expect("account").reserved(),
        0
    );

    let action = run(
        &casino,
        "hal",
        Command::BlackjackAction {
            action: BlackjackAction::Stand,
        },
    );
    assert_eq!(action.error_kind, Some(ErrorKind::NoActiveSession));
    reaper.abort();
}
