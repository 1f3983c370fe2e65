//! Inbound commands and the outbound result shape.
//!
//! Both sides are plain serde types so any chat adapter can speak them; the
//! bundled binary reads them as JSON lines.

use crate::accounts::PlayerId;
use crate::errors::ErrorKind;
use casino_engine::blackjack::BlackjackAction;
use casino_engine::roulette::BetCategory;
use casino_engine::Coins;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    #[default]
    Global,
    Server,
}

impl LeaderboardScope {
    pub fn title(self) -> &'static str {
        match self {
            LeaderboardScope::Global => "🌍 Global Leaderboard",
            LeaderboardScope::Server => "🏆 Server Leaderboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Balance {
        #[serde(default)]
        target: Option<PlayerId>,
    },
    Daily,
    Transfer {
        target: PlayerId,
        #[serde(default)]
        target_name: Option<String>,
        amount: Coins,
    },
    Roulette {
        amount: Coins,
        category: BetCategory,
        #[serde(default)]
        number: Option<u8>,
    },
    BlackjackStart {
        amount: Coins,
    },
    BlackjackAction {
        action: BlackjackAction,
    },
    Slots {
        amount: Coins,
    },
    Leaderboard {
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        scope: LeaderboardScope,
    },
    History {
        #[serde(default)]
        limit: Option<usize>,
    },
    AdminGive {
        target: PlayerId,
        amount: Coins,
    },
    AdminTake {
        target: PlayerId,
        amount: Coins,
    },
    AdminReset {
        target: PlayerId,
        #[serde(default)]
        amount: Option<Coins>,
    },
    AdminStats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Balance { .. } => "balance",
            Command::Daily => "daily",
            Command::Transfer { .. } => "transfer",
            Command::Roulette { .. } => "roulette",
            Command::BlackjackStart { .. } => "blackjack_start",
            Command::BlackjackAction { .. } => "blackjack_action",
            Command::Slots { .. } => "slots",
            Command::Leaderboard { .. } => "leaderboard",
            Command::History { .. } => "history",
            Command::AdminGive { .. } => "admin_give",
            Command::AdminTake { .. } => "admin_take",
            Command::AdminReset { .. } => "admin_reset",
            Command::AdminStats => "admin_stats",
        }
    }
}

/// `(player_id, command, parameters)` as delivered by a chat adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub command: Command,
}

impl CommandRequest {
    pub fn new(player_id: impl Into<PlayerId>, command: Command) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: None,
            command,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name, falling back to the player id.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeField {
    pub label: String,
    pub text: String,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Coins>,
    pub balance_delta: Coins,
    pub narrative: Vec<NarrativeField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_tag: Option<String>,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error_kind: None,
            balance_after: None,
            balance_delta: 0,
            narrative: Vec::new(),
            outcome_tag: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            balance_after: None,
            balance_delta: 0,
            narrative: vec![NarrativeField {
                label: "Error".to_string(),
                text: message.into(),
            }],
            outcome_tag: None,
        }
    }

    pub fn with_balance(mut self, balance_after: Coins, delta: Coins) -> Self {
        self.balance_after = Some(balance_after);
        self.balance_delta = delta;
        self
    }

    pub fn with_tag(mut self, tag: impl ToString) -> Self {
        self.outcome_tag = Some(tag.to_string());
        self
    }

    pub fn field(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.narrative.push(NarrativeField {
            label: label.into(),
            text: text.into(),
        });
        self
    }

    /// Text of the first field with `label`.
    pub fn text(&self, label: &str) -> Option<&str> {
        self.narrative
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.text.as_str())
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn format_coins(amount: Coins) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
