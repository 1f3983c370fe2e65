use casino_engine::rules::MIN_BET;
use casino_engine::Coins;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "CASINO_CONFIG";
pub const SEED_ENV: &str = "CASINO_SEED";
pub const ADMINS_ENV: &str = "CASINO_ADMINS";

/// Economy and table settings for one casino instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// Balance granted to a newly seen player
    pub starting_balance: Coins,
    pub daily_bonus: Coins,
    /// Smallest stake on any table
    pub min_bet: Coins,
    /// Seconds a blackjack player has to act before the hand is abandoned
    pub blackjack_timeout_secs: u64,
    pub leaderboard_limit: usize,
    /// Balance used by an admin reset without an explicit amount
    pub reset_balance: Coins,
    /// Player ids allowed to run admin commands
    pub admin_ids: Vec<String>,
    /// Fixed RNG seed; fresh entropy when absent
    pub seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            starting_balance: 10_000,
            daily_bonus: 1_000,
            min_bet: MIN_BET,
            blackjack_timeout_secs: 60,
            leaderboard_limit: 10,
            reset_balance: 10_000,
            admin_ids: Vec::new(),
            seed: None,
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_bet < 1 {
            return Err(SettingsError::InvalidValue(
                "min_bet must be at least 1".to_string(),
            ));
        }
        if self.starting_balance < 0 || self.daily_bonus < 0 || self.reset_balance < 0 {
            return Err(SettingsError::InvalidValue(
                "balances and bonuses cannot be negative".to_string(),
            ));
        }
        if self.blackjack_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "blackjack_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.leaderboard_limit == 0 {
            return Err(SettingsError::InvalidValue(
                "leaderboard_limit must be greater than 0".to_string(),
            ));
        }
        if self.admin_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(SettingsError::InvalidValue(
                "admin_ids cannot contain empty ids".to_string(),
            ));
        }
        Ok(())
    }

    pub fn blackjack_timeout(&self) -> Duration {
        Duration::from_secs(self.blackjack_timeout_secs)
    }

    pub fn is_listed_admin(&self, player_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == player_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
    Cli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSources {
    pub starting_balance: ValueSource,
    pub daily_bonus: ValueSource,
    pub min_bet: ValueSource,
    pub blackjack_timeout_secs: ValueSource,
    pub leaderboard_limit: ValueSource,
    pub reset_balance: ValueSource,
    pub admin_ids: ValueSource,
    pub seed: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            starting_balance: ValueSource::Default,
            daily_bonus: ValueSource::Default,
            min_bet: ValueSource::Default,
            blackjack_timeout_secs: ValueSource::Default,
            leaderboard_limit: ValueSource::Default,
            reset_balance: ValueSource::Default,
            admin_ids: ValueSource::Default,
            seed: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsResolved {
    pub settings: AppSettings,
    pub sources: ConfigSources,
}

impl SettingsResolved {
    /// Command-line values win over everything else.
    pub fn override_seed(&mut self, seed: u64) {
        self.settings.seed = Some(seed);
        self.sources.seed = ValueSource::Cli;
    }

    pub fn override_admins(&mut self, admins: Vec<String>) {
        self.settings.admin_ids = admins;
        self.sources.admin_ids = ValueSource::Cli;
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    #[serde(default)]
    starting_balance: Option<Coins>,
    #[serde(default)]
    daily_bonus: Option<Coins>,
    #[serde(default)]
    min_bet: Option<Coins>,
    #[serde(default)]
    blackjack_timeout_secs: Option<u64>,
    #[serde(default)]
    leaderboard_limit: Option<usize>,
    #[serde(default)]
    reset_balance: Option<Coins>,
    #[serde(default)]
    admin_ids: Option<Vec<String>>,
    #[serde(default)]
    seed: Option<u64>,
}

pub fn load() -> Result<AppSettings, SettingsError> {
    load_with_sources(None).map(|resolved| resolved.settings)
}

/// Layers defaults, then the TOML file (`config_path`, or the path in
/// `CASINO_CONFIG`), then `CASINO_SEED` and `CASINO_ADMINS`.
pub fn load_with_sources(config_path: Option<&Path>) -> Result<SettingsResolved, SettingsError> {
    let mut settings = AppSettings::default();
    let mut sources = ConfigSources::default();

    let path = match config_path {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var(CONFIG_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from),
    };
    if let Some(path) = path {
        let text = fs::read_to_string(&path)?;
        let file: FileSettings = toml::from_str(&text)?;
        apply_file(&mut settings, &mut sources, file);
    }

    if let Some(seed) = non_empty_env(SEED_ENV) {
        settings.seed = Some(
            seed.parse()
                .map_err(|_| SettingsError::InvalidValue(format!("invalid seed: {seed}")))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Some(admins) = non_empty_env(ADMINS_ENV) {
        settings.admin_ids = parse_id_list(&admins);
        sources.admin_ids = ValueSource::Env;
    }

    settings.validate()?;
    Ok(SettingsResolved { settings, sources })
}

fn apply_file(settings: &mut AppSettings, sources: &mut ConfigSources, file: FileSettings) {
    if let Some(v) = file.starting_balance {
        settings.starting_balance = v;
        sources.starting_balance = ValueSource::File;
    }
    if let Some(v) = file.daily_bonus {
        settings.daily_bonus = v;
        sources.daily_bonus = ValueSource::File;
    }
    if let Some(v) = file.min_bet {
        settings.min_bet = v;
        sources.min_bet = ValueSource::File;
    }
    if let Some(v) = file.blackjack_timeout_secs {
        settings.blackjack_timeout_secs = v;
        sources.blackjack_timeout_secs = ValueSource::File;
    }
    if let Some(v) = file.leaderboard_limit {
        settings.leaderboard_limit = v;
        sources.leaderboard_limit = ValueSource::File;
    }
    if let Some(v) = file.reset_balance {
        settings.reset_balance = v;
        sources.reset_balance = ValueSource::File;
    }
    if let Some(v) = file.admin_ids {
        settings.admin_ids = v;
        sources.admin_ids = ValueSource::File;
    }
    if let Some(v) = file.seed {
        settings.seed = Some(v);
        sources.seed = ValueSource::File;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Splits `"1, 2,,3"` into `["1", "2", "3"]`.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
