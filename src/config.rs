//! Application configuration constants.
//!
//! Fixed tuning values for the practice engine live here, alongside the
//! loader for the few settings a host may override at runtime.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::Tier;

// ==================== Runtime Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database: Option<DatabaseSection>,
    trial: Option<TrialSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrialSection {
    duration_secs: Option<i64>,
}

/// Resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub trial_duration_secs: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            trial_duration_secs: TRIAL_DURATION_SECS,
        }
    }
}

/// Default location of the SQLite database
pub const DEFAULT_DATABASE_PATH: &str = "data/lingo.db";

/// Load settings with priority: config.toml > .env / environment > default
pub fn load_config() -> AppConfig {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = std::fs::read_to_string("config.toml")
        .ok()
        .and_then(|contents| match toml::from_str::<ConfigFile>(&contents) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Ignoring malformed config.toml: {}", e);
                None
            }
        })
        .unwrap_or_default();

    resolve_config(
        file,
        std::env::var("DATABASE_PATH").ok(),
        std::env::var("TRIAL_DURATION_SECS").ok(),
    )
}

fn resolve_config(
    file: ConfigFile,
    env_db_path: Option<String>,
    env_trial_secs: Option<String>,
) -> AppConfig {
    let mut config = AppConfig::default();

    // Priority 1: config.toml
    let file_db_path = file.database.and_then(|db| db.path);
    let file_trial_secs = file.trial.and_then(|t| t.duration_secs);

    if let Some(path) = file_db_path {
        tracing::info!("Using database from config.toml: {}", path);
        config.database_path = PathBuf::from(path);
    } else if let Some(path) = env_db_path {
        // Priority 2: DATABASE_PATH
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        config.database_path = PathBuf::from(path);
    } else {
        tracing::info!(
            "Using default database path: {}",
            config.database_path.display()
        );
    }

    let env_trial_secs = env_trial_secs.and_then(|s| s.trim().parse::<i64>().ok());
    if let Some(secs) = file_trial_secs.or(env_trial_secs).filter(|s| *s > 0) {
        config.trial_duration_secs = secs;
    }

    config
}

// ==================== Trial Gate ====================

/// Length of the free trial countdown
pub const TRIAL_DURATION_SECS: i64 = 86_400;

/// Wall-clock window during which the install counts as "first day"
pub const FIRST_DAY_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Length of the promotional offer that opens when the trial runs out
pub const OFFER_WINDOW_SECS: i64 = 60 * 60;

/// Local storage keys used by the trial gate
pub const KEY_TRIAL_REMAINING: &str = "trial_remaining_seconds";
pub const KEY_TRIAL_STARTED: &str = "trial_started";
pub const KEY_FIRST_DAY_STARTED_AT: &str = "first_day_started_at";
pub const KEY_OFFER_STARTED_AT: &str = "offer_started_at";

// ==================== Mastery ====================

/// Mastery level at which an item counts as mastered
pub const MASTERED_THRESHOLD: u8 = 5;

// ==================== Exercise Generation ====================

/// Options per multiple choice question (one correct + distractors)
pub const OPTION_COUNT: usize = 3;

/// Number of distractor choices in multiple choice mode
pub const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// Fewest distinct items that can back a question set
pub const MIN_POOL_SIZE: usize = OPTION_COUNT + 1;

/// First speed round (0-based question index), i.e. the 6th question
pub const SPEED_ROUND_START: usize = 5;

/// Speed rounds recur every this many questions after the first
pub const SPEED_ROUND_EVERY: usize = 3;

/// Countdown for a speed round
pub const SPEED_ROUND_SECS: u32 = 5;

/// Response value recorded when a speed round expires unanswered
pub const TIMEOUT_RESPONSE: &str = "__timeout__";

// ==================== Rewards ====================

pub const BASE_REWARD: u32 = 10;

/// Combo thresholds and their bonus (highest matching threshold wins)
pub const COMBO_BONUSES: [(u32, u32); 2] = [(10, 10), (5, 5)];

/// Speed round bonus by seconds left on the clock (highest matching wins)
pub const SPEED_BONUSES: [(u32, u32); 3] = [(4, 15), (2, 10), (1, 5)];

/// Hearts a non-premium learner starts a lesson with
pub const MAX_HEARTS: u32 = 5;

// ==================== Placement ====================

/// Accuracy needed to pass a tier
pub const PLACEMENT_PASS_RATIO: f64 = 0.6;

/// Answers required at a tier before an early failure can end a staged test
pub const STAGED_MIN_ANSWERS: usize = 3;

/// Questions per tier in the batch placement test
pub const BATCH_QUESTIONS_PER_TIER: usize = 5;

/// Correct answers that count as solid at a tier in batch mode
pub const BATCH_SOLID_COUNT: usize = 4;

/// Correct answers that count as partial at the tier above a solid one
pub const BATCH_PARTIAL_COUNT: usize = 2;

// ==================== Tier Configuration ====================

/// Tier information struct
pub struct TierInfo {
    pub tier: Tier,
    pub name: &'static str,
    pub short_name: &'static str,
}

/// All tier definitions
pub static TIERS: [TierInfo; 4] = [
    TierInfo {
        tier: Tier::Tier1,
        name: "Level 1: Beginner",
        short_name: "Beginner",
    },
    TierInfo {
        tier: Tier::Tier2,
        name: "Level 2: Elementary",
        short_name: "Elementary",
    },
    TierInfo {
        tier: Tier::Tier3,
        name: "Level 3: Intermediate",
        short_name: "Intermediate",
    },
    TierInfo {
        tier: Tier::Tier4,
        name: "Level 4: Advanced",
        short_name: "Advanced",
    },
];

/// Get tier info by tier
pub fn get_tier_info(tier: Tier) -> &'static TierInfo {
    &TIERS[tier.index()]
}

/// Get tier display name
pub fn get_tier_name(tier: Tier) -> &'static str {
    get_tier_info(tier).short_name
}
