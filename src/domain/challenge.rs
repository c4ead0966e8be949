//! Daily challenge generator
//!
//! One challenge exists per calendar day and is derived from the date alone:
//!
//! ```text
//! seed      = year + month + day
//! category  = seed % 4            (speed, accuracy, endurance, keys)
//! template  = (seed * 7) % 3      (one of three per category)
//! scale     = 1.0 + 0.1 * (day % 5)
//! base coin = 50 + seed % 30      (bronze 1x, silver 1.5x, gold 2x, xp 0.5x)
//! ```
//!
//! The same date always yields the same challenge, on any machine.

use serde::{Deserialize, Serialize};

use super::date::DayKey;
use super::tier::RewardTable;

/// Upper bound for any percentage target; 100% leaves no room for a typo
pub const MAX_PERCENT_TARGET: u32 = 98;

const BASE_COINS: i64 = 50;
const COIN_SPREAD: i64 = 30;

/// What a challenge measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    /// Words per minute in a timed test
    Speed,
    /// Overall accuracy percentage
    Accuracy,
    /// Total words typed in one session
    Endurance,
    /// Accuracy percentage on a specific set of keys
    Keys,
}

impl ChallengeCategory {
    const ALL: [ChallengeCategory; 4] = [Self::Speed, Self::Accuracy, Self::Endurance, Self::Keys];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Accuracy => "accuracy",
            Self::Endurance => "endurance",
            Self::Keys => "keys",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "speed" => Some(Self::Speed),
            "accuracy" => Some(Self::Accuracy),
            "endurance" => Some(Self::Endurance),
            "keys" => Some(Self::Keys),
            _ => None,
        }
    }

    /// Unit the target value is expressed in
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Speed => "wpm",
            Self::Accuracy | Self::Keys => "%",
            Self::Endurance => "words",
        }
    }

    fn is_percentage(&self) -> bool {
        matches!(self, Self::Accuracy | Self::Keys)
    }
}

/// Static template a challenge is instantiated from
struct Template {
    title: &'static str,
    description: &'static str,
    base_target: u32,
    keys: Option<&'static [&'static str]>,
}

const SPEED_TEMPLATES: [Template; 3] = [
    Template {
        title: "Speed Sprint",
        description: "Reach {target} WPM in a one-minute test",
        base_target: 35,
        keys: None,
    },
    Template {
        title: "Quick Fingers",
        description: "Hit {target} WPM without slowing down",
        base_target: 40,
        keys: None,
    },
    Template {
        title: "Velocity",
        description: "Push past {target} WPM",
        base_target: 45,
        keys: None,
    },
];

const ACCURACY_TEMPLATES: [Template; 3] = [
    Template {
        title: "Steady Hands",
        description: "Finish a test with {target}% accuracy",
        base_target: 85,
        keys: None,
    },
    Template {
        title: "Clean Copy",
        description: "Keep your accuracy at {target}% or better",
        base_target: 88,
        keys: None,
    },
    Template {
        title: "Precision",
        description: "Type a full passage at {target}% accuracy",
        base_target: 90,
        keys: None,
    },
];

const ENDURANCE_TEMPLATES: [Template; 3] = [
    Template {
        title: "Warm Up",
        description: "Type {target} words in one session",
        base_target: 250,
        keys: None,
    },
    Template {
        title: "Long Haul",
        description: "Keep going until you have typed {target} words",
        base_target: 400,
        keys: None,
    },
    Template {
        title: "Marathon",
        description: "Type {target} words without stopping",
        base_target: 600,
        keys: None,
    },
];

const KEYS_TEMPLATES: [Template; 3] = [
    Template {
        title: "Tricky Corners",
        description: "Hit {keys} with {target}% accuracy",
        base_target: 80,
        keys: Some(&["q", "z", "x", "p"]),
    },
    Template {
        title: "Bottom Row",
        description: "Hit {keys} with {target}% accuracy",
        base_target: 85,
        keys: Some(&["b", "n", "m", "v"]),
    },
    Template {
        title: "Center Stretch",
        description: "Hit {keys} with {target}% accuracy",
        base_target: 90,
        keys: Some(&["t", "y", "g", "h"]),
    },
];

fn templates_for(category: ChallengeCategory) -> &'static [Template; 3] {
    match category {
        ChallengeCategory::Speed => &SPEED_TEMPLATES,
        ChallengeCategory::Accuracy => &ACCURACY_TEMPLATES,
        ChallengeCategory::Endurance => &ENDURANCE_TEMPLATES,
        ChallengeCategory::Keys => &KEYS_TEMPLATES,
    }
}

/// The challenge for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub day: DayKey,
    pub category: ChallengeCategory,
    pub title: String,
    pub description: String,
    pub target_value: u32,
    pub target_keys: Option<Vec<String>>,
    pub rewards: RewardTable,
}

/// Seed derived from the numeric components of the date key
pub fn seed_for(day: DayKey) -> u64 {
    // Years before 0 CE never occur in practice; clamp keeps the seed unsigned
    let year = u64::try_from(day.year()).unwrap_or(0);
    year + u64::from(day.month()) + u64::from(day.day())
}

/// Scale `base` by `1.0 + 0.1 * step` in integer arithmetic, rounding half up
fn scale_target(base: u32, step: u32) -> u32 {
    (base * (10 + step) + 5) / 10
}

/// Reward table for a seed: base coins scaled by 1x / 1.5x / 2x, XP at half base
pub fn rewards_for(seed: u64) -> RewardTable {
    let base = BASE_COINS + (seed % COIN_SPREAD as u64) as i64;
    RewardTable {
        bronze: base,
        silver: base * 3 / 2,
        gold: base * 2,
        xp: base / 2,
    }
}

/// Produce the challenge for `day`. Pure and total.
pub fn challenge_for(day: DayKey) -> Challenge {
    let seed = seed_for(day);
    let category = ChallengeCategory::ALL[(seed % 4) as usize];
    let template = &templates_for(category)[((seed * 7) % 3) as usize];

    let mut target_value = scale_target(template.base_target, day.day() % 5);
    if category.is_percentage() {
        target_value = target_value.min(MAX_PERCENT_TARGET);
    }

    let target_keys = template
        .keys
        .map(|keys| keys.iter().map(|k| (*k).to_string()).collect::<Vec<_>>());

    let description = template
        .description
        .replace("{target}", &target_value.to_string())
        .replace(
            "{keys}",
            &target_keys.as_ref().map(|k| k.join(" ")).unwrap_or_default(),
        );

    Challenge {
        day,
        category,
        title: template.title.to_string(),
        description,
        target_value,
        target_keys,
        rewards: rewards_for(seed),
    }
}
