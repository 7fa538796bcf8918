//! Achievement badges derived from XP, streak and completed lessons.

use crate::db::SqliteStore;
use crate::domain::UserId;
use crate::error::{CoreError, Result};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeCategory {
  Experience,
  Streak,
  Lessons,
}

impl BadgeCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Experience => "experience",
      Self::Streak => "streak",
      Self::Lessons => "lessons",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
  pub key: &'static str,
  pub category: BadgeCategory,
  pub threshold: u32,
  pub title: &'static str,
  pub description: &'static str,
}

const fn badge(
  key: &'static str,
  category: BadgeCategory,
  threshold: u32,
  title: &'static str,
  description: &'static str,
) -> BadgeDefinition {
  BadgeDefinition {
    key,
    category,
    threshold,
    title,
    description,
  }
}

/// Ordered by threshold
pub static XP_BADGES: [BadgeDefinition; 6] = [
  badge("xp_100", BadgeCategory::Experience, 100, "First Steps", "Earn 100 XP"),
  badge("xp_500", BadgeCategory::Experience, 500, "Getting Serious", "Earn 500 XP"),
  badge("xp_1000", BadgeCategory::Experience, 1000, "Dedicated", "Earn 1,000 XP"),
  badge("xp_2500", BadgeCategory::Experience, 2500, "Scholar", "Earn 2,500 XP"),
  badge("xp_5000", BadgeCategory::Experience, 5000, "Expert", "Earn 5,000 XP"),
  badge("xp_10000", BadgeCategory::Experience, 10000, "Legend", "Earn 10,000 XP"),
];

/// Ordered by threshold
pub static STREAK_BADGES: [BadgeDefinition; 7] = [
  badge("streak_3", BadgeCategory::Streak, 3, "Warming Up", "Practice 3 days in a row"),
  badge("streak_7", BadgeCategory::Streak, 7, "One Week", "Practice 7 days in a row"),
  badge("streak_14", BadgeCategory::Streak, 14, "Two Weeks", "Practice 14 days in a row"),
  badge("streak_30", BadgeCategory::Streak, 30, "Monthly Habit", "Practice 30 days in a row"),
  badge("streak_60", BadgeCategory::Streak, 60, "Unstoppable", "Practice 60 days in a row"),
  badge("streak_100", BadgeCategory::Streak, 100, "Centurion", "Practice 100 days in a row"),
  badge("streak_365", BadgeCategory::Streak, 365, "Year of Practice", "Practice every day for a year"),
];

/// Ordered by threshold
pub static LESSON_BADGES: [BadgeDefinition; 6] = [
  badge("lessons_1", BadgeCategory::Lessons, 1, "First Lesson", "Complete a lesson"),
  badge("lessons_5", BadgeCategory::Lessons, 5, "Five Down", "Complete 5 lessons"),
  badge("lessons_10", BadgeCategory::Lessons, 10, "Ten Lessons", "Complete 10 lessons"),
  badge("lessons_25", BadgeCategory::Lessons, 25, "Committed", "Complete 25 lessons"),
  badge("lessons_50", BadgeCategory::Lessons, 50, "Half Century", "Complete 50 lessons"),
  badge("lessons_100", BadgeCategory::Lessons, 100, "Lesson Master", "Complete 100 lessons"),
];

pub fn catalog(category: BadgeCategory) -> &'static [BadgeDefinition] {
  match category {
    BadgeCategory::Experience => &XP_BADGES,
    BadgeCategory::Streak => &STREAK_BADGES,
    BadgeCategory::Lessons => &LESSON_BADGES,
  }
}

pub fn get_badge(key: &str) -> Option<&'static BadgeDefinition> {
  [BadgeCategory::Experience, BadgeCategory::Streak, BadgeCategory::Lessons]
    .into_iter()
    .flat_map(catalog)
    .find(|b| b.key == key)
}

/// Learner totals the badges are computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearnerStats {
  pub xp: u32,
  pub streak: u32,
  pub lessons_completed: u32,
}

impl LearnerStats {
  pub fn new(xp: u32, streak: u32, lessons_completed: u32) -> Self {
    Self {
      xp,
      streak,
      lessons_completed,
    }
  }

  fn value(&self, category: BadgeCategory) -> u32 {
    match category {
      BadgeCategory::Experience => self.xp,
      BadgeCategory::Streak => self.streak,
      BadgeCategory::Lessons => self.lessons_completed,
    }
  }
}

/// Every badge whose threshold is met, XP first, then streak, then lessons
pub fn calculate_earned(stats: &LearnerStats) -> Vec<&'static BadgeDefinition> {
  [BadgeCategory::Experience, BadgeCategory::Streak, BadgeCategory::Lessons]
    .into_iter()
    .flat_map(|category| {
      catalog(category)
        .iter()
        .filter(move |b| stats.value(category) >= b.threshold)
    })
    .collect()
}

pub fn calculate_earned_keys(stats: &LearnerStats) -> Vec<&'static str> {
  calculate_earned(stats).into_iter().map(|b| b.key).collect()
}

/// The single badge shown on the profile.
///
/// Starts from the best XP badge; a met streak badge with a larger raw
/// threshold replaces it. Lesson badges never take part.
pub fn get_active_badge(stats: &LearnerStats) -> Option<&'static BadgeDefinition> {
  let mut active = XP_BADGES.iter().rev().find(|b| stats.xp >= b.threshold);
  for streak_badge in STREAK_BADGES.iter().filter(|b| stats.streak >= b.threshold) {
    if active.is_none_or(|current| streak_badge.threshold > current.threshold) {
      active = Some(streak_badge);
    }
  }
  active
}

/// Earned badges that are not in `already_earned`
pub fn newly_earned(stats: &LearnerStats, already_earned: &[String]) -> Vec<&'static BadgeDefinition> {
  calculate_earned(stats)
    .into_iter()
    .filter(|b| !already_earned.iter().any(|k| k == b.key))
    .collect()
}

/// Evaluate badges and add them to the learner's ledger. Returns only badges
/// earned for the first time, for notifications.
pub fn award_badges(
  store: &SqliteStore,
  user: Option<&UserId>,
  stats: &LearnerStats,
) -> Result<Vec<&'static BadgeDefinition>> {
  let user = user.ok_or(CoreError::NotAuthenticated)?;
  let earned = calculate_earned_keys(stats);

  #[cfg(feature = "profiling")]
  crate::profile_log!(EventType::BadgeEvaluation {
    xp: stats.xp,
    streak: stats.streak,
    lessons_completed: stats.lessons_completed,
    earned: earned.len(),
  });

  let new_keys = store.record_earned_badges(user, &earned)?;
  if !new_keys.is_empty() {
    tracing::info!("{} earned badges: {}", user, new_keys.join(", "));
  }
  Ok(new_keys.iter().filter_map(|k| get_badge(k)).collect())
}
