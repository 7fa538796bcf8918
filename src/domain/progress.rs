use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{ItemId, UserId};
use crate::config::MASTERED_THRESHOLD;

/// Per (user, item) learning progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
  pub user_id: UserId,
  pub item_id: ItemId,
  /// 0..=MASTERED_THRESHOLD
  pub mastery_level: u8,
  pub times_practiced: u32,
  pub is_difficult: bool,
  /// Soft "skip forever"
  pub is_deleted: bool,
  pub last_practiced: Option<DateTime<Utc>>,
}

impl ProgressRecord {
  /// A record that exists but has not been practiced yet (created by skip / mark difficult)
  pub fn new(user_id: UserId, item_id: ItemId) -> Self {
    Self {
      user_id,
      item_id,
      mastery_level: 0,
      times_practiced: 0,
      is_difficult: false,
      is_deleted: false,
      last_practiced: None,
    }
  }

  pub fn is_learned(&self) -> bool {
    self.mastery_level >= 1 && !self.is_deleted
  }

  pub fn is_mastered(&self) -> bool {
    self.mastery_level >= MASTERED_THRESHOLD
  }

  pub fn bucket(&self) -> MasteryBucket {
    if self.is_deleted {
      MasteryBucket::Skipped
    } else if self.is_difficult {
      MasteryBucket::Difficult
    } else if self.is_mastered() {
      MasteryBucket::Mastered
    } else if self.mastery_level >= 1 {
      MasteryBucket::Learned
    } else {
      MasteryBucket::Learning
    }
  }
}

/// Coarse classification of an item for one learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasteryBucket {
  /// No progress record
  New,
  /// Record exists, never practiced to level 1
  Learning,
  Learned,
  Mastered,
  Difficult,
  Skipped,
}

/// Which progress records a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFilter {
  All,
  /// mastery >= 1 and not deleted
  Learned,
  /// mastery >= MASTERED_THRESHOLD and not deleted
  Mastered,
  /// flagged difficult and not deleted
  Difficult,
  Skipped,
}

impl ProgressFilter {
  pub fn matches(&self, record: &ProgressRecord) -> bool {
    match self {
      Self::All => true,
      Self::Learned => record.is_learned(),
      Self::Mastered => record.is_mastered() && !record.is_deleted,
      Self::Difficult => record.is_difficult && !record.is_deleted,
      Self::Skipped => record.is_deleted,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(level: u8) -> ProgressRecord {
    let mut r = ProgressRecord::new(UserId::new("u1"), 7);
    r.mastery_level = level;
    r
  }

  #[test]
  fn test_new_record_defaults() {
    let r = ProgressRecord::new(UserId::new("u1"), 7);
    assert_eq!(r.mastery_level, 0);
    assert_eq!(r.times_practiced, 0);
    assert!(!r.is_difficult);
    assert!(!r.is_deleted);
    assert!(r.last_practiced.is_none());
    assert_eq!(r.bucket(), MasteryBucket::Learning);
  }

  #[test]
  fn test_buckets() {
    assert_eq!(record(1).bucket(), MasteryBucket::Learned);
    assert_eq!(record(MASTERED_THRESHOLD).bucket(), MasteryBucket::Mastered);

    let mut difficult = record(2);
    difficult.is_difficult = true;
    assert_eq!(difficult.bucket(), MasteryBucket::Difficult);

    let mut skipped = record(3);
    skipped.is_deleted = true;
    skipped.is_difficult = true;
    assert_eq!(skipped.bucket(), MasteryBucket::Skipped);
  }

  #[test]
  fn test_filters() {
    let mut skipped = record(2);
    skipped.is_deleted = true;

    assert!(ProgressFilter::Learned.matches(&record(1)));
    assert!(!ProgressFilter::Learned.matches(&record(0)));
    assert!(!ProgressFilter::Learned.matches(&skipped));
    assert!(ProgressFilter::Skipped.matches(&skipped));
    assert!(ProgressFilter::Mastered.matches(&record(MASTERED_THRESHOLD)));
    assert!(!ProgressFilter::Mastered.matches(&record(MASTERED_THRESHOLD - 1)));
    assert!(ProgressFilter::All.matches(&skipped));
  }

  #[test]
  fn test_skipped_excluded_from_mastered_and_difficult() {
    let mut skipped = record(MASTERED_THRESHOLD);
    skipped.is_difficult = true;
    skipped.is_deleted = true;

    assert!(!ProgressFilter::Mastered.matches(&skipped));
    assert!(!ProgressFilter::Difficult.matches(&skipped));
    assert!(ProgressFilter::Skipped.matches(&skipped));
  }
}
