//! Mastery progression and the item pools built from it.

use std::collections::HashMap;

use chrono::Utc;

use crate::config::MASTERED_THRESHOLD;
use crate::domain::{
  ItemFilter, ItemId, LearnableItem, MasteryBucket, ProgressFilter, ProgressRecord, UserId,
};
use crate::error::{CoreError, Result};
use crate::store::{ContentStore, ProgressStore};

/// Why an item was practiced; decides what happens to its mastery level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeAction {
  /// Item studied in a lesson: mastery becomes at least 1
  Learn,
  /// Correct drill answer: mastery +1 up to the ceiling
  DrillCorrect,
  /// Wrong drill answer: counters only
  DrillIncorrect,
}

/// Item pools the generator draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
  /// mastery >= 1, not skipped
  Learned,
  /// no progress record yet
  New,
  /// mastery >= MASTERED_THRESHOLD
  Mastered,
  Difficult,
}

/// Apply a practice action to an existing record
pub fn apply_practice(record: &mut ProgressRecord, action: PracticeAction) {
  record.times_practiced = record.times_practiced.saturating_add(1);
  record.last_practiced = Some(Utc::now());
  match action {
    PracticeAction::Learn => record.mastery_level = record.mastery_level.max(1),
    PracticeAction::DrillCorrect => {
      record.mastery_level = (record.mastery_level + 1).min(MASTERED_THRESHOLD)
    }
    PracticeAction::DrillIncorrect => {}
  }
}

/// First practice of an item
pub fn first_practice(user: &UserId, item_id: ItemId) -> ProgressRecord {
  ProgressRecord {
    user_id: user.clone(),
    item_id,
    mastery_level: 1,
    times_practiced: 1,
    is_difficult: false,
    is_deleted: false,
    last_practiced: Some(Utc::now()),
  }
}

/// Pick the items belonging to `pool` given the learner's records
pub fn select_pool(items: &[LearnableItem], records: &[ProgressRecord], pool: Pool) -> Vec<LearnableItem> {
  let by_item: HashMap<ItemId, &ProgressRecord> = records.iter().map(|r| (r.item_id, r)).collect();
  items
    .iter()
    .filter(|item| {
      let record = by_item.get(&item.id);
      match pool {
        Pool::New => record.is_none(),
        Pool::Learned => record.is_some_and(|r| ProgressFilter::Learned.matches(r)),
        Pool::Mastered => record.is_some_and(|r| ProgressFilter::Mastered.matches(r)),
        Pool::Difficult => record.is_some_and(|r| ProgressFilter::Difficult.matches(r)),
      }
    })
    .cloned()
    .collect()
}

/// Bucket counts over a set of items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSummary {
  pub total: i64,
  pub new_items: i64,
  pub learning: i64,
  pub learned: i64,
  pub mastered: i64,
  pub difficult: i64,
  pub skipped: i64,
}

impl ProgressSummary {
  /// Share of non-skipped items that are learned or better
  pub fn percentage(&self) -> i64 {
    let active = self.total - self.skipped;
    if active > 0 {
      ((self.learned + self.mastered + self.difficult) * 100) / active
    } else {
      0
    }
  }
}

pub fn summarize(items: &[LearnableItem], records: &[ProgressRecord]) -> ProgressSummary {
  let by_item: HashMap<ItemId, &ProgressRecord> = records.iter().map(|r| (r.item_id, r)).collect();
  let mut summary = ProgressSummary {
    total: items.len() as i64,
    ..Default::default()
  };
  for item in items {
    let bucket = by_item
      .get(&item.id)
      .map(|r| r.bucket())
      .unwrap_or(MasteryBucket::New);
    match bucket {
      MasteryBucket::New => summary.new_items += 1,
      MasteryBucket::Learning => summary.learning += 1,
      MasteryBucket::Learned => summary.learned += 1,
      MasteryBucket::Mastered => summary.mastered += 1,
      MasteryBucket::Difficult => summary.difficult += 1,
      MasteryBucket::Skipped => summary.skipped += 1,
    }
  }
  summary
}

/// Progress operations for the signed-in learner
pub struct ProgressTracker<'a, P: ProgressStore + ?Sized> {
  store: &'a P,
  user: Option<&'a UserId>,
}

impl<'a, P: ProgressStore + ?Sized> ProgressTracker<'a, P> {
  pub fn new(store: &'a P, user: Option<&'a UserId>) -> Self {
    Self { store, user }
  }

  fn user(&self) -> Result<&'a UserId> {
    self.user.ok_or(CoreError::NotAuthenticated)
  }

  /// Count a practice of `item_id`, creating the record at mastery 1 on first sight
  pub fn record_practice(&self, item_id: ItemId, action: PracticeAction) -> Result<ProgressRecord> {
    let user = self.user()?;
    let record = match self.store.get_progress(user, item_id)? {
      Some(mut existing) => {
        apply_practice(&mut existing, action);
        existing
      }
      None => first_practice(user, item_id),
    };
    self.save(&record)?;
    Ok(record)
  }

  pub fn learn(&self, item_id: ItemId) -> Result<ProgressRecord> {
    self.record_practice(item_id, PracticeAction::Learn)
  }

  pub fn drill_correct(&self, item_id: ItemId) -> Result<ProgressRecord> {
    self.record_practice(item_id, PracticeAction::DrillCorrect)
  }

  /// Idempotent; leaves mastery alone
  pub fn mark_difficult(&self, item_id: ItemId, flag: bool) -> Result<ProgressRecord> {
    self.update_flags(item_id, |r| r.is_difficult = flag)
  }

  /// Hide the item from new-item queries until restored
  pub fn skip(&self, item_id: ItemId) -> Result<ProgressRecord> {
    self.update_flags(item_id, |r| r.is_deleted = true)
  }

  pub fn restore(&self, item_id: ItemId) -> Result<ProgressRecord> {
    self.update_flags(item_id, |r| r.is_deleted = false)
  }

  /// Items from `items` that fall in `pool` for this learner
  pub fn pool(&self, items: &[LearnableItem], pool: Pool) -> Result<Vec<LearnableItem>> {
    let user = self.user()?;
    let records = self.store.list_progress(user, ProgressFilter::All)?;
    Ok(select_pool(items, &records, pool))
  }

  /// Fetch catalog items and narrow them to `pool`
  pub fn fetch_pool<C: ContentStore + ?Sized>(
    &self,
    content: &C,
    filter: &ItemFilter,
    pool: Pool,
  ) -> Result<Vec<LearnableItem>> {
    let items = content.fetch_items(filter)?;
    self.pool(&items, pool)
  }

  pub fn summary(&self, items: &[LearnableItem]) -> Result<ProgressSummary> {
    let user = self.user()?;
    let records = self.store.list_progress(user, ProgressFilter::All)?;
    Ok(summarize(items, &records))
  }

  fn update_flags(&self, item_id: ItemId, update: impl FnOnce(&mut ProgressRecord)) -> Result<ProgressRecord> {
    let user = self.user()?;
    let mut record = self
      .store
      .get_progress(user, item_id)?
      .unwrap_or_else(|| ProgressRecord::new(user.clone(), item_id));
    update(&mut record);
    self.save(&record)?;
    Ok(record)
  }

  fn save(&self, record: &ProgressRecord) -> Result<()> {
    self.store.upsert_progress(record).map_err(|e| {
      tracing::warn!("Failed to save progress for item {}: {}", record.item_id, e);
      e
    })
  }
}
