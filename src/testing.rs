//! Test utilities for database setup.
//!
//! Builds a file-backed store through the same `init_db` path the host binary
//! uses, seeded with a small Spanish catalog.

use std::path::Path;
use tempfile::TempDir;

use crate::db::SqliteStore;
use crate::domain::{ItemKind, LearnableItem, PlacementQuestion, Tier};
use crate::error::{CoreError, Result};

/// Temporary directory plus a migrated, seeded `SqliteStore`.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Kept alive for the database file
    pub temp: TempDir,
    pub store: SqliteStore,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let env = Self::empty()?;
        env.store.insert_items(&sample_items())?;
        Ok(env)
    }

    /// Migrated store with no catalog items
    pub fn empty() -> Result<Self> {
        let temp = TempDir::new().map_err(|e| CoreError::StorageUnavailable(e.to_string()))?;
        let store = SqliteStore::open(&temp.path().join("lingo.db"))?;
        Ok(Self { temp, store })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

fn item(id: i64, source: &str, target: &str, category: &str, tier: Tier) -> LearnableItem {
    LearnableItem::new(id, ItemKind::Word, source, target)
        .with_category(category)
        .with_tier(tier)
}

/// Eight words over three categories and three tiers, two with example sentences
pub fn sample_items() -> Vec<LearnableItem> {
    vec![
        item(1, "dog", "perro", "animals", Tier::Tier1)
            .with_example("El perro duerme.", Some("The dog sleeps.")),
        item(2, "cat", "gato", "animals", Tier::Tier1),
        item(3, "bird", "pájaro", "animals", Tier::Tier2),
        item(4, "apple", "manzana", "food", Tier::Tier1)
            .with_example("Quiero una manzana.", Some("I want an apple.")),
        item(5, "bread", "pan", "food", Tier::Tier1),
        item(6, "water", "agua", "food", Tier::Tier2),
        item(7, "house", "casa", "places", Tier::Tier3),
        LearnableItem::new(8, ItemKind::Phrase, "good morning", "buenos días")
            .with_category("greetings")
            .with_tier(Tier::Tier1),
    ]
}

/// `per_tier` questions for every tier; the correct option is always "right"
pub fn sample_placement_questions(per_tier: usize) -> Vec<PlacementQuestion> {
    Tier::ALL
        .into_iter()
        .flat_map(|tier| {
            (0..per_tier).map(move |i| PlacementQuestion {
                id: format!("t{}-q{}", tier.as_u8(), i),
                tier,
                prompt: format!("Tier {} question {}", tier.as_u8(), i + 1),
                options: vec!["right".into(), "wrong".into(), "other".into()],
                correct_answer: "right".into(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemFilter, UserId};
    use crate::badges::{award_badges, LearnerStats};
    use crate::domain::{ProgressFilter, Response};
    use crate::practice::{generate_exercises, GeneratorOptions, LessonSession, Pool, ProgressTracker};
    use crate::store::{ContentStore, ProgressStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_env_is_seeded() {
        let env = TestEnv::new().unwrap();
        assert!(env.path().join("lingo.db").exists());
        let items = env.store.fetch_items(&ItemFilter::default()).unwrap();
        assert_eq!(items.len(), sample_items().len());
    }

    #[test]
    fn test_new_items_drill_end_to_end() {
        let env = TestEnv::new().unwrap();
        let user = UserId::new("learner");
        let tracker = ProgressTracker::new(&env.store, Some(&user));
        tracker.learn(1).unwrap();
        tracker.skip(2).unwrap();

        let fresh = tracker
            .fetch_pool(&env.store, &ItemFilter::default(), Pool::New)
            .unwrap();
        assert!(fresh.iter().all(|i| i.id != 1 && i.id != 2));

        let reference = env.store.fetch_items(&ItemFilter::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let exercises =
            generate_exercises(&fresh, &reference, &GeneratorOptions::lesson_drill(), &mut rng).unwrap();
        assert_eq!(exercises.len(), fresh.len());
        for exercise in &exercises {
            assert_eq!(exercise.options.len(), 3);
            assert!(exercise.options.contains(&exercise.correct_answer));
        }
    }

    #[test]
    fn test_lesson_flow_awards_badges() {
        let env = TestEnv::new().unwrap();
        let user = UserId::new("learner");
        let tracker = ProgressTracker::new(&env.store, Some(&user));

        let fresh = tracker
            .fetch_pool(&env.store, &ItemFilter::default(), Pool::New)
            .unwrap();
        assert_eq!(fresh.len(), sample_items().len());

        let reference = env.store.fetch_items(&ItemFilter::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let exercises =
            generate_exercises(&fresh, &reference, &GeneratorOptions::lesson_drill(), &mut rng).unwrap();

        let mut session = LessonSession::new(false);
        for exercise in &exercises {
            let response = Response::choice(exercise.correct_answer.clone());
            assert!(session.answer(exercise, &response, 0).unwrap().is_correct);
            tracker.learn(exercise.item_id).unwrap();
        }
        // Four answers at base 10, then four with the combo bonus
        assert_eq!(session.xp(), 100);

        let records = env.store.list_progress(&user, ProgressFilter::All).unwrap();
        assert_eq!(records.len(), sample_items().len());
        assert!(records.iter().all(|r| r.mastery_level == 1));
        let learned = tracker
            .fetch_pool(&env.store, &ItemFilter::default(), Pool::Learned)
            .unwrap();
        assert_eq!(learned.len(), sample_items().len());

        let stats = LearnerStats::new(session.xp(), 0, 1);
        let awarded: Vec<&str> = award_badges(&env.store, Some(&user), &stats)
            .unwrap()
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(awarded, vec!["xp_100", "lessons_1"]);
        assert!(award_badges(&env.store, Some(&user), &stats).unwrap().is_empty());
    }

    #[test]
    fn test_placement_fixture() {
        let questions = sample_placement_questions(5);
        assert_eq!(questions.len(), 20);
        assert!(questions.iter().all(|q| q.options.contains(&q.correct_answer)));
    }
}
