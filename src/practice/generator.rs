//! Multiple choice exercise generation.
//!
//! Each target item becomes one or more questions with one correct answer
//! and two distractors. Distractors are drawn from the reference pool in
//! priority order: same category, then same tier, then anything. Every
//! priority level is shuffled before drawing and no item or answer text is
//! used twice in one question.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use unicode_normalization::UnicodeNormalization;

use crate::config::{DISTRACTOR_COUNT, MIN_POOL_SIZE, OPTION_COUNT, SPEED_ROUND_EVERY, SPEED_ROUND_SECS, SPEED_ROUND_START};
use crate::domain::{Exercise, ExerciseType, ItemId, LearnableItem, SpeedRound};
use crate::error::{CoreError, Result};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;

/// Placeholder shown in place of the answer in a cloze sentence
pub const CLOZE_BLANK: &str = "____";

/// How many questions each target item turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
  /// One question per item; even positions ask source→target, odd ones target→source
  Alternating,
  /// Both directions per item, plus a cloze question when the item has a usable example
  Variants,
}

/// Order of the finished question list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrder {
  /// Whole batch shuffled
  Shuffled,
  /// Kept in item order (options are still shuffled per question)
  ItemOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
  pub expansion: Expansion,
  pub order: QuestionOrder,
  /// Flag every speed-round position with a countdown
  pub speed_rounds: bool,
}

impl GeneratorOptions {
  /// Timed quiz: one question per item, full batch shuffled, speed rounds on
  pub fn timed_quiz() -> Self {
    Self {
      expansion: Expansion::Alternating,
      order: QuestionOrder::Shuffled,
      speed_rounds: true,
    }
  }

  /// Lesson drill: single pass in item order, no countdowns
  pub fn lesson_drill() -> Self {
    Self {
      expansion: Expansion::Alternating,
      order: QuestionOrder::ItemOrder,
      speed_rounds: false,
    }
  }

  /// Lesson batch: every direction plus cloze, shuffled, speed rounds on
  pub fn lesson_batch() -> Self {
    Self {
      expansion: Expansion::Variants,
      order: QuestionOrder::Shuffled,
      speed_rounds: true,
    }
  }
}

/// Case, whitespace and Unicode-composition insensitive form of an answer
pub fn normalize_answer(text: &str) -> String {
  text
    .nfc()
    .collect::<String>()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Whether the question at `index` (0-based, final order) is a speed round
pub fn is_speed_round(index: usize) -> bool {
  index >= SPEED_ROUND_START && (index - SPEED_ROUND_START) % SPEED_ROUND_EVERY == 0
}

/// Build the question set for `targets`, drawing distractors from
/// `targets` ∪ `reference`.
pub fn generate_exercises<R: Rng + ?Sized>(
  targets: &[LearnableItem],
  reference: &[LearnableItem],
  options: &GeneratorOptions,
  rng: &mut R,
) -> Result<Vec<Exercise>> {
  let pool = merge_pool(targets, reference);
  if targets.is_empty() || pool.len() < MIN_POOL_SIZE {
    tracing::debug!(
      "Cannot generate exercises: {} targets, {} distinct items",
      targets.len(),
      pool.len()
    );
    return Err(CoreError::InsufficientPool {
      available: pool.len(),
      required: MIN_POOL_SIZE,
    });
  }

  let mut exercises = Vec::new();
  for (index, item) in targets.iter().enumerate() {
    for exercise_type in question_types(item, index, options.expansion) {
      let seq = exercises.len();
      exercises.push(build_exercise(item, exercise_type, &pool, seq, rng)?);
    }
  }

  if options.order == QuestionOrder::Shuffled {
    exercises.shuffle(rng);
  }

  if options.speed_rounds {
    for (index, exercise) in exercises.iter_mut().enumerate() {
      if is_speed_round(index) {
        exercise.speed_round = Some(SpeedRound {
          seconds: SPEED_ROUND_SECS,
        });
      }
    }
  }

  #[cfg(feature = "profiling")]
  crate::profile_log!(EventType::ExerciseGeneration {
    targets: targets.len(),
    pool: pool.len(),
    questions: exercises.len(),
  });

  tracing::debug!(
    "Generated {} exercises from {} targets",
    exercises.len(),
    targets.len()
  );
  Ok(exercises)
}

/// Deduplicate by id, targets first
fn merge_pool<'a>(targets: &'a [LearnableItem], reference: &'a [LearnableItem]) -> Vec<&'a LearnableItem> {
  let mut seen: HashSet<ItemId> = HashSet::new();
  targets
    .iter()
    .chain(reference.iter())
    .filter(|item| seen.insert(item.id))
    .collect()
}

fn question_types(item: &LearnableItem, index: usize, expansion: Expansion) -> Vec<ExerciseType> {
  match expansion {
    Expansion::Alternating => {
      if index % 2 == 0 {
        vec![ExerciseType::SourceToTarget]
      } else {
        vec![ExerciseType::TargetToSource]
      }
    }
    Expansion::Variants => {
      let mut types = vec![ExerciseType::SourceToTarget, ExerciseType::TargetToSource];
      if cloze_sentence(item).is_some() {
        types.push(ExerciseType::Cloze);
      }
      types
    }
  }
}

/// Example sentence with the target text blanked out, if it contains it
fn cloze_sentence(item: &LearnableItem) -> Option<String> {
  let sentence: String = item.example_sentence.as_deref()?.nfc().collect();
  let target: String = item.target_text.trim().nfc().collect();
  if target.is_empty() || !sentence.contains(&target) {
    return None;
  }
  Some(sentence.replacen(&target, CLOZE_BLANK, 1))
}

fn build_exercise<R: Rng + ?Sized>(
  item: &LearnableItem,
  exercise_type: ExerciseType,
  pool: &[&LearnableItem],
  seq: usize,
  rng: &mut R,
) -> Result<Exercise> {
  let question = match exercise_type {
    ExerciseType::SourceToTarget => item.source_text.clone(),
    ExerciseType::TargetToSource => item.target_text.clone(),
    ExerciseType::Cloze => cloze_sentence(item).unwrap_or_else(|| item.source_text.clone()),
  };
  let correct_answer = exercise_type.answer_text(item).to_string();
  let distractors = pick_distractors(item, exercise_type, pool, rng)?;

  let mut options = Vec::with_capacity(OPTION_COUNT);
  options.push(correct_answer.clone());
  options.extend(distractors);
  options.shuffle(rng);

  Ok(Exercise {
    id: format!("{}-{}-{}", item.id, exercise_type.as_str(), seq),
    exercise_type,
    question,
    correct_answer,
    options,
    item_id: item.id,
    speed_round: None,
  })
}

/// Distractor sourcing priority
#[derive(Debug, Clone, Copy)]
enum Affinity {
  SameCategory,
  SameTier,
  Any,
}

impl Affinity {
  const ORDER: [Affinity; 3] = [Affinity::SameCategory, Affinity::SameTier, Affinity::Any];

  fn matches(&self, item: &LearnableItem, candidate: &LearnableItem) -> bool {
    match self {
      Self::SameCategory => item.category.is_some() && candidate.category == item.category,
      Self::SameTier => item.tier.is_some() && candidate.tier == item.tier,
      Self::Any => true,
    }
  }
}

fn pick_distractors<R: Rng + ?Sized>(
  item: &LearnableItem,
  exercise_type: ExerciseType,
  pool: &[&LearnableItem],
  rng: &mut R,
) -> Result<Vec<String>> {
  let mut seen_answers: HashSet<String> = HashSet::new();
  seen_answers.insert(normalize_answer(exercise_type.answer_text(item)));
  let mut used: HashSet<ItemId> = HashSet::new();
  used.insert(item.id);
  let mut distractors = Vec::with_capacity(DISTRACTOR_COUNT);

  for affinity in Affinity::ORDER {
    if distractors.len() == DISTRACTOR_COUNT {
      break;
    }

    let mut candidates: Vec<&LearnableItem> = pool
      .iter()
      .copied()
      .filter(|c| !used.contains(&c.id) && affinity.matches(item, c))
      .collect();
    candidates.shuffle(rng);

    for candidate in candidates {
      if distractors.len() == DISTRACTOR_COUNT {
        break;
      }
      let text = exercise_type.answer_text(candidate);
      let key = normalize_answer(text);
      if key.is_empty() || !seen_answers.insert(key) {
        continue;
      }
      used.insert(candidate.id);
      distractors.push(text.to_string());
    }
  }

  if distractors.len() < DISTRACTOR_COUNT {
    tracing::debug!(
      "Item {} has only {} usable distractors",
      item.id,
      distractors.len()
    );
    return Err(CoreError::InsufficientPool {
      available: distractors.len() + 1,
      required: OPTION_COUNT,
    });
  }
  Ok(distractors)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ItemKind, Tier};
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn word(id: i64, source: &str, target: &str, category: &str, tier: Tier) -> LearnableItem {
    LearnableItem::new(id, ItemKind::Word, source, target)
      .with_category(category)
      .with_tier(tier)
  }

  fn catalog() -> Vec<LearnableItem> {
    vec![
      word(1, "dog", "perro", "animals", Tier::Tier1),
      word(2, "cat", "gato", "animals", Tier::Tier1),
      word(3, "bird", "pájaro", "animals", Tier::Tier2),
      word(4, "apple", "manzana", "food", Tier::Tier1),
      word(5, "bread", "pan", "food", Tier::Tier1),
      word(6, "water", "agua", "food", Tier::Tier2),
      word(7, "house", "casa", "places", Tier::Tier3),
      word(8, "school", "escuela", "places", Tier::Tier3),
    ]
  }

  fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
  }

  fn assert_well_formed(exercise: &Exercise) {
    assert_eq!(exercise.options.len(), OPTION_COUNT);
    let correct = exercise
      .options
      .iter()
      .filter(|o| **o == exercise.correct_answer)
      .count();
    assert_eq!(correct, 1, "exactly one correct option in {:?}", exercise.options);
    let distinct: HashSet<String> = exercise.options.iter().map(|o| normalize_answer(o)).collect();
    assert_eq!(distinct.len(), OPTION_COUNT, "options distinct in {:?}", exercise.options);
  }

  #[test]
  fn test_options_distinct_with_one_correct() {
    let items = catalog();
    for seed in 0..50 {
      let mut rng = StdRng::seed_from_u64(seed);
      let exercises =
        generate_exercises(&items, &[], &GeneratorOptions::timed_quiz(), &mut rng).unwrap();
      assert_eq!(exercises.len(), items.len());
      exercises.iter().for_each(assert_well_formed);
    }
  }

  #[test]
  fn test_small_pool_is_insufficient() {
    let items = catalog();
    for n in 0..=3 {
      let err = generate_exercises(&items[..n], &[], &GeneratorOptions::lesson_drill(), &mut rng())
        .unwrap_err();
      assert!(
        matches!(err, CoreError::InsufficientPool { available, required: 4 } if available == n),
        "pool of {} gave {:?}",
        n,
        err
      );
    }
  }

  #[test]
  fn test_reference_pool_counts_toward_minimum() {
    let items = catalog();
    let exercises =
      generate_exercises(&items[..1], &items[1..4], &GeneratorOptions::lesson_drill(), &mut rng())
        .unwrap();
    assert_eq!(exercises.len(), 1);
    assert_well_formed(&exercises[0]);
  }

  #[test]
  fn test_duplicate_ids_counted_once() {
    let items = catalog();
    let reference = vec![items[0].clone(), items[1].clone(), items[2].clone()];
    let err = generate_exercises(&items[..3], &reference, &GeneratorOptions::lesson_drill(), &mut rng())
      .unwrap_err();
    assert!(matches!(err, CoreError::InsufficientPool { available: 3, .. }));
  }

  #[test]
  fn test_duplicate_answer_texts_never_fill_options() {
    // Four items but only two distinct target texts
    let items = vec![
      word(1, "hello", "hola", "greetings", Tier::Tier1),
      word(2, "hi", "hola", "greetings", Tier::Tier1),
      word(3, "hey", "Hola ", "greetings", Tier::Tier1),
      word(4, "bye", "adiós", "greetings", Tier::Tier1),
    ];
    let options = GeneratorOptions {
      expansion: Expansion::Alternating,
      order: QuestionOrder::ItemOrder,
      speed_rounds: false,
    };
    let err = generate_exercises(&items[..1], &items, &options, &mut rng()).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientPool { available: 2, required: 3 }));
  }

  #[test]
  fn test_alternating_directions_in_item_order() {
    let items = catalog();
    let exercises =
      generate_exercises(&items, &[], &GeneratorOptions::lesson_drill(), &mut rng()).unwrap();

    for (index, (exercise, item)) in exercises.iter().zip(items.iter()).enumerate() {
      assert_eq!(exercise.item_id, item.id);
      if index % 2 == 0 {
        assert_eq!(exercise.exercise_type, ExerciseType::SourceToTarget);
        assert_eq!(exercise.question, item.source_text);
        assert_eq!(exercise.correct_answer, item.target_text);
      } else {
        assert_eq!(exercise.exercise_type, ExerciseType::TargetToSource);
        assert_eq!(exercise.question, item.target_text);
        assert_eq!(exercise.correct_answer, item.source_text);
      }
      assert!(exercise.speed_round.is_none());
    }
  }

  #[test]
  fn test_same_category_preferred() {
    let items = catalog();
    // dog: animals has cat and bird, exactly two candidates
    for seed in 0..20 {
      let mut rng = StdRng::seed_from_u64(seed);
      let exercises =
        generate_exercises(&items[..1], &items, &GeneratorOptions::lesson_drill(), &mut rng).unwrap();
      let mut distractors: Vec<&String> = exercises[0]
        .options
        .iter()
        .filter(|o| **o != "perro")
        .collect();
      distractors.sort();
      assert_eq!(distractors, vec!["gato", "pájaro"]);
    }
  }

  #[test]
  fn test_same_tier_fills_after_category() {
    let items = vec![
      word(1, "house", "casa", "places", Tier::Tier3),
      word(2, "school", "escuela", "places", Tier::Tier3),
      word(3, "idea", "idea", "abstract", Tier::Tier3),
      word(4, "dog", "perro", "animals", Tier::Tier1),
      word(5, "cat", "gato", "animals", Tier::Tier1),
    ];
    for seed in 0..20 {
      let mut rng = StdRng::seed_from_u64(seed);
      let exercises =
        generate_exercises(&items[..1], &items, &GeneratorOptions::lesson_drill(), &mut rng).unwrap();
      let options = &exercises[0].options;
      assert!(options.contains(&"escuela".to_string()));
      assert!(options.contains(&"idea".to_string()));
    }
  }

  #[test]
  fn test_lesson_batch_expands_variants_and_cloze() {
    let mut items = catalog();
    items[0] = items[0].clone().with_example("El perro come.", Some("The dog eats."));
    // Sentence without the target text gets no cloze
    items[1] = items[1].clone().with_example("Un felino.", None);

    let options = GeneratorOptions {
      expansion: Expansion::Variants,
      order: QuestionOrder::ItemOrder,
      speed_rounds: false,
    };
    let exercises = generate_exercises(&items[..2], &items, &options, &mut rng()).unwrap();
    let types: Vec<(i64, ExerciseType)> =
      exercises.iter().map(|e| (e.item_id, e.exercise_type)).collect();
    assert_eq!(
      types,
      vec![
        (1, ExerciseType::SourceToTarget),
        (1, ExerciseType::TargetToSource),
        (1, ExerciseType::Cloze),
        (2, ExerciseType::SourceToTarget),
        (2, ExerciseType::TargetToSource),
      ]
    );

    let cloze = &exercises[2];
    assert_eq!(cloze.question, "El ____ come.");
    assert_eq!(cloze.correct_answer, "perro");
    assert_well_formed(cloze);

    let ids: HashSet<&String> = exercises.iter().map(|e| &e.id).collect();
    assert_eq!(ids.len(), exercises.len());
  }

  #[test]
  fn test_shuffled_batch_keeps_every_question() {
    let items = catalog();
    let exercises =
      generate_exercises(&items, &[], &GeneratorOptions::lesson_batch(), &mut rng()).unwrap();
    assert_eq!(exercises.len(), items.len() * 2);
    for item in &items {
      assert_eq!(exercises.iter().filter(|e| e.item_id == item.id).count(), 2);
    }
  }

  #[test]
  fn test_speed_round_positions() {
    let flagged: Vec<usize> = (0..15).filter(|i| is_speed_round(*i)).collect();
    assert_eq!(flagged, vec![5, 8, 11, 14]);

    let items = catalog();
    let exercises =
      generate_exercises(&items, &[], &GeneratorOptions::lesson_batch(), &mut rng()).unwrap();
    for (index, exercise) in exercises.iter().enumerate() {
      assert_eq!(exercise.speed_round.is_some(), is_speed_round(index));
    }
    assert_eq!(exercises[5].speed_round, Some(SpeedRound { seconds: SPEED_ROUND_SECS }));
  }

  #[test]
  fn test_normalize_answer() {
    assert_eq!(normalize_answer("  Buenos   Días "), "buenos días");
    // Decomposed "é" matches the composed form
    assert_eq!(normalize_answer("cafe\u{301}"), normalize_answer("caf\u{e9}"));
    assert_eq!(normalize_answer("   "), "");
  }

  #[test]
  fn test_same_seed_same_output() {
    let items = catalog();
    let a = generate_exercises(&items, &[], &GeneratorOptions::timed_quiz(), &mut rng()).unwrap();
    let b = generate_exercises(&items, &[], &GeneratorOptions::timed_quiz(), &mut rng()).unwrap();
    assert_eq!(a, b);
  }
}
