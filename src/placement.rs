//! Placement test classification.
//!
//! Two entry points, kept separate:
//! - [`StagedPlacement`] walks tiers from the lowest up and stops at the
//!   first failed tier.
//! - [`BatchPlacement`] asks a fixed number of questions per tier and then
//!   classifies the whole score table at once with [`classify_batch`].

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{
  BATCH_PARTIAL_COUNT, BATCH_QUESTIONS_PER_TIER, BATCH_SOLID_COUNT, PLACEMENT_PASS_RATIO, STAGED_MIN_ANSWERS,
};
use crate::domain::{PlacementAnswer, PlacementQuestion, Tier, UserId};
use crate::error::{CoreError, Result};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;
use crate::store::ProfileStore;

fn passes(correct: usize, answered: usize) -> bool {
  answered > 0 && correct as f64 / answered as f64 >= PLACEMENT_PASS_RATIO
}

/// Result of recording one staged answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStep {
  /// Keep answering the current tier
  Continue,
  /// Current tier passed; questions now come from this tier
  Advanced(Tier),
  /// Test over with this determined level
  Finished(Tier),
}

// ==================== Staged ====================

/// Tier-by-tier placement that ends at the first failed tier
#[derive(Debug, Clone)]
pub struct StagedPlacement {
  questions: Vec<PlacementQuestion>,
  current: Option<Tier>,
  passed: Option<Tier>,
  answers: Vec<PlacementAnswer>,
  result: Option<Tier>,
}

impl StagedPlacement {
  /// Tiers without questions are skipped. An empty catalog finishes at the
  /// lowest tier straight away.
  pub fn new(questions: Vec<PlacementQuestion>) -> Self {
    let first = Self::first_tier_from(&questions, Tier::LOWEST);
    Self {
      questions,
      current: first,
      passed: None,
      answers: Vec::new(),
      result: if first.is_none() { Some(Tier::LOWEST) } else { None },
    }
  }

  fn first_tier_from(questions: &[PlacementQuestion], from: Tier) -> Option<Tier> {
    Tier::ALL
      .into_iter()
      .filter(|t| *t >= from)
      .find(|t| questions.iter().any(|q| q.tier == *t))
  }

  pub fn current_tier(&self) -> Option<Tier> {
    if self.result.is_some() { None } else { self.current }
  }

  /// Questions of the tier being evaluated
  pub fn current_questions(&self) -> Vec<&PlacementQuestion> {
    match self.current_tier() {
      Some(tier) => self.questions.iter().filter(|q| q.tier == tier).collect(),
      None => Vec::new(),
    }
  }

  /// Answers recorded for the current tier so far
  pub fn current_answers(&self) -> &[PlacementAnswer] {
    &self.answers
  }

  pub fn result(&self) -> Option<Tier> {
    self.result
  }

  pub fn is_finished(&self) -> bool {
    self.result.is_some()
  }

  pub fn record(&mut self, answer: PlacementAnswer) -> Result<PlacementStep> {
    let tier = self
      .current_tier()
      .ok_or_else(|| CoreError::InvalidState("placement test already finished".into()))?;
    let question = self
      .questions
      .iter()
      .find(|q| q.id == answer.question_id)
      .ok_or_else(|| CoreError::InvalidState(format!("unknown question {}", answer.question_id)))?;
    if question.tier != tier || answer.tier != tier {
      return Err(CoreError::InvalidState(format!(
        "answer for {:?} while evaluating {:?}",
        question.tier, tier
      )));
    }
    if self.answers.iter().any(|a| a.question_id == answer.question_id) {
      return Err(CoreError::InvalidState(format!("question {} already answered", answer.question_id)));
    }

    self.answers.push(answer);
    let answered = self.answers.len();
    let correct = self.answers.iter().filter(|a| a.is_correct).count();
    let tier_size = self.questions.iter().filter(|q| q.tier == tier).count();

    let step = if answered >= STAGED_MIN_ANSWERS && !passes(correct, answered) {
      self.fail()
    } else if answered >= tier_size {
      if passes(correct, answered) {
        self.advance(tier)
      } else {
        self.fail()
      }
    } else {
      PlacementStep::Continue
    };

    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::PlacementStep {
      tier: tier.as_u8(),
      answered,
      correct,
      outcome: format!("{:?}", step),
    });

    Ok(step)
  }

  fn fail(&mut self) -> PlacementStep {
    // The last tier that was passed; nothing passed means the lowest tier
    let level = self.passed.unwrap_or(Tier::LOWEST);
    tracing::debug!("Placement ended on failure, level {:?}", level);
    self.result = Some(level);
    PlacementStep::Finished(level)
  }

  fn advance(&mut self, tier: Tier) -> PlacementStep {
    self.passed = Some(tier);
    self.answers.clear();
    match tier.next().and_then(|next| Self::first_tier_from(&self.questions, next)) {
      Some(next) => {
        self.current = Some(next);
        PlacementStep::Advanced(next)
      }
      None => {
        self.result = Some(tier);
        PlacementStep::Finished(tier)
      }
    }
  }
}

// ==================== Batch ====================

/// Correct answers per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTable {
  correct: [usize; 4],
}

impl ScoreTable {
  pub fn from_answers(answers: &[PlacementAnswer]) -> Self {
    let mut table = Self::default();
    for answer in answers.iter().filter(|a| a.is_correct) {
      table.correct[answer.tier.index()] += 1;
    }
    table
  }

  pub fn with_counts(tier1: usize, tier2: usize, tier3: usize, tier4: usize) -> Self {
    Self {
      correct: [tier1, tier2, tier3, tier4],
    }
  }

  pub fn correct(&self, tier: Tier) -> usize {
    self.correct[tier.index()]
  }
}

/// Ordered score-table rules, checked top to bottom:
/// a solid tier places there; a solid Tier1 or Tier2 with a partial tier
/// above places at the tier above; otherwise the lowest tier.
///
/// Tier4 is only reached with a solid Tier4 score, so a solid Tier3 with a
/// partial Tier4 stays at Tier3.
pub fn classify_batch(scores: &ScoreTable) -> Tier {
  let c = |tier| scores.correct(tier);
  if c(Tier::Tier4) >= BATCH_SOLID_COUNT {
    Tier::Tier4
  } else if c(Tier::Tier3) >= BATCH_SOLID_COUNT {
    Tier::Tier3
  } else if c(Tier::Tier2) >= BATCH_SOLID_COUNT && c(Tier::Tier3) >= BATCH_PARTIAL_COUNT {
    Tier::Tier3
  } else if c(Tier::Tier2) >= BATCH_SOLID_COUNT {
    Tier::Tier2
  } else if c(Tier::Tier1) >= BATCH_SOLID_COUNT && c(Tier::Tier2) >= BATCH_PARTIAL_COUNT {
    Tier::Tier2
  } else {
    Tier::Tier1
  }
}

/// Pick up to `BATCH_QUESTIONS_PER_TIER` random questions from each tier,
/// returned lowest tier first.
pub fn pick_batch_questions<R: Rng + ?Sized>(catalog: &[PlacementQuestion], rng: &mut R) -> Vec<PlacementQuestion> {
  let mut picked = Vec::new();
  for tier in Tier::ALL {
    let mut tier_questions: Vec<&PlacementQuestion> = catalog.iter().filter(|q| q.tier == tier).collect();
    tier_questions.shuffle(rng);
    picked.extend(tier_questions.into_iter().take(BATCH_QUESTIONS_PER_TIER).cloned());
  }
  picked
}

/// Fixed question set scored as a whole once every question is answered
#[derive(Debug, Clone)]
pub struct BatchPlacement {
  questions: Vec<PlacementQuestion>,
  answers: Vec<PlacementAnswer>,
}

impl BatchPlacement {
  pub fn new(questions: Vec<PlacementQuestion>) -> Self {
    Self {
      questions,
      answers: Vec::new(),
    }
  }

  pub fn questions(&self) -> &[PlacementQuestion] {
    &self.questions
  }

  /// Next unanswered question in order
  pub fn next_question(&self) -> Option<&PlacementQuestion> {
    let answered: HashSet<&str> = self.answers.iter().map(|a| a.question_id.as_str()).collect();
    self.questions.iter().find(|q| !answered.contains(q.id.as_str()))
  }

  pub fn record(&mut self, answer: PlacementAnswer) -> Result<()> {
    if !self.questions.iter().any(|q| q.id == answer.question_id) {
      return Err(CoreError::InvalidState(format!("unknown question {}", answer.question_id)));
    }
    if self.answers.iter().any(|a| a.question_id == answer.question_id) {
      return Err(CoreError::InvalidState(format!("question {} already answered", answer.question_id)));
    }
    self.answers.push(answer);
    Ok(())
  }

  pub fn is_complete(&self) -> bool {
    self.answers.len() == self.questions.len()
  }

  pub fn scores(&self) -> ScoreTable {
    ScoreTable::from_answers(&self.answers)
  }

  /// Determined level; only available once every question is answered
  pub fn finish(&self) -> Result<Tier> {
    if !self.is_complete() {
      return Err(CoreError::InvalidState(format!(
        "{} of {} placement questions answered",
        self.answers.len(),
        self.questions.len()
      )));
    }
    let level = classify_batch(&self.scores());
    tracing::debug!("Batch placement scored {:?}, level {:?}", self.scores(), level);
    Ok(level)
  }
}

/// Persist the determined level to the learner's profile
pub fn save_determined_level<P: ProfileStore + ?Sized>(store: &P, user: Option<&UserId>, level: Tier) -> Result<()> {
  let user = user.ok_or(CoreError::NotAuthenticated)?;
  store.set_determined_level(user, level).map_err(|e| {
    tracing::warn!("Failed to save determined level for {}: {}", user, e);
    e
  })?;
  tracing::info!("Determined level for {}: {:?}", user, level);
  Ok(())
}
