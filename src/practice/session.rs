//! Lesson flow scoring: combo counter, XP rewards and hearts.
//!
//! The plain drill flow only touches mastery; lessons additionally reward
//! correct answers and charge a heart for every miss unless the learner is
//! premium.

use crate::config::{BASE_REWARD, COMBO_BONUSES, MAX_HEARTS, SPEED_BONUSES};
use crate::domain::{Exercise, Response};
use crate::error::{CoreError, Result};

/// XP for a correct answer given the combo reached by it and the seconds
/// left on a speed round (None for untimed questions)
pub fn calculate_reward(combo: u32, seconds_left: Option<u32>) -> u32 {
  let combo_bonus = COMBO_BONUSES
    .iter()
    .find(|(threshold, _)| combo >= *threshold)
    .map(|(_, bonus)| *bonus)
    .unwrap_or(0);

  let speed_bonus = seconds_left
    .and_then(|left| {
      SPEED_BONUSES
        .iter()
        .find(|(threshold, _)| left >= *threshold)
        .map(|(_, bonus)| *bonus)
    })
    .unwrap_or(0);

  BASE_REWARD + combo_bonus + speed_bonus
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
  pub is_correct: bool,
  /// XP added by this answer
  pub reward: u32,
  pub combo: u32,
  /// None for premium sessions
  pub hearts_left: Option<u32>,
  /// No hearts remain; the session refuses further answers
  pub blocked: bool,
}

/// Running score of one lesson
#[derive(Debug, Clone)]
pub struct LessonSession {
  combo: u32,
  best_combo: u32,
  hearts: Option<u32>,
  xp: u32,
  correct: u32,
  incorrect: u32,
}

impl LessonSession {
  pub fn new(is_premium: bool) -> Self {
    Self {
      combo: 0,
      best_combo: 0,
      hearts: if is_premium { None } else { Some(MAX_HEARTS) },
      xp: 0,
      correct: 0,
      incorrect: 0,
    }
  }

  /// Score a response. `seconds_left` is only considered when the exercise
  /// is a speed round; a speed round answered with no time left counts as a
  /// timeout whatever was chosen.
  pub fn answer(&mut self, exercise: &Exercise, response: &Response, seconds_left: u32) -> Result<AnswerOutcome> {
    if self.is_blocked() {
      return Err(CoreError::InvalidState("no hearts left".into()));
    }

    let expired = exercise.speed_round.is_some() && seconds_left == 0;
    let timeout = Response::Timeout;
    let response = if expired { &timeout } else { response };
    let is_correct = exercise.is_correct(response);
    let reward = if is_correct {
      self.combo += 1;
      self.best_combo = self.best_combo.max(self.combo);
      self.correct += 1;
      let timed = exercise.speed_round.map(|_| seconds_left);
      let reward = calculate_reward(self.combo, timed);
      self.xp += reward;
      reward
    } else {
      self.combo = 0;
      self.incorrect += 1;
      if let Some(hearts) = self.hearts.as_mut() {
        *hearts = hearts.saturating_sub(1);
      }
      0
    };

    if response == &Response::Timeout {
      tracing::debug!("Speed round {} timed out", exercise.id);
    }

    Ok(AnswerOutcome {
      is_correct,
      reward,
      combo: self.combo,
      hearts_left: self.hearts,
      blocked: self.is_blocked(),
    })
  }

  /// Refill hearts after the block is resolved elsewhere (e.g. a purchase)
  pub fn restore_hearts(&mut self) {
    if self.hearts.is_some() {
      self.hearts = Some(MAX_HEARTS);
    }
  }

  /// Switch to unlimited hearts
  pub fn upgrade_to_premium(&mut self) {
    self.hearts = None;
  }

  pub fn is_blocked(&self) -> bool {
    self.hearts == Some(0)
  }

  pub fn combo(&self) -> u32 {
    self.combo
  }

  pub fn best_combo(&self) -> u32 {
    self.best_combo
  }

  pub fn hearts(&self) -> Option<u32> {
    self.hearts
  }

  pub fn xp(&self) -> u32 {
    self.xp
  }

  pub fn correct_count(&self) -> u32 {
    self.correct
  }

  pub fn incorrect_count(&self) -> u32 {
    self.incorrect
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SPEED_ROUND_SECS;
  use crate::domain::{ExerciseType, SpeedRound};

  fn exercise(speed: bool) -> Exercise {
    Exercise {
      id: "1-source_to_target-0".into(),
      exercise_type: ExerciseType::SourceToTarget,
      question: "dog".into(),
      correct_answer: "perro".into(),
      options: vec!["perro".into(), "gato".into(), "casa".into()],
      item_id: 1,
      speed_round: speed.then_some(SpeedRound {
        seconds: SPEED_ROUND_SECS,
      }),
    }
  }

  #[test]
  fn test_reward_table() {
    assert_eq!(calculate_reward(1, None), 10);
    assert_eq!(calculate_reward(4, None), 10);
    assert_eq!(calculate_reward(5, None), 15);
    assert_eq!(calculate_reward(9, None), 15);
    assert_eq!(calculate_reward(10, None), 20);
    assert_eq!(calculate_reward(1, Some(5)), 25);
    assert_eq!(calculate_reward(1, Some(4)), 25);
    assert_eq!(calculate_reward(1, Some(3)), 20);
    assert_eq!(calculate_reward(1, Some(2)), 20);
    assert_eq!(calculate_reward(1, Some(1)), 15);
    assert_eq!(calculate_reward(1, Some(0)), 10);
    assert_eq!(calculate_reward(12, Some(4)), 35);
  }

  #[test]
  fn test_combo_builds_and_resets() {
    let mut session = LessonSession::new(false);
    let ex = exercise(false);
    for _ in 0..5 {
      session.answer(&ex, &Response::choice("perro"), 0).unwrap();
    }
    assert_eq!(session.combo(), 5);
    assert_eq!(session.xp(), 4 * 10 + 15);

    let miss = session.answer(&ex, &Response::choice("gato"), 0).unwrap();
    assert!(!miss.is_correct);
    assert_eq!(miss.reward, 0);
    assert_eq!(miss.combo, 0);
    assert_eq!(miss.hearts_left, Some(MAX_HEARTS - 1));
    assert_eq!(session.best_combo(), 5);
    assert_eq!(session.correct_count(), 5);
    assert_eq!(session.incorrect_count(), 1);
  }

  #[test]
  fn test_speed_bonus_only_on_speed_rounds() {
    let mut session = LessonSession::new(false);
    let plain = session.answer(&exercise(false), &Response::choice("perro"), 5).unwrap();
    assert_eq!(plain.reward, 10);
    let timed = session.answer(&exercise(true), &Response::choice("perro"), 3).unwrap();
    assert_eq!(timed.reward, 20);
  }

  #[test]
  fn test_timeout_costs_a_heart() {
    let mut session = LessonSession::new(false);
    let outcome = session.answer(&exercise(true), &Response::Timeout, 0).unwrap();
    assert!(!outcome.is_correct);
    assert_eq!(outcome.hearts_left, Some(MAX_HEARTS - 1));
  }

  #[test]
  fn test_expired_speed_round_counts_as_timeout() {
    let mut session = LessonSession::new(false);
    session.answer(&exercise(false), &Response::choice("perro"), 0).unwrap();

    let late = session.answer(&exercise(true), &Response::choice("perro"), 0).unwrap();
    assert!(!late.is_correct);
    assert_eq!(late.reward, 0);
    assert_eq!(late.combo, 0);
    assert_eq!(late.hearts_left, Some(MAX_HEARTS - 1));
    assert_eq!(session.xp(), 10);

    // Untimed exercises ignore the countdown
    let plain = session.answer(&exercise(false), &Response::choice("perro"), 0).unwrap();
    assert!(plain.is_correct);
  }

  #[test]
  fn test_zero_hearts_blocks_until_restored() {
    let mut session = LessonSession::new(false);
    let ex = exercise(false);
    let mut last = None;
    for _ in 0..MAX_HEARTS {
      last = Some(session.answer(&ex, &Response::choice("gato"), 0).unwrap());
    }
    let last = last.unwrap();
    assert!(last.blocked);
    assert_eq!(last.hearts_left, Some(0));

    let err = session.answer(&ex, &Response::choice("perro"), 0).unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));
    assert_eq!(session.xp(), 0);

    session.restore_hearts();
    assert!(!session.is_blocked());
    assert!(session.answer(&ex, &Response::choice("perro"), 0).unwrap().is_correct);
  }

  #[test]
  fn test_premium_has_unlimited_hearts() {
    let mut session = LessonSession::new(true);
    let ex = exercise(false);
    for _ in 0..(MAX_HEARTS * 3) {
      let outcome = session.answer(&ex, &Response::choice("gato"), 0).unwrap();
      assert_eq!(outcome.hearts_left, None);
      assert!(!outcome.blocked);
    }
    session.restore_hearts();
    assert_eq!(session.hearts(), None);
  }

  #[test]
  fn test_upgrade_unblocks() {
    let mut session = LessonSession::new(false);
    let ex = exercise(false);
    for _ in 0..MAX_HEARTS {
      session.answer(&ex, &Response::choice("gato"), 0).unwrap();
    }
    assert!(session.is_blocked());
    session.upgrade_to_premium();
    assert!(!session.is_blocked());
  }
}
