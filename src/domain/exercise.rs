use serde::{Deserialize, Serialize};

use super::item::{ItemId, LearnableItem};
use crate::config::TIMEOUT_RESPONSE;

/// Direction of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
  /// Show the learner's language, pick the target-language text
  SourceToTarget,
  /// Show the target language, pick the learner's-language text
  TargetToSource,
  /// Fill the blank in an example sentence with the target-language text
  Cloze,
}

impl ExerciseType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::SourceToTarget => "source_to_target",
      Self::TargetToSource => "target_to_source",
      Self::Cloze => "cloze",
    }
  }

  /// The text of `item` that answers a question of this type
  pub fn answer_text<'a>(&self, item: &'a LearnableItem) -> &'a str {
    match self {
      Self::SourceToTarget | Self::Cloze => &item.target_text,
      Self::TargetToSource => &item.source_text,
    }
  }
}

/// Hard countdown attached to a speed-round question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRound {
  pub seconds: u32,
}

/// A generated multiple choice question. Lives for one session only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub exercise_type: ExerciseType,
  pub question: String,
  pub correct_answer: String,
  /// Presentation order, exactly one equals `correct_answer`
  pub options: Vec<String>,
  pub item_id: ItemId,
  pub speed_round: Option<SpeedRound>,
}

impl Exercise {
  pub fn is_correct(&self, response: &Response) -> bool {
    match response {
      Response::Choice(choice) => *choice == self.correct_answer,
      Response::Timeout => false,
    }
  }
}

/// What the learner did with a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
  Choice(String),
  /// Speed round expired before an answer was given
  Timeout,
}

impl Response {
  pub fn choice(s: impl Into<String>) -> Self {
    Self::Choice(s.into())
  }

  /// Value stored for this response; timeouts use a sentinel
  pub fn as_str(&self) -> &str {
    match self {
      Self::Choice(s) => s,
      Self::Timeout => TIMEOUT_RESPONSE,
    }
  }
}
