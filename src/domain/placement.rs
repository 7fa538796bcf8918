use serde::{Deserialize, Serialize};

use super::item::Tier;

/// A placement test question, tagged with exactly one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementQuestion {
  pub id: String,
  pub tier: Tier,
  pub prompt: String,
  pub options: Vec<String>,
  pub correct_answer: String,
}

/// One answered placement question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementAnswer {
  pub question_id: String,
  pub chosen: String,
  pub is_correct: bool,
  pub tier: Tier,
}

impl PlacementAnswer {
  pub fn for_question(question: &PlacementQuestion, chosen: &str) -> Self {
    Self {
      question_id: question.id.clone(),
      chosen: chosen.to_string(),
      is_correct: chosen == question.correct_answer,
      tier: question.tier,
    }
  }
}
