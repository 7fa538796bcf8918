//! Practice engine: mastery tracking, question generation and lesson scoring.

pub mod generator;
pub mod mastery;
pub mod session;

pub use generator::{
  generate_exercises, is_speed_round, normalize_answer, Expansion, GeneratorOptions, QuestionOrder,
};
pub use mastery::{summarize, Pool, PracticeAction, ProgressSummary, ProgressTracker};
pub use session::{calculate_reward, AnswerOutcome, LessonSession};
