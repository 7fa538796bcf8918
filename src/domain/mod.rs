pub mod exercise;
pub mod item;
pub mod placement;
pub mod progress;

pub use exercise::{Exercise, ExerciseType, Response, SpeedRound};
pub use item::{ItemFilter, ItemId, ItemKind, LearnableItem, Tier, UserId};
pub use placement::{PlacementAnswer, PlacementQuestion};
pub use progress::{MasteryBucket, ProgressFilter, ProgressRecord};
