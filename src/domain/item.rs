use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// Identifier of a signed-in learner (issued by the hosted auth service)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for UserId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Ordered difficulty / proficiency bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
  Tier1,
  Tier2,
  Tier3,
  Tier4,
}

impl Tier {
  pub const ALL: [Tier; 4] = [Tier::Tier1, Tier::Tier2, Tier::Tier3, Tier::Tier4];

  pub const LOWEST: Tier = Tier::Tier1;
  pub const HIGHEST: Tier = Tier::Tier4;

  pub fn from_u8(n: u8) -> Option<Self> {
    match n {
      1 => Some(Self::Tier1),
      2 => Some(Self::Tier2),
      3 => Some(Self::Tier3),
      4 => Some(Self::Tier4),
      _ => None,
    }
  }

  pub fn as_u8(&self) -> u8 {
    match self {
      Self::Tier1 => 1,
      Self::Tier2 => 2,
      Self::Tier3 => 3,
      Self::Tier4 => 4,
    }
  }

  /// Zero-based position in `Tier::ALL`
  pub fn index(&self) -> usize {
    self.as_u8() as usize - 1
  }

  pub fn next(&self) -> Option<Self> {
    Self::from_u8(self.as_u8() + 1)
  }

  pub fn prev(&self) -> Option<Self> {
    self.as_u8().checked_sub(1).and_then(Self::from_u8)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
  Word,
  Phrase,
}

impl ItemKind {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "word" => Some(Self::Word),
      "phrase" => Some(Self::Phrase),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Word => "word",
      Self::Phrase => "phrase",
    }
  }
}

/// A word or phrase from the content catalog. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnableItem {
  pub id: ItemId,
  pub kind: ItemKind,
  /// Text in the learner's own language
  pub source_text: String,
  /// Text in the language being learned
  pub target_text: String,
  pub pronunciation: Option<String>,
  pub category: Option<String>,
  pub tier: Option<Tier>,
  pub audio_ref: Option<String>,
  /// Example sentence in the target language containing `target_text`
  pub example_sentence: Option<String>,
  pub example_translation: Option<String>,
}

impl LearnableItem {
  pub fn new(id: ItemId, kind: ItemKind, source_text: &str, target_text: &str) -> Self {
    Self {
      id,
      kind,
      source_text: source_text.to_string(),
      target_text: target_text.to_string(),
      pronunciation: None,
      category: None,
      tier: None,
      audio_ref: None,
      example_sentence: None,
      example_translation: None,
    }
  }

  pub fn with_category(mut self, category: &str) -> Self {
    self.category = Some(category.to_string());
    self
  }

  pub fn with_tier(mut self, tier: Tier) -> Self {
    self.tier = Some(tier);
    self
  }

  pub fn with_example(mut self, sentence: &str, translation: Option<&str>) -> Self {
    self.example_sentence = Some(sentence.to_string());
    self.example_translation = translation.map(|t| t.to_string());
    self
  }
}

/// Content query accepted by a content store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
  pub kind: Option<ItemKind>,
  pub category: Option<String>,
  pub tier: Option<Tier>,
  pub limit: Option<usize>,
}

impl ItemFilter {
  pub fn matches(&self, item: &LearnableItem) -> bool {
    self.kind.is_none_or(|k| item.kind == k)
      && self
        .category
        .as_deref()
        .is_none_or(|c| item.category.as_deref() == Some(c))
      && self.tier.is_none_or(|t| item.tier == Some(t))
  }
}
