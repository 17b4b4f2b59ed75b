//! Domain models: challenge types, rewards, the per-visitor-per-day challenge
//! set, and the progress rules that mutate it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The six gamified challenge kinds. Fixed enumeration; updates carrying any
/// other type string are rejected at the serde boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
  /// Best run of consecutive correct answers reached today (max, not sum).
  Streak,
  Questions,
  HardQuestions,
  DomainVariety,
  /// Session accuracy percentage; an absolute snapshot, may move down.
  Accuracy,
  Speed,
}

impl ChallengeType {
  pub const ALL: [ChallengeType; 6] = [
    ChallengeType::Streak,
    ChallengeType::Questions,
    ChallengeType::HardQuestions,
    ChallengeType::DomainVariety,
    ChallengeType::Accuracy,
    ChallengeType::Speed,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ChallengeType::Streak => "streak",
      ChallengeType::Questions => "questions",
      ChallengeType::HardQuestions => "hard_questions",
      ChallengeType::DomainVariety => "domain_variety",
      ChallengeType::Accuracy => "accuracy",
      ChallengeType::Speed => "speed",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
  Points,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Reward {
  #[serde(rename = "type")]
  pub kind: RewardKind,
  pub value: u32,
}

impl Reward {
  pub fn points(value: u32) -> Self {
    Reward { kind: RewardKind::Points, value }
  }
}

/// One progress event from a practice session, addressed to a challenge type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressUpdate {
  #[serde(rename = "type")]
  pub kind: ChallengeType,
  pub value: u32,
  #[serde(rename = "isAbsolute", default)]
  pub is_absolute: bool,
}

/// One gamified daily task. Type, description, target and reward are fixed at
/// creation; only `current` and `completed` move afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: ChallengeType,
  pub description: String,
  pub target: u32,
  pub current: u32,
  pub completed: bool,
  pub reward: Reward,
}

impl Challenge {
  /// Fold one matching update into the challenge. Returns true only when this
  /// update crossed the target for the first time; `completed` never reverts,
  /// so each challenge reports completion at most once per document lifetime.
  pub fn apply(&mut self, update: &ProgressUpdate) -> bool {
    let next = if update.is_absolute {
      // Absolute snapshot (accuracy): last write wins, may move down.
      update.value
    } else if self.kind == ChallengeType::Streak {
      // Best streak reached today, not a running sum.
      self.current.max(update.value)
    } else {
      self.current.saturating_add(update.value)
    };

    // Progress never overshoots the target.
    self.current = next.min(self.target);

    let was_completed = self.completed;
    self.completed = was_completed || self.current >= self.target;
    self.completed && !was_completed
  }
}

/// The group of exactly 3 challenges assigned to one visitor for one UTC
/// calendar day. Created lazily, never deleted, never regenerated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyChallengeSet {
  #[serde(rename = "visitorId")]
  pub visitor_id: String,
  pub date: NaiveDate,
  pub challenges: Vec<Challenge>,
  #[serde(rename = "allCompleted")]
  pub all_completed: bool,
  #[serde(rename = "bonusClaimed")]
  pub bonus_claimed: bool,
}

impl DailyChallengeSet {
  pub fn new(visitor_id: String, date: NaiveDate, challenges: Vec<Challenge>) -> Self {
    DailyChallengeSet {
      visitor_id,
      date,
      challenges,
      all_completed: false,
      bonus_claimed: false,
    }
  }

  pub fn recompute_all_completed(&mut self) {
    self.all_completed = self.challenges.iter().all(|c| c.completed);
  }

  /// Sum of the point rewards across the set; input to the bonus policy.
  pub fn reward_total(&self) -> u32 {
    self.challenges.iter().map(|c| c.reward.value).sum()
  }
}
