//! Challenge template catalog and daily-set generation.
//!
//! The built-in tables are the compiled-in catalog: six fixed types, each
//! with a small list of variations (target, point reward, description). A
//! TOML config (see `config.rs`) may append extra variations per type, but
//! can neither remove a type nor ship a non-positive target.
//!
//! Generation: Fisher–Yates shuffle of the six types, take the first three
//! (guarantees pairwise-distinct types), then one uniform variation pick per
//! selected type. Fresh challenges start at `current = 0`.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::error;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::domain::{Challenge, ChallengeType, Reward};

#[derive(Clone, Copy)]
struct VariationDef {
  target: u32,
  reward: u32,
  description: &'static str,
}

macro_rules! var {
  ($target:expr, $reward:expr, $desc:expr) => {
    VariationDef { target: $target, reward: $reward, description: $desc }
  };
}

const STREAK_VARIATIONS: &[VariationDef] = &[
  var!(3, 30, "Get 3 correct answers in a row"),
  var!(5, 50, "Get 5 correct answers in a row"),
  var!(10, 100, "Get 10 correct answers in a row"),
];

const QUESTIONS_VARIATIONS: &[VariationDef] = &[
  var!(5, 25, "Answer 5 questions today"),
  var!(10, 50, "Answer 10 questions today"),
  var!(20, 90, "Answer 20 questions today"),
  var!(30, 120, "Answer 30 questions today"),
];

const HARD_QUESTIONS_VARIATIONS: &[VariationDef] = &[
  var!(3, 45, "Answer 3 hard questions correctly"),
  var!(5, 70, "Answer 5 hard questions correctly"),
  var!(8, 100, "Answer 8 hard questions correctly"),
];

const DOMAIN_VARIETY_VARIATIONS: &[VariationDef] = &[
  var!(2, 30, "Practice questions from 2 different domains"),
  var!(3, 50, "Practice questions from 3 different domains"),
  var!(4, 75, "Practice questions from 4 different domains"),
];

const ACCURACY_VARIATIONS: &[VariationDef] = &[
  var!(70, 40, "Finish a session with 70% accuracy or better"),
  var!(80, 60, "Finish a session with 80% accuracy or better"),
  var!(90, 90, "Finish a session with 90% accuracy or better"),
];

const SPEED_VARIATIONS: &[VariationDef] = &[
  var!(5, 35, "Answer 5 questions under the pace timer"),
  var!(10, 65, "Answer 10 questions under the pace timer"),
];

fn builtin_variations(kind: ChallengeType) -> &'static [VariationDef] {
  match kind {
    ChallengeType::Streak => STREAK_VARIATIONS,
    ChallengeType::Questions => QUESTIONS_VARIATIONS,
    ChallengeType::HardQuestions => HARD_QUESTIONS_VARIATIONS,
    ChallengeType::DomainVariety => DOMAIN_VARIETY_VARIATIONS,
    ChallengeType::Accuracy => ACCURACY_VARIATIONS,
    ChallengeType::Speed => SPEED_VARIATIONS,
  }
}

/// One pickable variation of a challenge type.
#[derive(Clone, Debug)]
pub struct Variation {
  pub target: u32,
  pub reward: u32,
  pub description: String,
}

/// Runtime catalog: built-ins plus any config-supplied extras.
/// Invariant: every type has at least one variation and all targets are
/// positive — `with_extras` filters out anything that would break this.
#[derive(Clone, Debug)]
pub struct Catalog {
  by_type: HashMap<ChallengeType, Vec<Variation>>,
}

impl Catalog {
  pub fn builtin() -> Self {
    let mut by_type = HashMap::new();
    for kind in ChallengeType::ALL {
      let vars = builtin_variations(kind)
        .iter()
        .map(|v| Variation {
          target: v.target,
          reward: v.reward,
          description: v.description.to_string(),
        })
        .collect();
      by_type.insert(kind, vars);
    }
    Catalog { by_type }
  }

  /// Built-ins extended with config entries. Entries with a zero target,
  /// zero reward, or empty description are skipped (logged, not fatal).
  pub fn with_extras(cfg: &CatalogConfig) -> Self {
    let mut catalog = Self::builtin();
    for entry in &cfg.variations {
      if entry.target == 0 || entry.reward == 0 || entry.description.trim().is_empty() {
        error!(
          target: "challenge",
          kind = entry.kind.as_str(),
          entry.target,
          entry.reward,
          "Skipping catalog entry: needs positive target, positive reward, non-empty description."
        );
        continue;
      }
      catalog
        .by_type
        .entry(entry.kind)
        .or_default()
        .push(Variation {
          target: entry.target,
          reward: entry.reward,
          description: entry.description.clone(),
        });
    }
    catalog
  }

  pub fn variations(&self, kind: ChallengeType) -> &[Variation] {
    self.by_type.get(&kind).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Number of challenges in every daily set.
pub const SET_SIZE: usize = 3;

/// Generate the challenges for a fresh daily set.
pub fn generate_challenges<R: Rng>(catalog: &Catalog, rng: &mut R) -> Vec<Challenge> {
  let mut kinds = ChallengeType::ALL;
  kinds.shuffle(rng);

  kinds[..SET_SIZE]
    .iter()
    .map(|&kind| {
      let pool = catalog.variations(kind);
      // The catalog invariant guarantees a non-empty pool per type.
      let v = pool.choose(rng).unwrap_or(&pool[0]);
      Challenge {
        id: format!("{}-{}-{}", kind.as_str(), v.target, Uuid::new_v4()),
        kind,
        description: v.description.clone(),
        target: v.target,
        current: 0,
        completed: false,
        reward: Reward::points(v.reward),
      }
    })
    .collect()
}
