//! Core daily-challenge operations shared by both HTTP and WebSocket handlers.
//!
//! Every operation resolves "today" as the UTC calendar day and runs against
//! the single per-(visitor, day) document:
//!   - get_daily: read-only lookup, no creation side effect
//!   - get_or_create: lazily generates today's 3-challenge set
//!   - update_progress: folds practice-session events into the set
//!   - claim_bonus: one-time 50% bonus once every challenge is complete
//!   - history / completion_streak: read-only queries over recent days
//!
//! The `*_on` variants take the date explicitly; the public wrappers pin it
//! to today. Progress and claim calls for a day with no generated set are
//! silent no-ops, not errors — the visitor simply hasn't opened challenges.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use tracing::{info, instrument, warn};

use crate::catalog::generate_challenges;
use crate::domain::{DailyChallengeSet, ProgressUpdate};
use crate::state::AppState;
use crate::store::StoreError;
use crate::util::today_utc;

/// How far back the streak walk may look.
const STREAK_WINDOW_DAYS: u64 = 60;

/// Default number of sets returned by the history query.
pub const DEFAULT_HISTORY_LIMIT: usize = 7;

/// Today's set if it exists; never creates one.
#[instrument(level = "info", skip(state))]
pub async fn get_daily(state: &AppState, visitor_id: &str) -> Result<Option<DailyChallengeSet>, StoreError> {
  state.store.get(visitor_id, today_utc()).await
}

/// Today's set, generated on first request. Safe to call repeatedly and
/// concurrently: a set, once created for a (visitor, day), is never
/// regenerated, and a lost creation race falls back to the winner's set.
#[instrument(level = "info", skip(state))]
pub async fn get_or_create(state: &AppState, visitor_id: &str) -> Result<DailyChallengeSet, StoreError> {
  get_or_create_on(state, visitor_id, today_utc()).await
}

pub(crate) async fn get_or_create_on(
  state: &AppState,
  visitor_id: &str,
  date: NaiveDate,
) -> Result<DailyChallengeSet, StoreError> {
  if let Some(existing) = state.store.get(visitor_id, date).await? {
    return Ok(existing);
  }

  let challenges = {
    let mut rng = state.rng.lock().await;
    generate_challenges(&state.catalog, &mut *rng)
  };
  let set = DailyChallengeSet::new(visitor_id.to_string(), date, challenges);

  match state.store.insert(set.clone()).await {
    Ok(()) => {
      info!(target: "challenge", visitor = visitor_id, %date, "Generated daily challenge set");
      Ok(set)
    }
    Err(StoreError::Conflict { .. }) => {
      // Lost the creation race; serve whatever the winner persisted.
      warn!(target: "challenge", visitor = visitor_id, %date, "Creation race lost; serving existing set");
      state
        .store
        .get(visitor_id, date)
        .await?
        .ok_or_else(|| StoreError::Unavailable("set missing after creation conflict".into()))
    }
    Err(e) => Err(e),
  }
}

/// Fold progress updates into today's set. Returns the ids of challenges that
/// completed on this call and the resulting all-completed flag.
#[instrument(level = "info", skip(state, updates), fields(visitor = visitor_id, updates = updates.len()))]
pub async fn update_progress(
  state: &AppState,
  visitor_id: &str,
  updates: &[ProgressUpdate],
) -> Result<(Vec<String>, bool), StoreError> {
  update_progress_on(state, visitor_id, today_utc(), updates).await
}

pub(crate) async fn update_progress_on(
  state: &AppState,
  visitor_id: &str,
  date: NaiveDate,
  updates: &[ProgressUpdate],
) -> Result<(Vec<String>, bool), StoreError> {
  // No set for today: the update arrived before the visitor viewed their
  // challenges. Swallow it; generation stays the only creation path.
  let Some(mut set) = state.store.get(visitor_id, date).await? else {
    return Ok((Vec::new(), false));
  };

  let mut newly_completed = Vec::new();
  for challenge in &mut set.challenges {
    // Same-type updates apply sequentially in input order.
    let challenge_kind = challenge.kind;
    for update in updates.iter().filter(|u| u.kind == challenge_kind) {
      if challenge.apply(update) {
        newly_completed.push(challenge.id.clone());
      }
    }
  }
  set.recompute_all_completed();

  // Challenge list and flag persist as one whole-document write.
  state.store.put(set.clone()).await?;

  if !newly_completed.is_empty() || set.all_completed {
    info!(
      target: "challenge",
      visitor = visitor_id,
      newly = newly_completed.len(),
      all_completed = set.all_completed,
      "Progress applied"
    );
  }
  Ok((newly_completed, set.all_completed))
}

/// Claim the one-time all-complete bonus: floor of 50% of the summed rewards.
/// Fails closed (`(false, 0)`) when there is no set, the set is incomplete,
/// or the bonus was already claimed — calling twice never double-pays.
#[instrument(level = "info", skip(state))]
pub async fn claim_bonus(state: &AppState, visitor_id: &str) -> Result<(bool, u32), StoreError> {
  claim_bonus_on(state, visitor_id, today_utc()).await
}

pub(crate) async fn claim_bonus_on(
  state: &AppState,
  visitor_id: &str,
  date: NaiveDate,
) -> Result<(bool, u32), StoreError> {
  let Some(mut set) = state.store.get(visitor_id, date).await? else {
    return Ok((false, 0));
  };
  if !set.all_completed || set.bonus_claimed {
    return Ok((false, 0));
  }

  let bonus = set.reward_total() / 2;
  set.bonus_claimed = true;
  state.store.put(set).await?;

  info!(target: "challenge", visitor = visitor_id, %date, bonus, "Daily bonus claimed");
  Ok((true, bonus))
}

/// Most recent challenge sets for the visitor, newest first.
#[instrument(level = "info", skip(state))]
pub async fn history(
  state: &AppState,
  visitor_id: &str,
  limit: Option<usize>,
) -> Result<Vec<DailyChallengeSet>, StoreError> {
  state
    .store
    .recent(visitor_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    .await
}

/// Consecutive all-completed days ending at today.
#[instrument(level = "info", skip(state))]
pub async fn completion_streak(state: &AppState, visitor_id: &str) -> Result<u32, StoreError> {
  let records = state.store.recent(visitor_id, STREAK_WINDOW_DAYS as usize).await?;
  Ok(streak_from(&records, today_utc()))
}

/// Walk backward day-by-day from `today`. A completed set extends the streak.
/// Today alone gets a grace pass when missing or incomplete (the visitor may
/// simply not have finished yet); a gap on any older day ends the walk.
pub(crate) fn streak_from(records: &[DailyChallengeSet], today: NaiveDate) -> u32 {
  let completed: HashSet<NaiveDate> = records
    .iter()
    .filter(|s| s.all_completed)
    .map(|s| s.date)
    .collect();

  let mut streak = 0;
  for i in 0..STREAK_WINDOW_DAYS {
    let Some(check_date) = today.checked_sub_days(Days::new(i)) else {
      break;
    };
    if completed.contains(&check_date) {
      streak += 1;
    } else if i > 0 {
      break;
    }
  }
  streak
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Catalog;
  use crate::domain::{Challenge, ChallengeType, Reward};
  use crate::store::MemoryStore;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::HashSet;
  use std::sync::Arc;

  const VISITOR: &str = "visitor-1";

  fn test_state(seed: u64) -> AppState {
    AppState::with_parts(
      Arc::new(MemoryStore::new()),
      Catalog::builtin(),
      StdRng::seed_from_u64(seed),
    )
  }

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
  }

  fn challenge(kind: ChallengeType, target: u32, reward: u32) -> Challenge {
    Challenge {
      id: format!("{}-{}-test", kind.as_str(), target),
      kind,
      description: format!("test {}", kind.as_str()),
      target,
      current: 0,
      completed: false,
      reward: Reward::points(reward),
    }
  }

  async fn seed_set(state: &AppState, d: NaiveDate, challenges: Vec<Challenge>) {
    let set = DailyChallengeSet::new(VISITOR.to_string(), d, challenges);
    state.store.insert(set).await.expect("seed set");
  }

  fn update(kind: ChallengeType, value: u32, is_absolute: bool) -> ProgressUpdate {
    ProgressUpdate { kind, value, is_absolute }
  }

  #[tokio::test]
  async fn get_or_create_is_idempotent_within_a_day() {
    let state = test_state(1);
    let d = date("2026-08-08");

    let first = get_or_create_on(&state, VISITOR, d).await.expect("first");
    let second = get_or_create_on(&state, VISITOR, d).await.expect("second");

    let ids: Vec<_> = first.challenges.iter().map(|c| c.id.clone()).collect();
    let ids2: Vec<_> = second.challenges.iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, ids2, "second call must return the same set, not regenerate");
    assert_eq!(
      first.challenges.iter().map(|c| c.target).collect::<Vec<_>>(),
      second.challenges.iter().map(|c| c.target).collect::<Vec<_>>()
    );
    assert_eq!(
      first.challenges.iter().map(|c| c.description.clone()).collect::<Vec<_>>(),
      second.challenges.iter().map(|c| c.description.clone()).collect::<Vec<_>>()
    );
  }

  #[tokio::test]
  async fn generated_sets_have_distinct_types_and_fresh_state() {
    let state = test_state(2);
    let set = get_or_create_on(&state, VISITOR, date("2026-08-08")).await.expect("set");

    assert_eq!(set.challenges.len(), 3);
    let kinds: HashSet<_> = set.challenges.iter().map(|c| c.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(!set.all_completed);
    assert!(!set.bonus_claimed);
  }

  #[tokio::test]
  async fn streak_challenges_keep_the_best_run() {
    let state = test_state(3);
    let d = date("2026-08-08");
    seed_set(&state, d, vec![challenge(ChallengeType::Streak, 10, 100)]).await;

    update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Streak, 3, false)])
      .await
      .expect("first");
    update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Streak, 2, false)])
      .await
      .expect("second");

    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 3, "max, not sum");
  }

  #[tokio::test]
  async fn additive_progress_clamps_and_reports_completion_once() {
    let state = test_state(4);
    let d = date("2026-08-08");
    seed_set(&state, d, vec![challenge(ChallengeType::Questions, 10, 50)]).await;
    let id = state.store.get(VISITOR, d).await.expect("get").expect("set").challenges[0]
      .id
      .clone();

    let up = [update(ChallengeType::Questions, 4, false)];
    let (newly, _) = update_progress_on(&state, VISITOR, d, &up).await.expect("1st");
    assert!(newly.is_empty());
    let (newly, _) = update_progress_on(&state, VISITOR, d, &up).await.expect("2nd");
    assert!(newly.is_empty());

    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 8);

    // 8 + 5 = 13, clamped to the target of 10; first (and only) completion.
    let (newly, all) = update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Questions, 5, false)])
      .await
      .expect("3rd");
    assert_eq!(newly, vec![id]);
    assert!(all);
    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 10);
    assert!(set.challenges[0].completed);

    // Further updates stay pinned and never re-report the completion.
    let (newly, _) = update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Questions, 7, false)])
      .await
      .expect("4th");
    assert!(newly.is_empty());
    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 10);
  }

  #[tokio::test]
  async fn absolute_updates_overwrite_rather_than_accumulate() {
    let state = test_state(5);
    let d = date("2026-08-08");
    seed_set(&state, d, vec![challenge(ChallengeType::Accuracy, 95, 90)]).await;

    update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Accuracy, 90, true)])
      .await
      .expect("first snapshot");
    update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Accuracy, 70, true)])
      .await
      .expect("second snapshot");

    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 70, "last write wins, not max/sum");
    assert!(!set.challenges[0].completed);
  }

  #[tokio::test]
  async fn completion_latches_even_when_an_absolute_snapshot_drops() {
    let state = test_state(6);
    let d = date("2026-08-08");
    seed_set(&state, d, vec![challenge(ChallengeType::Accuracy, 80, 60)]).await;

    let (newly, _) = update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Accuracy, 85, true)])
      .await
      .expect("complete");
    assert_eq!(newly.len(), 1);

    let (newly, _) = update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Accuracy, 40, true)])
      .await
      .expect("drop");
    assert!(newly.is_empty());
    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 40);
    assert!(set.challenges[0].completed, "completed never reverts");
    assert!(set.all_completed);
  }

  #[tokio::test]
  async fn same_type_updates_in_one_call_accumulate_in_input_order() {
    let state = test_state(7);
    let d = date("2026-08-08");
    seed_set(
      &state,
      d,
      vec![
        challenge(ChallengeType::Questions, 20, 90),
        challenge(ChallengeType::Streak, 10, 100),
      ],
    )
    .await;

    let ups = [
      update(ChallengeType::Questions, 4, false),
      update(ChallengeType::Questions, 5, false),
      update(ChallengeType::Streak, 3, false),
      update(ChallengeType::Streak, 2, false),
    ];
    update_progress_on(&state, VISITOR, d, &ups).await.expect("batch");

    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert_eq!(set.challenges[0].current, 9, "additive: 4 then 5");
    assert_eq!(set.challenges[1].current, 3, "streak: max(3, 2)");
  }

  #[tokio::test]
  async fn bonus_pays_half_the_summed_rewards_exactly_once() {
    let state = test_state(8);
    let d = date("2026-08-08");
    seed_set(
      &state,
      d,
      vec![
        challenge(ChallengeType::Questions, 5, 50),
        challenge(ChallengeType::Streak, 3, 70),
        challenge(ChallengeType::Speed, 5, 60),
      ],
    )
    .await;

    let ups = [
      update(ChallengeType::Questions, 5, false),
      update(ChallengeType::Streak, 3, false),
      update(ChallengeType::Speed, 5, false),
    ];
    let (newly, all) = update_progress_on(&state, VISITOR, d, &ups).await.expect("complete all");
    assert_eq!(newly.len(), 3);
    assert!(all);

    let (success, bonus) = claim_bonus_on(&state, VISITOR, d).await.expect("claim");
    assert!(success);
    assert_eq!(bonus, 90, "floor(0.5 * 180)");

    let (success, bonus) = claim_bonus_on(&state, VISITOR, d).await.expect("second claim");
    assert!(!success);
    assert_eq!(bonus, 0);
  }

  #[tokio::test]
  async fn bonus_fails_closed_before_all_challenges_complete() {
    let state = test_state(9);
    let d = date("2026-08-08");
    seed_set(
      &state,
      d,
      vec![
        challenge(ChallengeType::Questions, 5, 50),
        challenge(ChallengeType::Speed, 5, 60),
      ],
    )
    .await;
    update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Questions, 5, false)])
      .await
      .expect("partial");

    let (success, bonus) = claim_bonus_on(&state, VISITOR, d).await.expect("claim");
    assert!(!success);
    assert_eq!(bonus, 0);
    let set = state.store.get(VISITOR, d).await.expect("get").expect("set");
    assert!(!set.bonus_claimed, "failed claim must not mutate the flag");

    // No set at all fails closed the same way.
    let (success, bonus) = claim_bonus_on(&state, "nobody", d).await.expect("claim");
    assert!(!success);
    assert_eq!(bonus, 0);
  }

  #[tokio::test]
  async fn progress_for_a_day_without_a_set_is_a_noop() {
    let state = test_state(10);
    let d = date("2026-08-08");

    let (newly, all) = update_progress_on(&state, VISITOR, d, &[update(ChallengeType::Questions, 4, false)])
      .await
      .expect("noop");
    assert!(newly.is_empty());
    assert!(!all);
    assert!(
      state.store.get(VISITOR, d).await.expect("get").is_none(),
      "no implicit creation"
    );
  }

  fn completed_set(d: NaiveDate) -> DailyChallengeSet {
    let mut set = DailyChallengeSet::new(VISITOR.to_string(), d, Vec::new());
    set.all_completed = true;
    set
  }

  #[test]
  fn streak_grace_applies_to_today_only() {
    let today = date("2026-08-08");
    // Yesterday and the day before complete, nothing for today: grace keeps
    // the walk alive past today, then counts two days.
    let records = vec![completed_set(date("2026-08-07")), completed_set(date("2026-08-06"))];
    assert_eq!(streak_from(&records, today), 2);

    // A gap at yesterday ends the streak even though older days are complete.
    let records = vec![completed_set(date("2026-08-06")), completed_set(date("2026-08-05"))];
    assert_eq!(streak_from(&records, today), 0);
  }

  #[test]
  fn streak_counts_today_and_ignores_incomplete_sets() {
    let today = date("2026-08-08");
    let mut incomplete = DailyChallengeSet::new(VISITOR.to_string(), date("2026-08-06"), Vec::new());
    incomplete.all_completed = false;

    let records = vec![
      completed_set(today),
      completed_set(date("2026-08-07")),
      incomplete,
      completed_set(date("2026-08-05")),
    ];
    // Today + yesterday count; the incomplete Aug 6 breaks the walk before
    // Aug 5 is ever considered.
    assert_eq!(streak_from(&records, today), 2);
  }

  #[tokio::test]
  async fn completion_streak_walks_recent_records() {
    let state = test_state(11);
    let today = today_utc();
    for i in 1..=3 {
      let d = today.checked_sub_days(Days::new(i)).expect("date");
      state.store.insert(completed_set(d)).await.expect("insert");
    }

    assert_eq!(completion_streak(&state, VISITOR).await.expect("streak"), 3);
  }

  #[tokio::test]
  async fn history_is_newest_first_with_default_limit() {
    let state = test_state(12);
    let base = date("2026-08-08");
    for i in 0..10u64 {
      let d = base.checked_sub_days(Days::new(i)).expect("date");
      seed_set(&state, d, Vec::new()).await;
    }

    let sets = history(&state, VISITOR, None).await.expect("history");
    assert_eq!(sets.len(), DEFAULT_HISTORY_LIMIT);
    assert_eq!(sets[0].date, base);
    for pair in sets.windows(2) {
      assert!(pair[0].date > pair[1].date);
    }

    let sets = history(&state, VISITOR, Some(3)).await.expect("limited");
    assert_eq!(sets.len(), 3);
  }
}
