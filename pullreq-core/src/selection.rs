//! Reviewer selection engine
//!
//! Picks initial reviewers for a new pull request and a replacement when a
//! reviewer is swapped out. Selection is uniformly random over the candidate
//! set so that no team member is favoured. The functions here perform no I/O;
//! the caller supplies candidates already loaded from a store.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{PullRequest, User};

/// Candidates for a new pull request: the author's active teammates
pub fn initial_candidates(team_active: Vec<User>, author_id: &str) -> Vec<User> {
    team_active
        .into_iter()
        .filter(|u| u.user_id != author_id)
        .collect()
}

/// Candidates to replace `old_reviewer_id` on `pr`
///
/// Excludes the author, the outgoing reviewer and everyone already assigned.
pub fn replacement_candidates(
    team_active: Vec<User>,
    pr: &PullRequest,
    old_reviewer_id: &str,
) -> Vec<User> {
    team_active
        .into_iter()
        .filter(|u| {
            u.user_id != pr.author_id
                && u.user_id != old_reviewer_id
                && !pr.has_reviewer(&u.user_id)
        })
        .collect()
}

/// Draw up to `count` distinct reviewer ids from `candidates`
///
/// The result is in draw order and is reproducible for a given RNG state and
/// candidate order. The input slice is not modified.
pub fn select_reviewers<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[User],
    count: usize,
) -> Vec<String> {
    if count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut ids: Vec<&str> = candidates
        .iter()
        .map(|u| u.user_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect();

    ids.shuffle(rng);
    ids.truncate(count);
    ids.into_iter().map(str::to_owned).collect()
}

/// Draw a single replacement uniformly, or `None` if there is nobody to pick
pub fn select_replacement<R: Rng + ?Sized>(rng: &mut R, candidates: &[User]) -> Option<String> {
    candidates.choose(rng).map(|u| u.user_id.clone())
}

/// Owns the service's random source
///
/// `StdRng` is not safe for unsynchronized use, so every draw takes the lock.
/// The lock is only held for the duration of a draw.
pub struct ReviewerSelector {
    rng: Mutex<StdRng>,
    seed: u64,
}

impl ReviewerSelector {
    /// Create a selector seeded with `seed`, or from the clock when absent or zero
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) if seed != 0 => Self::seeded(seed),
            _ => Self::seeded(clock_seed()),
        }
    }

    /// Create a selector with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    /// The seed this selector started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn select_reviewers(&self, candidates: &[User], count: usize) -> Vec<String> {
        let mut rng = self.rng.lock();
        select_reviewers(&mut *rng, candidates, count)
    }

    pub fn select_replacement(&self, candidates: &[User]) -> Option<String> {
        let mut rng = self.rng.lock();
        select_replacement(&mut *rng, candidates)
    }
}

impl Default for ReviewerSelector {
    fn default() -> Self {
        Self::from_seed(None)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(ids: &[&str]) -> Vec<User> {
        ids.iter()
            .map(|id| User::new(*id, format!("User {}", id), "backend"))
            .collect()
    }

    #[test]
    fn test_empty_candidates_yield_no_reviewers() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_reviewers(&mut rng, &[], 2).is_empty());
    }

    #[test]
    fn test_zero_count_yields_no_reviewers() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_reviewers(&mut rng, &team(&["u2", "u3"]), 0).is_empty());
    }

    #[test]
    fn test_select_takes_min_of_count_and_candidates() {
        let candidates = team(&["u2", "u3", "u4", "u5", "u6"]);
        let mut rng = StdRng::seed_from_u64(42);

        let picked = select_reviewers(&mut rng, &candidates, 2);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
        assert!(picked
            .iter()
            .all(|id| candidates.iter().any(|u| &u.user_id == id)));

        let all = select_reviewers(&mut rng, &candidates[..1], 2);
        assert_eq!(all, vec!["u2"]);
    }

    #[test]
    fn test_select_does_not_mutate_input() {
        let candidates = team(&["u2", "u3", "u4"]);
        let before = candidates.clone();
        let mut rng = StdRng::seed_from_u64(1);

        let _ = select_reviewers(&mut rng, &candidates, 3);
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_select_never_duplicates() {
        let mut candidates = team(&["u2", "u3"]);
        candidates.push(User::new("u2", "User u2 again", "backend"));
        let mut rng = StdRng::seed_from_u64(3);

        let picked = select_reviewers(&mut rng, &candidates, 5);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let candidates = team(&["u2", "u3", "u4", "u5", "u6"]);

        let a = ReviewerSelector::seeded(99);
        let b = ReviewerSelector::seeded(99);
        for _ in 0..10 {
            assert_eq!(
                a.select_reviewers(&candidates, 3),
                b.select_reviewers(&candidates, 3)
            );
            assert_eq!(
                a.select_replacement(&candidates),
                b.select_replacement(&candidates)
            );
        }
    }

    #[test]
    fn test_every_candidate_can_be_drawn() {
        let candidates = team(&["u2", "u3", "u4"]);
        let selector = ReviewerSelector::seeded(5);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            if let Some(id) = selector.select_replacement(&candidates) {
                seen.insert(id);
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_replacement_from_empty_is_none() {
        let selector = ReviewerSelector::seeded(5);
        assert!(selector.select_replacement(&[]).is_none());
    }

    #[test]
    fn test_initial_candidates_exclude_author() {
        let candidates = initial_candidates(team(&["u1", "u2", "u3"]), "u1");
        let ids: Vec<_> = candidates.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3"]);
    }

    #[test]
    fn test_replacement_candidates_exclusions() {
        let pr = PullRequest::new(
            "pr-1",
            "Fix",
            "u1",
            vec!["u2".to_string(), "u3".to_string()],
        );
        let candidates = replacement_candidates(team(&["u1", "u2", "u3", "u4", "u5"]), &pr, "u2");
        let ids: Vec<_> = candidates.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u4", "u5"]);
    }

    #[test]
    fn test_zero_seed_falls_back_to_clock() {
        let selector = ReviewerSelector::from_seed(Some(0));
        assert_ne!(selector.seed(), 0);
        assert_eq!(ReviewerSelector::from_seed(Some(17)).seed(), 17);
    }
}
