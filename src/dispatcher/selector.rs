//! Credential selection policy
//!
//! Pure decision logic over a [`HealthTracker`]: no I/O, no mutation. The
//! dispatcher applies the decision and bumps the usage counter under the
//! same lock.

use super::feature::Feature;
use super::health::HealthTracker;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// How a credential was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    /// The feature's own credential, on the first attempt
    Preferred,
    /// Least-used healthy credential
    LeastUsed,
    /// Any remaining credential, regardless of health
    Emergency,
}

impl fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preferred => write!(f, "preferred"),
            Self::LeastUsed => write!(f, "least_used"),
            Self::Emergency => write!(f, "emergency"),
        }
    }
}

/// Outcome of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: Arc<str>,
    pub tier: SelectionTier,
}

/// Pick the credential for `attempt` (0-based) of a call for `feature`
///
/// 1. Attempt 0: the preferred credential if it is in the pool, healthy
///    and not excluded.
/// 2. Otherwise the healthy, non-excluded credential with the lowest usage
///    count (ties go to the earliest in pool order).
/// 3. Otherwise the first non-excluded credential regardless of health.
/// 4. Otherwise `None`.
pub fn choose(
    health: &HealthTracker,
    feature: Feature,
    attempt: u32,
    excluded: &HashSet<Arc<str>>,
) -> Option<Selection> {
    let records = health.records();

    if attempt == 0 {
        let preferred = feature.preferred_credential();
        let candidate = records
            .iter()
            .find(|r| r.name() == preferred)
            .filter(|r| health.record_is_healthy(r) && !excluded.contains(r.name()));
        if let Some(record) = candidate {
            return Some(Selection {
                name: Arc::from(record.name()),
                tier: SelectionTier::Preferred,
            });
        }
    }

    let least_used = records
        .iter()
        .filter(|r| health.record_is_healthy(r) && !excluded.contains(r.name()))
        .min_by_key(|r| r.usage_count());
    if let Some(record) = least_used {
        return Some(Selection {
            name: Arc::from(record.name()),
            tier: SelectionTier::LeastUsed,
        });
    }

    records
        .iter()
        .find(|r| !excluded.contains(r.name()))
        .map(|record| Selection {
            name: Arc::from(record.name()),
            tier: SelectionTier::Emergency,
        })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::health::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_INTERVAL};

    fn tracker(names: &[&str]) -> HealthTracker {
        HealthTracker::new(
            names.iter().map(|n| Arc::<str>::from(*n)),
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_RESET_INTERVAL,
        )
    }

    fn use_n(health: &mut HealthTracker, name: &str, n: u64) {
        for _ in 0..n {
            health.record_selection(name);
        }
    }

    fn none() -> HashSet<Arc<str>> {
        HashSet::new()
    }

    #[test]
    fn test_first_attempt_uses_preferred() {
        let mut health = tracker(&["GEMINI_API_KEY", "GEMINI_API_KEY_1", "GEMINI_API_KEY_2"]);
        // Preferred wins even when it is the most used
        use_n(&mut health, "GEMINI_API_KEY_1", 10);

        let selection = choose(&health, Feature::TextToImage, 0, &none()).unwrap();
        assert_eq!(&*selection.name, "GEMINI_API_KEY_1");
        assert_eq!(selection.tier, SelectionTier::Preferred);
    }

    #[test]
    fn test_rate_limited_preferred_falls_through() {
        let mut health = tracker(&["GEMINI_API_KEY_1", "GEMINI_API_KEY_2"]);
        health.mark_unhealthy("GEMINI_API_KEY_1");

        let selection = choose(&health, Feature::TextToImage, 0, &none()).unwrap();
        assert_eq!(&*selection.name, "GEMINI_API_KEY_2");
        assert_eq!(selection.tier, SelectionTier::LeastUsed);
    }

    #[test]
    fn test_missing_preferred_falls_through() {
        let health = tracker(&["GEMINI_API_KEY_8"]);
        let selection = choose(&health, Feature::PhotoRestore, 0, &none()).unwrap();
        assert_eq!(&*selection.name, "GEMINI_API_KEY_8");
        assert_eq!(selection.tier, SelectionTier::LeastUsed);
    }

    #[test]
    fn test_retry_picks_least_used() {
        let mut health = tracker(&["A", "B", "C"]);
        use_n(&mut health, "A", 5);
        use_n(&mut health, "B", 2);
        use_n(&mut health, "C", 8);

        let selection = choose(&health, Feature::Default, 1, &none()).unwrap();
        assert_eq!(&*selection.name, "B");
    }

    #[test]
    fn test_least_used_ties_follow_pool_order() {
        let health = tracker(&["C", "A", "B"]);
        let selection = choose(&health, Feature::Default, 1, &none()).unwrap();
        assert_eq!(&*selection.name, "C");
    }

    #[test]
    fn test_later_attempts_skip_preferred_tier() {
        let mut health = tracker(&["GEMINI_API_KEY_1", "GEMINI_API_KEY_2"]);
        use_n(&mut health, "GEMINI_API_KEY_1", 3);

        let selection = choose(&health, Feature::TextToImage, 1, &none()).unwrap();
        assert_eq!(&*selection.name, "GEMINI_API_KEY_2");
    }

    #[test]
    fn test_excluded_are_never_chosen() {
        let health = tracker(&["A", "B"]);
        let excluded: HashSet<Arc<str>> = [Arc::from("A")].into_iter().collect();
        let selection = choose(&health, Feature::Default, 1, &excluded).unwrap();
        assert_eq!(&*selection.name, "B");
    }

    #[test]
    fn test_emergency_fallback_when_all_unhealthy() {
        let mut health = tracker(&["A", "B"]);
        health.mark_unhealthy("A");
        health.mark_unhealthy("B");
        use_n(&mut health, "A", 4);

        let selection = choose(&health, Feature::Default, 0, &none()).unwrap();
        assert_eq!(&*selection.name, "A");
        assert_eq!(selection.tier, SelectionTier::Emergency);

        let excluded: HashSet<Arc<str>> = [Arc::from("A")].into_iter().collect();
        let selection = choose(&health, Feature::Default, 1, &excluded).unwrap();
        assert_eq!(&*selection.name, "B");
        assert_eq!(selection.tier, SelectionTier::Emergency);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let health = tracker(&["A", "B"]);
        let excluded: HashSet<Arc<str>> = [Arc::from("A"), Arc::from("B")].into_iter().collect();
        assert!(choose(&health, Feature::Default, 2, &excluded).is_none());
    }
}
