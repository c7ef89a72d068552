//! Decision policies
//!
//! A policy maps a [`DecisionSnapshot`] to a jump decision. Policies are
//! shared between sessions through a [`PolicyHandle`]; replacing the policy
//! swaps the whole handle slot, so a decision in progress always finishes
//! against the policy it started with.

pub mod heuristic;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::PolicyError;
use crate::sim::DecisionSnapshot;

pub use heuristic::{NavigationHeuristic, Rule, Verdict};

/// Shared interface implemented by every decision policy.
///
/// Implementations must be free of side effects on the simulation: the
/// snapshot is an owned copy and `decide` only gets `&self`.
pub trait Policy: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Return `true` to apply a jump impulse this tick
    fn decide(&self, snapshot: &DecisionSnapshot) -> Result<bool, PolicyError>;
}

/// Cloneable slot holding the active policy
#[derive(Clone)]
pub struct PolicyHandle {
    slot: Arc<RwLock<Arc<dyn Policy>>>,
}

impl PolicyHandle {
    pub fn new(policy: impl Policy + 'static) -> Self {
        Self::from_arc(Arc::new(policy))
    }

    pub fn from_arc(policy: Arc<dyn Policy>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(policy)),
        }
    }

    /// The policy to use for one decision. Hold on to the returned `Arc`
    /// for the whole call; later replacements do not affect it.
    pub fn current(&self) -> Arc<dyn Policy> {
        // A poisoned slot still holds a complete Arc
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Atomically install a new policy, returning the previous one
    pub fn replace(&self, policy: Arc<dyn Policy>) -> Arc<dyn Policy> {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        log::info!("Replacing policy '{}' with '{}'", guard.name(), policy.name());
        std::mem::replace(&mut *guard, policy)
    }

    /// Evaluate the current policy on `snapshot`
    pub fn decide(&self, snapshot: &DecisionSnapshot) -> Result<bool, PolicyError> {
        evaluate(self.current().as_ref(), snapshot)
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self::new(NavigationHeuristic::default())
    }
}

impl std::fmt::Debug for PolicyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyHandle")
            .field("policy", &self.current().name())
            .finish()
    }
}

/// Run a policy, turning a panic into [`PolicyError::Panicked`]
pub fn evaluate(policy: &dyn Policy, snapshot: &DecisionSnapshot) -> Result<bool, PolicyError> {
    match panic::catch_unwind(AssertUnwindSafe(|| policy.decide(snapshot))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PolicyError::Panicked {
                policy: policy.name().to_string(),
                message,
            })
        }
    }
}

/// Always returns the same decision
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPolicy(pub bool);

impl Policy for FixedPolicy {
    fn name(&self) -> &str {
        if self.0 { "always-jump" } else { "never-jump" }
    }

    fn decide(&self, _snapshot: &DecisionSnapshot) -> Result<bool, PolicyError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelCatalog;
    use crate::settings::Settings;
    use crate::sim::SimState;

    struct Panicky;

    impl Policy for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn decide(&self, _snapshot: &DecisionSnapshot) -> Result<bool, PolicyError> {
            panic!("boom");
        }
    }

    fn snapshot() -> DecisionSnapshot {
        let catalog = LevelCatalog::builtin();
        let (_, level) = catalog.resolve("simple");
        SimState::load(level, &Settings::default(), 5)
            .unwrap()
            .decision_snapshot()
    }

    #[test]
    fn test_replace_is_seen_by_clones() {
        let handle = PolicyHandle::new(FixedPolicy(false));
        let shared = handle.clone();
        let snap = snapshot();
        assert_eq!(shared.decide(&snap), Ok(false));

        let old = handle.replace(Arc::new(FixedPolicy(true)));
        assert_eq!(old.name(), "never-jump");
        assert_eq!(shared.decide(&snap), Ok(true));
    }

    #[test]
    fn test_held_policy_survives_replacement() {
        let handle = PolicyHandle::new(FixedPolicy(false));
        let held = handle.current();
        handle.replace(Arc::new(FixedPolicy(true)));
        assert_eq!(held.decide(&snapshot()), Ok(false));
    }

    #[test]
    fn test_panic_becomes_error() {
        let err = evaluate(&Panicky, &snapshot()).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Panicked {
                policy: "panicky".into(),
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let handle = PolicyHandle::default();
        let snap = Arc::new(snapshot());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                let snap = Arc::clone(&snap);
                std::thread::spawn(move || handle.decide(&snap))
            })
            .collect();
        let expected = handle.decide(&snap);
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    }
}
