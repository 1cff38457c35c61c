//! Per-learner generation locks.

use crate::types::LearnerId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Set of learners with a run in progress. Acquisition never waits.
#[derive(Debug, Default, Clone)]
pub struct LearnerLocks {
    held: Arc<Mutex<HashSet<LearnerId>>>,
}

impl LearnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the learner's lock, or `None` if another run holds it.
    pub fn try_acquire(&self, learner: &LearnerId) -> Option<LearnerLockGuard> {
        if !self.held.lock().insert(learner.clone()) {
            return None;
        }
        debug!(learner = %learner, "Generation lock acquired");
        Some(LearnerLockGuard {
            held: Arc::clone(&self.held),
            learner: learner.clone(),
        })
    }

    pub fn is_locked(&self, learner: &LearnerId) -> bool {
        self.held.lock().contains(learner)
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }
}

/// Releases the learner's lock when dropped.
#[derive(Debug)]
pub struct LearnerLockGuard {
    held: Arc<Mutex<HashSet<LearnerId>>>,
    learner: LearnerId,
}

impl Drop for LearnerLockGuard {
    fn drop(&mut self) {
        self.held.lock().remove(&self.learner);
        debug!(learner = %self.learner, "Generation lock released");
    }
}
