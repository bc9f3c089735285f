use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Why a screen holds unsaved changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirtyReason {
    Field { entity: usize, field: String },
    EntityCount,
    Media { slot: String },
}

#[derive(Debug, Default)]
struct DirtyState {
    reasons: BTreeSet<DirtyReason>,
    /// Bumped on every mutation; lets a save clear only what it covered.
    generation: u64,
    /// Generation of the last mark-clean.
    clean_at: u64,
}

/// Shared unsaved-changes flag for one screen.
///
/// Clones share state: the grid, the media reconciler and the navigation
/// guard each hold a handle onto the same tracker.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    inner: Arc<Mutex<DirtyState>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DirtyState> {
        // A panic while holding the lock cannot leave the state half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mark_dirty(&self, reason: DirtyReason) {
        let mut state = self.state();
        state.generation += 1;
        state.reasons.insert(reason);
    }

    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.generation > state.clean_at
    }

    /// Current mutation generation. Capture before a save, pass to
    /// [`DirtyTracker::mark_clean_at`] after it succeeds.
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn reasons(&self) -> Vec<DirtyReason> {
        self.state().reasons.iter().cloned().collect()
    }

    pub fn mark_clean(&self) {
        let mut state = self.state();
        state.clean_at = state.generation;
        state.reasons.clear();
    }

    /// Clears the flag only if nothing changed after `generation`.
    /// Returns whether the tracker is now clean.
    pub fn mark_clean_at(&self, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation > generation {
            tracing::debug!(
                saved = generation,
                current = state.generation,
                "Edits arrived during save, staying dirty"
            );
            return false;
        }
        state.clean_at = state.generation;
        state.reasons.clear();
        true
    }
}
