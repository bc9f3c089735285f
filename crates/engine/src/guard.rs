//! Unsaved-changes guard for page leave and in-app navigation.
//!
//! The routing layer calls [`UnsavedChangesGuard::intercept`] before it
//! changes route and [`UnsavedChangesGuard::on_before_unload`] from the
//! browser unload hook. A dirty screen is saved before an in-app transition
//! is allowed; unload can only ask the browser to confirm.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sitesurvey_core::DirtyTracker;
use sitesurvey_storage::SurveyStore;
use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::session::ScreenSession;

/// Persists the screen on the guard's behalf.
///
/// `Ok(true)` means saved. `Ok(false)` means the save was declined, e.g. by
/// validation. Either `Ok(false)` or an error blocks navigation.
#[async_trait]
pub trait SaveHandler: Send + Sync {
    async fn save(&self) -> Result<bool, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Clean,
    Dirty,
    /// A guard-triggered save is in flight.
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadDecision {
    Allow,
    /// Ask the browser to show its native leave-page confirmation.
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub from: String,
    pub to: String,
}

impl NavigationRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    SaveDeclined,
    SaveFailed(String),
    /// Another navigation attempt is already saving.
    SaveInFlight,
    /// The save succeeded but newer edits arrived while it ran.
    EditedDuringSave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Deny(DenyReason),
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

/// Holds the in-flight flag; releasing on drop covers a navigation future
/// that is dropped mid-save.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UnsavedChangesGuard<H> {
    dirty: DirtyTracker,
    saver: H,
    saving: AtomicBool,
}

impl<H: SaveHandler> UnsavedChangesGuard<H> {
    pub fn new(dirty: DirtyTracker, saver: H) -> Self {
        Self {
            dirty,
            saver,
            saving: AtomicBool::new(false),
        }
    }

    pub fn saver(&self) -> &H {
        &self.saver
    }

    pub fn state(&self) -> GuardState {
        if self.saving.load(Ordering::Acquire) {
            GuardState::Saving
        } else if self.dirty.is_dirty() {
            GuardState::Dirty
        } else {
            GuardState::Clean
        }
    }

    /// Browser unload. Script cannot await a save here, so a dirty screen
    /// only gets the native confirmation.
    pub fn on_before_unload(&self) -> UnloadDecision {
        if self.dirty.is_dirty() {
            UnloadDecision::Prompt
        } else {
            UnloadDecision::Allow
        }
    }

    /// In-app navigation. Saves a dirty screen first and allows the
    /// transition only if the save succeeded. Attempts made while a save is
    /// in flight are dropped.
    ///
    /// A successful save can still return
    /// `Deny(DenyReason::EditedDuringSave)`: edits that landed while the save
    /// was in flight were not part of it, so the screen stays dirty and the
    /// caller must navigate again to save them.
    pub async fn intercept(&self, request: &NavigationRequest) -> NavigationDecision {
        let Some(_in_flight) = InFlight::acquire(&self.saving) else {
            tracing::debug!(to = %request.to, "Navigation dropped, save already in flight");
            return NavigationDecision::Deny(DenyReason::SaveInFlight);
        };

        if !self.dirty.is_dirty() {
            return NavigationDecision::Allow;
        }

        let generation = self.dirty.generation();
        tracing::debug!(from = %request.from, to = %request.to, "Saving before navigation");

        match self.saver.save().await {
            Ok(true) => {
                if self.dirty.mark_clean_at(generation) {
                    NavigationDecision::Allow
                } else {
                    NavigationDecision::Deny(DenyReason::EditedDuringSave)
                }
            }
            Ok(false) => {
                tracing::info!(to = %request.to, "Save declined, navigation cancelled");
                NavigationDecision::Deny(DenyReason::SaveDeclined)
            }
            Err(e) => {
                tracing::warn!(to = %request.to, error = %e, "Save failed, navigation cancelled");
                NavigationDecision::Deny(DenyReason::SaveFailed(e.to_string()))
            }
        }
    }
}

/// Saves a shared [`ScreenSession`] into a shared store.
pub struct SessionSaver<S> {
    session: Arc<Mutex<ScreenSession>>,
    store: Arc<Mutex<S>>,
}

impl<S> SessionSaver<S> {
    pub fn new(session: Arc<Mutex<ScreenSession>>, store: Arc<Mutex<S>>) -> Self {
        Self { session, store }
    }
}

impl<S> Clone for SessionSaver<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl<S: SurveyStore + Send + 'static> SaveHandler for SessionSaver<S> {
    async fn save(&self) -> Result<bool, EngineError> {
        let mut session = self.session.lock().await;
        let mut store = self.store.lock().await;
        match session.submit(&mut *store) {
            Ok(()) => Ok(true),
            Err(EngineError::Validation { missing }) => {
                tracing::info!(
                    screen = %session.key(),
                    missing = missing.len(),
                    "Required fields blank, not saving"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
