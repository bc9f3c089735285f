use sitesurvey_core::{
    DirtyTracker, FieldGrid, FieldValue, LocalBlob, MediaReconciler, Row, ScreenKey,
    ScreenSnapshot, SubmitRequest,
};
use sitesurvey_storage::SurveyStore;

use crate::config::ScreenConfig;
use crate::error::EngineError;

/// One open form screen: grid, media slots and the shared dirty flag.
pub struct ScreenSession {
    key: ScreenKey,
    config: ScreenConfig,
    grid: FieldGrid,
    media: MediaReconciler,
    dirty: DirtyTracker,
}

impl ScreenSession {
    /// A blank, clean screen that has not talked to the server yet.
    pub fn new(key: ScreenKey, config: ScreenConfig) -> Self {
        let dirty = DirtyTracker::new();
        let grid = FieldGrid::new(config.max_entities, dirty.clone());
        let media = MediaReconciler::new(config.media_slots.iter().cloned(), dirty.clone());
        Self {
            key,
            config,
            grid,
            media,
            dirty,
        }
    }

    /// Open a screen seeded from the store's authoritative state.
    pub fn open<S: SurveyStore + ?Sized>(
        key: ScreenKey,
        config: ScreenConfig,
        store: &S,
    ) -> Result<Self, EngineError> {
        let snapshot = store.load(&key)?;
        let mut session = Self::new(key, config);
        session.reseed(&snapshot);
        tracing::debug!(
            screen = %session.key,
            entities = session.grid.entity_count(),
            "Screen opened"
        );
        Ok(session)
    }

    fn reseed(&mut self, snapshot: &ScreenSnapshot) {
        self.grid.load(&snapshot.entities);
        self.media.load_from_server(&snapshot.media);
    }

    pub fn key(&self) -> &ScreenKey {
        &self.key
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    pub fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    pub fn media(&self) -> &MediaReconciler {
        &self.media
    }

    /// Handle for the navigation guard.
    pub fn tracker(&self) -> DirtyTracker {
        self.dirty.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    // ========================================================================
    // Edits
    // ========================================================================

    pub fn set_entity_count(&mut self, count: usize) {
        self.grid.set_entity_count(count);
    }

    pub fn set_value(
        &mut self,
        index: usize,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), EngineError> {
        Ok(self.grid.set_value(index, field, value.into())?)
    }

    pub fn toggle_member(
        &mut self,
        index: usize,
        field: &str,
        member: &str,
        included: bool,
    ) -> Result<(), EngineError> {
        Ok(self.grid.toggle_member(index, field, member, included)?)
    }

    pub fn push_row(&mut self, index: usize, field: &str, row: Row) -> Result<(), EngineError> {
        Ok(self.grid.push_row(index, field, row)?)
    }

    pub fn remove_row(&mut self, index: usize, field: &str, row: usize) -> Result<Row, EngineError> {
        Ok(self.grid.remove_row(index, field, row)?)
    }

    pub fn set_row_cell(
        &mut self,
        index: usize,
        field: &str,
        row: usize,
        column: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), EngineError> {
        Ok(self.grid.set_row_cell(index, field, row, column, value.into())?)
    }

    pub fn attach(&mut self, slot: &str, blob: LocalBlob) {
        self.media.attach(slot, blob);
    }

    pub fn remove_media(&mut self, slot: &str) -> bool {
        self.media.remove(slot)
    }

    // ========================================================================
    // Submit
    // ========================================================================

    /// Required fields that are blank in some active column.
    pub fn missing_required(&self) -> Vec<(usize, String)> {
        self.grid.blank_fields(&self.config.required_fields)
    }

    /// Active columns plus only the media slots that changed.
    pub fn build_request(&self) -> SubmitRequest {
        SubmitRequest {
            entities: self.grid.snapshot(),
            media: self.media.diff_for_submission().to_parts(),
        }
    }

    /// Persist the screen. On success the grid and media are re-seeded from
    /// the store's answer and the dirty flag clears. On any failure nothing
    /// changes, so calling again is safe.
    pub fn submit<S: SurveyStore + ?Sized>(&mut self, store: &mut S) -> Result<(), EngineError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            tracing::debug!(screen = %self.key, missing = missing.len(), "Submit refused");
            return Err(EngineError::Validation { missing });
        }

        let generation = self.dirty.generation();
        let request = self.build_request();
        let snapshot = match store.save(&self.key, &request) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(screen = %self.key, error = %e, "Save failed, keeping local edits");
                return Err(e.into());
            }
        };

        self.reseed(&snapshot);
        self.dirty.mark_clean_at(generation);
        tracing::info!(
            screen = %self.key,
            entities = request.entities.len(),
            media_parts = request.media.len(),
            "Screen saved"
        );
        Ok(())
    }
}
