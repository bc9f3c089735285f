use sitesurvey_core::{ScreenKey, ScreenSnapshot, SubmitRequest};
use sitesurvey_storage::{SqliteStore, StorageError, SurveyStore};

/// Persistence endpoint double: a real [`SqliteStore`] plus failure
/// injection and a log of every request it accepted.
pub struct TestBackend {
    store: SqliteStore,
    fail_saves: usize,
    offline: bool,
    received: Vec<(ScreenKey, SubmitRequest)>,
}

impl TestBackend {
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self::with_store(SqliteStore::open_in_memory()?))
    }

    pub fn with_store(store: SqliteStore) -> Self {
        Self {
            store,
            fail_saves: 0,
            offline: false,
            received: Vec::new(),
        }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Reject the next `count` saves with [`StorageError::Unavailable`].
    pub fn fail_next_saves(&mut self, count: usize) {
        self.fail_saves = count;
    }

    /// While offline both loads and saves fail.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Requests that reached the store, in order. Failed saves are not logged.
    pub fn received(&self) -> &[(ScreenKey, SubmitRequest)] {
        &self.received
    }

    pub fn last_request(&self) -> Option<&SubmitRequest> {
        self.received.last().map(|(_, request)| request)
    }
}

impl SurveyStore for TestBackend {
    fn load(&self, key: &ScreenKey) -> Result<ScreenSnapshot, StorageError> {
        if self.offline {
            return Err(StorageError::Unavailable("backend offline".into()));
        }
        self.store.load(key)
    }

    fn save(
        &mut self,
        key: &ScreenKey,
        request: &SubmitRequest,
    ) -> Result<ScreenSnapshot, StorageError> {
        if self.offline {
            return Err(StorageError::Unavailable("backend offline".into()));
        }
        if self.fail_saves > 0 {
            self.fail_saves -= 1;
            return Err(StorageError::Unavailable("injected save failure".into()));
        }
        let snapshot = self.store.save(key, request)?;
        self.received.push((key.clone(), request.clone()));
        Ok(snapshot)
    }
}
