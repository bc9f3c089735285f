use std::sync::Arc;

use sitesurvey_core::{ScreenKey, SiteId};
use sitesurvey_engine::{
    EngineError, ScreenCatalog, ScreenSession, SessionSaver, UnsavedChangesGuard,
};
use sitesurvey_storage::{SqliteStore, StorageError};
use tempfile::TempDir;
use tokio::sync::Mutex;

use crate::backend::TestBackend;
use crate::router::TestRouter;

pub const TEST_CATALOG: &str = r#"
[[screen]]
name = "antennas"
max_entities = 12
media_slots = ["antenna_1_photo", "antenna_2_photo", "antenna_3_photo"]
required_fields = ["vendor"]

[[screen]]
name = "generators"
max_entities = 4
media_slots = ["generator_nameplate", "fuel_tank_photo"]

[[screen]]
name = "site_info"
media_slots = ["site_overview"]
"#;

pub type SharedSession = Arc<Mutex<ScreenSession>>;
pub type SiteGuard = UnsavedChangesGuard<SessionSaver<TestBackend>>;

/// One survey site talking to a shared [`TestBackend`].
pub struct TestSite {
    pub site_id: SiteId,
    pub catalog: ScreenCatalog,
    pub backend: Arc<Mutex<TestBackend>>,
    _dir: Option<TempDir>,
}

impl TestSite {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            site_id: SiteId::new(),
            catalog: ScreenCatalog::from_toml_str(TEST_CATALOG)?,
            backend: Arc::new(Mutex::new(TestBackend::new()?)),
            _dir: None,
        })
    }

    /// Site whose backend lives in a SQLite file inside a temp dir.
    pub fn file_backed() -> Result<Self, EngineError> {
        let dir = tempfile::tempdir()?;
        let store = SqliteStore::open(dir.path().join("survey.db"))?;
        Ok(Self {
            site_id: SiteId::new(),
            catalog: ScreenCatalog::from_toml_str(TEST_CATALOG)?,
            backend: Arc::new(Mutex::new(TestBackend::with_store(store))),
            _dir: Some(dir),
        })
    }

    pub fn key(&self, screen: &str) -> ScreenKey {
        ScreenKey::new(self.site_id, screen)
    }

    pub async fn open_screen(&self, screen: &str) -> Result<SharedSession, EngineError> {
        let config = self.catalog.screen(screen)?.clone();
        let backend = self.backend.lock().await;
        let session = ScreenSession::open(self.key(screen), config, &*backend)?;
        Ok(Arc::new(Mutex::new(session)))
    }

    pub async fn guard_for(&self, session: &SharedSession) -> SiteGuard {
        let tracker = session.lock().await.tracker();
        UnsavedChangesGuard::new(
            tracker,
            SessionSaver::new(Arc::clone(session), Arc::clone(&self.backend)),
        )
    }

    /// Open a screen and put a router on it, starting at `/sites/{id}/{screen}`.
    pub async fn route_to(
        &self,
        screen: &str,
    ) -> Result<(SharedSession, TestRouter<SessionSaver<TestBackend>>), EngineError> {
        let session = self.open_screen(screen).await?;
        let guard = self.guard_for(&session).await;
        let router = TestRouter::new(format!("/sites/{}/{screen}", self.site_id), guard);
        Ok((session, router))
    }

    pub async fn revision(&self, screen: &str) -> Result<Option<i64>, StorageError> {
        self.backend.lock().await.store().revision(&self.key(screen))
    }
}
