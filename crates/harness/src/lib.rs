pub mod backend;
pub mod router;
pub mod site;

pub use backend::TestBackend;
pub use router::TestRouter;
pub use site::{SharedSession, SiteGuard, TestSite, TEST_CATALOG};

/// Route `tracing` output to the test writer. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
