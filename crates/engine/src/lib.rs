pub mod config;
pub mod error;
pub mod guard;
pub mod session;

pub use config::{ScreenCatalog, ScreenConfig};
pub use error::EngineError;
pub use guard::{
    DenyReason, GuardState, NavigationDecision, NavigationRequest, SaveHandler, SessionSaver,
    UnloadDecision, UnsavedChangesGuard,
};
pub use session::ScreenSession;
