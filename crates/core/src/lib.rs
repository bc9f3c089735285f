pub mod dirty;
pub mod error;
pub mod field_value;
pub mod grid;
pub mod ids;
pub mod media;
pub mod record;
pub mod wire;

pub use dirty::{DirtyReason, DirtyTracker};
pub use error::CoreError;
pub use field_value::{FieldValue, Row};
pub use grid::FieldGrid;
pub use ids::*;
pub use media::{LocalBlob, MediaDiff, MediaReconciler, MediaSlot, RemoteImage, SlotAction, SlotState};
pub use record::{Cell, EntityRecord, Provenance};
pub use wire::{
    EntityValues, MediaPart, ScreenSnapshot, SubmitRequest, decode_entities, encode_entities,
};
