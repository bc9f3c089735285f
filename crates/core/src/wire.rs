//! Payloads exchanged with the persistence endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::field_value::FieldValue;
use crate::media::RemoteImage;

/// Field id → raw value for one entity, provenance omitted.
pub type EntityValues = BTreeMap<String, FieldValue>;

/// Msgpack encoding of a screen's entity columns, as stored by the endpoint.
pub fn encode_entities(entities: &[EntityValues]) -> Result<Vec<u8>, CoreError> {
    rmp_serde::to_vec(entities).map_err(|e| CoreError::Serialization(e.to_string()))
}

pub fn decode_entities(bytes: &[u8]) -> Result<Vec<EntityValues>, CoreError> {
    rmp_serde::from_slice(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Authoritative server state for one screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub entities: Vec<EntityValues>,
    pub media: BTreeMap<String, RemoteImage>,
}

/// One media slot's share of a submission. Unchanged slots are absent
/// from [`SubmitRequest::media`] altogether.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPart {
    Binary { filename: String, bytes: Vec<u8> },
    /// Tells the server to delete the slot's prior asset.
    EmptyMarker,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub entities: Vec<EntityValues>,
    pub media: BTreeMap<String, MediaPart>,
}
