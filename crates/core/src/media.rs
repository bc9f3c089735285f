use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::dirty::{DirtyReason, DirtyTracker};
use crate::ids::{BlobHandle, ImageId};
use crate::wire::MediaPart;

/// An image the server already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub id: ImageId,
    pub url: String,
    pub filename: String,
}

/// A file picked by the user but not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalBlob {
    handle: BlobHandle,
    filename: String,
    bytes: Vec<u8>,
}

impl LocalBlob {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            handle: BlobHandle::new(),
            filename: filename.into(),
            bytes,
        }
    }

    pub fn handle(&self) -> BlobHandle {
        self.handle
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for LocalBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBlob")
            .field("handle", &self.handle)
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotState {
    #[default]
    Empty,
    Remote(RemoteImage),
    StagedLocal(LocalBlob),
    /// Explicitly cleared; the server must drop the prior asset.
    Removed,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Remote(_) => "remote",
            Self::StagedLocal(_) => "staged",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    pub name: String,
    pub state: SlotState,
}

/// What a submission must carry for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction<'a> {
    SendBinary(&'a LocalBlob),
    SendEmptyMarker,
    Omit,
}

impl SlotAction<'_> {
    pub fn is_omit(&self) -> bool {
        matches!(self, SlotAction::Omit)
    }

    pub fn to_part(&self) -> Option<MediaPart> {
        match self {
            SlotAction::SendBinary(blob) => Some(MediaPart::Binary {
                filename: blob.filename().to_string(),
                bytes: blob.bytes().to_vec(),
            }),
            SlotAction::SendEmptyMarker => Some(MediaPart::EmptyMarker),
            SlotAction::Omit => None,
        }
    }
}

/// Per-slot actions for every known slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDiff<'a> {
    actions: BTreeMap<&'a str, SlotAction<'a>>,
}

impl<'a> MediaDiff<'a> {
    pub fn get(&self, name: &str) -> Option<SlotAction<'a>> {
        self.actions.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, SlotAction<'a>)> + '_ {
        self.actions.iter().map(|(name, action)| (*name, *action))
    }

    pub fn changed(&self) -> impl Iterator<Item = (&'a str, SlotAction<'a>)> + '_ {
        self.iter().filter(|(_, action)| !action.is_omit())
    }

    pub fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }

    /// Multipart-style payload: changed slots only.
    pub fn to_parts(&self) -> BTreeMap<String, MediaPart> {
        self.iter()
            .filter_map(|(name, action)| action.to_part().map(|part| (name.to_string(), part)))
            .collect()
    }
}

/// Tracks attachment slots for one screen and decides what to upload.
#[derive(Debug)]
pub struct MediaReconciler {
    slots: BTreeMap<String, MediaSlot>,
    dirty: DirtyTracker,
}

impl MediaReconciler {
    pub fn new<I, S>(names: I, dirty: DirtyTracker) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let slot = MediaSlot {
                    name: name.clone(),
                    state: SlotState::Empty,
                };
                (name, slot)
            })
            .collect();
        Self { slots, dirty }
    }

    pub fn slot(&self, name: &str) -> Option<&MediaSlot> {
        self.slots.get(name)
    }

    pub fn state(&self, name: &str) -> Option<&SlotState> {
        self.slots.get(name).map(|s| &s.state)
    }

    pub fn slots(&self) -> impl Iterator<Item = &MediaSlot> {
        self.slots.values()
    }

    fn slot_mut(&mut self, name: &str) -> &mut MediaSlot {
        self.slots
            .entry(name.to_string())
            .or_insert_with(|| MediaSlot {
                name: name.to_string(),
                state: SlotState::Empty,
            })
    }

    /// Replace all slot state with what the server holds. Known slots the
    /// server did not list become empty. Does not mark dirty.
    pub fn load_from_server(&mut self, remote: &BTreeMap<String, RemoteImage>) {
        for slot in self.slots.values_mut() {
            slot.state = SlotState::Empty;
        }
        for (name, image) in remote {
            self.slot_mut(name).state = SlotState::Remote(image.clone());
        }
        tracing::debug!(slots = self.slots.len(), remote = remote.len(), "Media slots loaded");
    }

    /// Stage a local file, replacing whatever the slot held.
    pub fn attach(&mut self, name: &str, blob: LocalBlob) {
        let slot = self.slot_mut(name);
        tracing::debug!(
            slot = name,
            blob = %blob.handle(),
            bytes = blob.bytes().len(),
            replaces = slot.state.as_str(),
            "Staging attachment"
        );
        slot.state = SlotState::StagedLocal(blob);
        self.dirty.mark_dirty(DirtyReason::Media {
            slot: name.to_string(),
        });
    }

    /// Clear a remote or staged slot. Removing an empty, already removed,
    /// or unknown slot changes nothing. Returns whether the slot changed.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        match slot.state {
            SlotState::Remote(_) | SlotState::StagedLocal(_) => {
                tracing::debug!(slot = name, from = slot.state.as_str(), "Removing attachment");
                slot.state = SlotState::Removed;
                self.dirty.mark_dirty(DirtyReason::Media {
                    slot: name.to_string(),
                });
                true
            }
            SlotState::Empty | SlotState::Removed => false,
        }
    }

    pub fn diff_for_submission(&self) -> MediaDiff<'_> {
        let actions = self
            .slots
            .iter()
            .map(|(name, slot)| {
                let action = match &slot.state {
                    SlotState::StagedLocal(blob) => SlotAction::SendBinary(blob),
                    SlotState::Removed => SlotAction::SendEmptyMarker,
                    SlotState::Remote(_) | SlotState::Empty => SlotAction::Omit,
                };
                (name.as_str(), action)
            })
            .collect();
        MediaDiff { actions }
    }

    pub fn changed_slots(&self) -> Vec<&str> {
        self.diff_for_submission()
            .changed()
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn remote(filename: &str) -> RemoteImage {
        RemoteImage {
            id: ImageId::new(),
            url: format!("https://media.example/{filename}"),
            filename: filename.to_string(),
        }
    }

    fn loaded() -> MediaReconciler {
        let mut media = MediaReconciler::new(
            ["tower_photo", "antenna_1_photo", "antenna_2_photo"],
            DirtyTracker::new(),
        );
        let mut server = BTreeMap::new();
        server.insert("tower_photo".to_string(), remote("tower.jpg"));
        media.load_from_server(&server);
        media
    }

    #[test]
    fn load_does_not_mark_dirty_and_omits_everything() {
        let media = loaded();
        assert!(!media.dirty.is_dirty());
        assert!(matches!(media.state("tower_photo"), Some(SlotState::Remote(_))));
        assert_eq!(media.state("antenna_1_photo"), Some(&SlotState::Empty));

        let diff = media.diff_for_submission();
        assert_eq!(diff.iter().count(), 3);
        assert!(!diff.has_changes());
        assert!(diff.to_parts().is_empty());
    }

    #[test]
    fn state_labels_follow_the_slot_lifecycle() {
        let mut media = loaded();
        let label = |m: &MediaReconciler| m.state("tower_photo").map(SlotState::as_str);
        assert_eq!(label(&media), Some("remote"));

        media.attach("tower_photo", LocalBlob::new("tower_v2.jpg", vec![4; 4]));
        assert_eq!(label(&media), Some("staged"));

        assert!(media.remove("tower_photo"));
        assert_eq!(label(&media), Some("removed"));
        assert_eq!(media.state("antenna_2_photo").map(SlotState::as_str), Some("empty"));
    }

    #[test]
    fn identical_files_get_distinct_handles() {
        let a = LocalBlob::new("same.jpg", vec![1, 2]);
        let b = LocalBlob::new("same.jpg", vec![1, 2]);
        assert_ne!(a.handle(), b.handle());
        assert_ne!(a, b);
    }

    #[test]
    fn diff_is_idempotent() {
        let mut media = loaded();
        media.attach("antenna_1_photo", LocalBlob::new("a1.jpg", vec![1, 2, 3]));
        assert_eq!(media.diff_for_submission(), media.diff_for_submission());
    }

    #[test]
    fn three_way_actions() {
        let mut media = loaded();
        let blob = LocalBlob::new("a1.jpg", vec![0xFF, 0xD8]);
        media.attach("antenna_1_photo", blob.clone());
        assert!(media.remove("tower_photo"));

        let diff = media.diff_for_submission();
        assert_eq!(diff.get("antenna_1_photo"), Some(SlotAction::SendBinary(&blob)));
        assert_eq!(diff.get("tower_photo"), Some(SlotAction::SendEmptyMarker));
        assert_eq!(diff.get("antenna_2_photo"), Some(SlotAction::Omit));
        assert_eq!(media.changed_slots(), vec!["antenna_1_photo", "tower_photo"]);

        let parts = diff.to_parts();
        assert_eq!(
            parts.get("antenna_1_photo"),
            Some(&MediaPart::Binary {
                filename: "a1.jpg".into(),
                bytes: vec![0xFF, 0xD8],
            })
        );
        assert_eq!(parts.get("tower_photo"), Some(&MediaPart::EmptyMarker));
        assert!(!parts.contains_key("antenna_2_photo"));
    }

    #[test]
    fn removing_empty_slot_is_a_clean_noop() {
        let mut media = loaded();
        assert!(!media.remove("antenna_2_photo"));
        assert!(!media.remove("not_a_slot"));
        assert!(!media.dirty.is_dirty());
        assert_eq!(media.state("antenna_2_photo"), Some(&SlotState::Empty));
    }

    #[test]
    fn removing_staged_slot_tombstones_it() {
        let mut media = loaded();
        media.attach("antenna_2_photo", LocalBlob::new("a2.jpg", vec![7]));
        assert!(media.remove("antenna_2_photo"));
        assert_eq!(media.state("antenna_2_photo"), Some(&SlotState::Removed));
        assert!(!media.remove("antenna_2_photo"));
    }

    #[test]
    fn attach_overrides_removed_and_registers_new_names() {
        let mut media = loaded();
        media.remove("tower_photo");
        media.attach("tower_photo", LocalBlob::new("tower2.jpg", vec![9]));
        media.attach("shelter_photo", LocalBlob::new("shelter.jpg", vec![4]));

        assert!(matches!(media.state("tower_photo"), Some(SlotState::StagedLocal(_))));
        assert!(media.slot("shelter_photo").is_some());
        assert_eq!(
            media.dirty.reasons(),
            vec![
                DirtyReason::Media { slot: "shelter_photo".into() },
                DirtyReason::Media { slot: "tower_photo".into() },
            ]
        );
    }

    #[test]
    fn reload_resets_staged_and_removed_slots() {
        let mut media = loaded();
        media.attach("antenna_1_photo", LocalBlob::new("a1.jpg", vec![1]));
        media.remove("tower_photo");

        let mut server = BTreeMap::new();
        server.insert("antenna_1_photo".to_string(), remote("a1.jpg"));
        media.load_from_server(&server);

        assert_eq!(media.state("tower_photo"), Some(&SlotState::Empty));
        assert!(matches!(media.state("antenna_1_photo"), Some(SlotState::Remote(_))));
        assert!(!media.diff_for_submission().has_changes());
    }
}
