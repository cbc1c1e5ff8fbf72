use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{AudioMarker, OratureCueType};
use crate::audio::AudioCue;

type MarkerMap = BTreeMap<OratureCueType, Vec<AudioMarker>>;

/// Markers grouped by kind.
///
/// Every call takes the same lock, so a collection can be shared across
/// threads; callers still see whole-call snapshots, not live views.
#[derive(Debug, Default)]
pub struct OratureMarkers {
    markers: Mutex<MarkerMap>,
}

impl OratureMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MarkerMap> {
        self.markers.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_marker(&self, cue_type: OratureCueType, marker: AudioMarker) {
        self.lock().entry(cue_type).or_default().push(marker);
    }

    pub fn add_markers(&self, cue_type: OratureCueType, markers: Vec<AudioMarker>) {
        self.lock().entry(cue_type).or_default().extend(markers);
    }

    pub fn markers(&self, cue_type: OratureCueType) -> Vec<AudioMarker> {
        self.lock().get(&cue_type).cloned().unwrap_or_default()
    }

    pub fn all_markers(&self) -> Vec<AudioMarker> {
        self.lock().values().flatten().cloned().collect()
    }

    pub fn clear_markers_of_type(&self, cue_type: OratureCueType) {
        if let Some(markers) = self.lock().get_mut(&cue_type) {
            markers.clear();
        }
    }

    /// Every marker as a namespaced cue.
    pub fn cues(&self) -> Vec<AudioCue> {
        self.lock().values().flatten().map(AudioMarker::to_cue).collect()
    }

    /// Append all of `other`'s markers to this collection.
    pub fn import(&self, other: &OratureMarkers) {
        if std::ptr::eq(self, other) {
            return;
        }
        let snapshot = other.lock().clone();
        let mut markers = self.lock();
        for (cue_type, entries) in snapshot {
            markers.entry(cue_type).or_default().extend(entries);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for OratureMarkers {
    fn clone(&self) -> Self {
        Self {
            markers: Mutex::new(self.lock().clone()),
        }
    }
}
