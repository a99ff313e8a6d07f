//! Identity manager for tracked detections.
//!
//! Owns every live [`TrackedDetection`] and decides, frame by frame, which
//! candidates describe the same object, how identities chain across time,
//! and which candidates to drop. All operations are synchronous map
//! mutations; callers drive them in timestamp order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use toytrack_models::{NormalizedRect, Timestamp};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::metrics::{self, RemovalReason};
use crate::tracked_detection::{DetectionId, TrackedDetection};

/// Manager of the live set of tracked detections.
#[derive(Debug, Clone)]
pub struct TrackedDetectionManager {
    config: TrackerConfig,
    detections: BTreeMap<DetectionId, TrackedDetection>,
    /// Overlap of a newly admitted detection with an older duplicate.
    /// Only valid until the next convergence pass.
    current_frame_iou: BTreeMap<DetectionId, f64>,
    previous_confirmed_detection: Option<TrackedDetection>,
}

impl TrackedDetectionManager {
    /// Create an empty manager.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            detections: BTreeMap::new(),
            current_frame_iou: BTreeMap::new(),
            previous_confirmed_detection: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live detections keyed by id.
    pub fn detections(&self) -> &BTreeMap<DetectionId, TrackedDetection> {
        &self.detections
    }

    pub fn get(&self, id: DetectionId) -> Option<&TrackedDetection> {
        self.detections.get(&id)
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// The live detection with the lowest id, reported as the track.
    pub fn best_detection(&self) -> Option<&TrackedDetection> {
        self.detections.values().next()
    }

    /// Overlap recorded for `id` during the current admission pass.
    pub fn current_frame_iou(&self, id: DetectionId) -> Option<f64> {
        self.current_frame_iou.get(&id).copied()
    }

    pub fn previous_confirmed_detection(&self) -> Option<&TrackedDetection> {
        self.previous_confirmed_detection.as_ref()
    }

    /// Set the anchor that the convergence pass prefers when every live
    /// detection is a root.
    pub fn set_previous_confirmed_detection(&mut self, detection: Option<TrackedDetection>) {
        if let Some(detection) = &detection {
            debug!(
                detection_id = detection.unique_id(),
                previous_id = ?detection.previous_id(),
                "Confirmed detection anchor updated"
            );
        }
        self.previous_confirmed_detection = detection;
    }

    /// Drop all detections, overlaps and the confirmed anchor.
    pub fn clear(&mut self) {
        self.detections.clear();
        self.current_frame_iou.clear();
        self.previous_confirmed_detection = None;
        metrics::set_live_detections(0);
    }

    /// Admit a new detection.
    ///
    /// Labels of every live duplicate are merged into the new detection, and
    /// the duplicate with the latest initial timestamp becomes its
    /// predecessor. Admission never rejects; duplicates are resolved by the
    /// removal passes.
    pub fn add_detection(&mut self, detection: TrackedDetection) {
        let config = self.config;
        let mut detection = detection;
        let id = detection.unique_id();

        let mut latest_duplicate_timestamp: Option<Timestamp> = None;
        let mut older_duplicate_iou: Option<f64> = None;

        for existing in self.detections.values() {
            if existing.unique_id() == id {
                continue;
            }
            if !detection.is_same_as(existing, config.max_area_ratio, config.min_overlap_ratio) {
                continue;
            }

            // A fresh detection usually has the better box, so only labels move.
            detection.merge_label_scores(existing);

            if latest_duplicate_timestamp.map_or(true, |ts| existing.initial_timestamp() > ts) {
                latest_duplicate_timestamp = Some(existing.initial_timestamp());
                detection.set_previous_id(Some(
                    existing.previous_id().unwrap_or(existing.unique_id()),
                ));
            }

            // Last qualifying match wins, not the largest overlap.
            if existing.initial_timestamp() < detection.initial_timestamp() {
                older_duplicate_iou = Some(detection.intersection_over_union(existing));
            }
        }

        if let Some(replaced) = self.detections.get(&id) {
            warn!(detection_id = id, "Admitted detection replaces a live one with the same id");
            if detection.is_root() {
                detection.set_previous_id(replaced.previous_id());
            }
        }

        match older_duplicate_iou {
            Some(iou) => {
                self.current_frame_iou.insert(id, iou);
            }
            None => {
                self.current_frame_iou.remove(&id);
            }
        }

        debug!(
            detection_id = id,
            previous_id = ?detection.previous_id(),
            iou = ?older_duplicate_iou,
            "Detection admitted"
        );
        self.detections.insert(id, detection);
        metrics::record_admitted();
        metrics::set_live_detections(self.detections.len());
    }

    /// Move detection `id` to a new box at `timestamp`.
    ///
    /// Duplicates are re-checked immediately: during fast motion two
    /// detections of one object can diverge before both are propagated to
    /// the same timestamp. Unknown ids are ignored.
    pub fn update_detection_location(
        &mut self,
        id: DetectionId,
        bounding_box: NormalizedRect,
        timestamp: Timestamp,
    ) -> Vec<DetectionId> {
        let Some(detection) = self.detections.get_mut(&id) else {
            return Vec::new();
        };
        detection.set_bounding_box(bounding_box);
        detection.set_last_updated_timestamp(timestamp);

        self.remove_duplicated_detections(id)
    }

    /// Resolve duplicates of detection `id` among detections updated at the
    /// same timestamp, keeping the most recently created instance.
    ///
    /// Returns the removed ids. Unknown ids are ignored.
    pub fn remove_duplicated_detections(&mut self, id: DetectionId) -> Vec<DetectionId> {
        let Some(anchor) = self.detections.get(&id).cloned() else {
            return Vec::new();
        };
        let config = self.config;

        let mut survivor_id = id;
        // Most recently created detection among the discarded ones.
        let mut ancestor: Option<(DetectionId, Timestamp)> = None;
        let mut ids_to_remove = Vec::new();

        let other_ids: Vec<DetectionId> = self
            .detections
            .keys()
            .copied()
            .filter(|other_id| *other_id != id)
            .collect();

        for other_id in other_ids {
            let other = &self.detections[&other_id];
            // Locations at different timestamps are not comparable.
            if other.last_updated_timestamp() != anchor.last_updated_timestamp() {
                continue;
            }
            if !anchor.is_same_as(other, config.max_area_ratio, config.min_overlap_ratio) {
                continue;
            }

            let survivor_timestamp = self.detections[&survivor_id].initial_timestamp();
            let other_timestamp = other.initial_timestamp();
            let (kept, discarded) = match survivor_timestamp.cmp(&other_timestamp) {
                Ordering::Greater => (survivor_id, other_id),
                Ordering::Less => (other_id, survivor_id),
                Ordering::Equal => (survivor_id.min(other_id), survivor_id.max(other_id)),
            };

            let discarded_detection = self.detections[&discarded].clone();
            if let Some(kept_detection) = self.detections.get_mut(&kept) {
                kept_detection.merge_label_scores(&discarded_detection);
                if survivor_timestamp == other_timestamp
                    && kept_detection.is_root()
                    && discarded_detection.previous_id().is_some()
                    && discarded_detection.previous_id() != Some(kept)
                {
                    // Same creation time: neither is the other's ancestor,
                    // but the survivor keeps the discarded instance's chain.
                    kept_detection.set_previous_id(discarded_detection.previous_id());
                }
            }

            if survivor_timestamp != other_timestamp
                && ancestor.map_or(true, |(_, ts)| ts < discarded_detection.initial_timestamp())
            {
                ancestor = Some((discarded, discarded_detection.initial_timestamp()));
            }

            debug!(
                detection_id = id,
                kept = kept,
                discarded = discarded,
                "Duplicate detection resolved"
            );
            ids_to_remove.push(discarded);
            survivor_id = kept;
        }

        if let Some((ancestor_id, _)) = ancestor {
            let ancestor_detection = &self.detections[&ancestor_id];
            let chain_id = ancestor_detection
                .previous_id()
                .unwrap_or(ancestor_detection.unique_id());
            if let Some(survivor) = self.detections.get_mut(&survivor_id) {
                // A survivor that already has a predecessor keeps it.
                if survivor.is_root() {
                    survivor.set_previous_id(Some(chain_id));
                }
            }
        }

        self.erase(&ids_to_remove, RemovalReason::Duplicate);
        ids_to_remove
    }

    /// Convergence pass: collapse ambiguous candidates to one identity.
    ///
    /// Roots are removed. When nothing is chained yet, one root is spared:
    /// the one matching the confirmed anchor if an anchor is set, otherwise
    /// the one closest to the image center, which then anchors itself. When
    /// chained detections exist and some overlapped an older duplicate on
    /// admission, only those tied at the largest overlap survive.
    pub fn remove_multiple_detections(&mut self) -> Vec<DetectionId> {
        let config = self.config;
        let mut ids_to_remove = Vec::new();
        let mut chained: Vec<(DetectionId, f64)> = Vec::new();

        let mut max_iou = 0.0_f64;
        let mut min_distance_to_center = 1.0_f64;
        let mut closest_to_center: Option<DetectionId> = None;

        for (id, detection) in &self.detections {
            if detection.is_root() {
                let distance = detection.bounding_box().distance_to_center_squared();
                if distance < min_distance_to_center {
                    min_distance_to_center = distance;
                    closest_to_center = Some(*id);
                }
                ids_to_remove.push(*id);
            } else {
                let iou = self.current_frame_iou.get(id).copied().unwrap_or(0.0);
                if iou > max_iou {
                    max_iou = iou;
                }
                chained.push((*id, iou));
            }
        }

        if ids_to_remove.len() == self.detections.len() {
            if let Some(anchor) = &self.previous_confirmed_detection {
                let matching = ids_to_remove.iter().copied().find(|id| {
                    anchor.is_same_as(
                        &self.detections[id],
                        config.max_area_ratio,
                        config.min_overlap_ratio,
                    )
                });
                match matching {
                    Some(keep) => {
                        let chain_id = anchor.previous_id().unwrap_or(anchor.unique_id());
                        if let Some(detection) = self.detections.get_mut(&keep) {
                            detection.set_previous_id(Some(chain_id));
                        }
                        ids_to_remove.retain(|id| *id != keep);
                        info!(
                            detection_id = keep,
                            previous_id = chain_id,
                            "Kept detection matching the confirmed anchor"
                        );
                    }
                    None => {
                        debug!(
                            anchor_id = anchor.unique_id(),
                            candidates = ids_to_remove.len(),
                            "No candidate matches the confirmed anchor"
                        );
                    }
                }
            } else if let Some(keep) = closest_to_center {
                if let Some(detection) = self.detections.get_mut(&keep) {
                    detection.set_previous_id(Some(keep));
                }
                ids_to_remove.retain(|id| *id != keep);
                info!(
                    detection_id = keep,
                    distance = min_distance_to_center,
                    "Kept detection closest to the image center"
                );
            }
        } else if max_iou > 0.0 {
            // Detections tied at the maximum all survive.
            ids_to_remove.extend(
                chained
                    .iter()
                    .filter(|(_, iou)| *iou < max_iou)
                    .map(|(id, _)| *id),
            );
            debug!(max_iou = max_iou, "Pruned chained detections below the best overlap");
        }

        self.erase(&ids_to_remove, RemovalReason::Convergence);
        self.current_frame_iou.clear();
        ids_to_remove
    }

    /// Remove detections last updated strictly before `timestamp`.
    pub fn remove_obsolete_detections(&mut self, timestamp: Timestamp) -> Vec<DetectionId> {
        let ids_to_remove: Vec<DetectionId> = self
            .detections
            .iter()
            .filter(|(_, detection)| detection.last_updated_timestamp() < timestamp)
            .map(|(id, _)| *id)
            .collect();

        self.erase(&ids_to_remove, RemovalReason::Obsolete);
        ids_to_remove
    }

    /// Remove detections not refreshed within the configured horizon of `now`.
    pub fn remove_expired_detections(&mut self, now: Timestamp) -> Vec<DetectionId> {
        self.remove_obsolete_detections(now.saturating_sub(self.config.obsolete_horizon_us))
    }

    /// Remove detections whose corners all lie outside the image.
    pub fn remove_out_of_view_detections(&mut self) -> Vec<DetectionId> {
        let ids_to_remove: Vec<DetectionId> = self
            .detections
            .iter()
            .filter(|(_, detection)| detection.bounding_box().is_out_of_view())
            .map(|(id, _)| *id)
            .collect();

        self.erase(&ids_to_remove, RemovalReason::OutOfView);
        ids_to_remove
    }

    fn erase(&mut self, ids: &[DetectionId], reason: RemovalReason) {
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.detections.remove(id);
            self.current_frame_iou.remove(id);
        }
        debug!(reason = reason.as_str(), removed = ?ids, "Detections removed");
        metrics::record_removed(reason, ids.len());
        metrics::set_live_detections(self.detections.len());
    }
}

impl Default for TrackedDetectionManager {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, size: f64) -> NormalizedRect {
        NormalizedRect::new(x, y, size, size)
    }

    fn detection(id: DetectionId, x: f64, y: f64, timestamp: Timestamp) -> TrackedDetection {
        TrackedDetection::new(id, rect(x, y, 0.1), timestamp)
    }

    fn ids(manager: &TrackedDetectionManager) -> Vec<DetectionId> {
        manager.detections().keys().copied().collect()
    }

    #[test]
    fn test_add_detection_keeps_owned_copy() {
        let mut manager = TrackedDetectionManager::default();
        let mut incoming = detection(1, 0.5, 0.5, 0);
        manager.add_detection(incoming.clone());

        incoming.set_bounding_box(rect(0.1, 0.1, 0.1));

        assert_eq!(manager.get(1).unwrap().bounding_box().x_center, 0.5);
    }

    #[test]
    fn test_chain_propagates_to_root_duplicate() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.51, 0.5, 50));

        assert_eq!(manager.get(2).unwrap().previous_id(), Some(1));
        assert!(manager.current_frame_iou(2).unwrap() > 0.0);
        assert!(manager.current_frame_iou(1).is_none());
    }

    #[test]
    fn test_chain_propagates_through_chained_duplicate() {
        let mut manager = TrackedDetectionManager::default();
        let mut chained = detection(5, 0.5, 0.5, 10);
        chained.set_previous_id(Some(2));
        manager.add_detection(chained);
        manager.add_detection(detection(6, 0.5, 0.5, 20));

        assert_eq!(manager.get(6).unwrap().previous_id(), Some(2));
    }

    #[test]
    fn test_chain_uses_latest_created_duplicate() {
        let mut manager = TrackedDetectionManager::default();
        // Two chained detections that overlap the newcomer but not each other.
        let mut newer = detection(1, 0.46, 0.5, 30);
        newer.set_previous_id(Some(9));
        let mut older = detection(2, 0.54, 0.5, 10);
        older.set_previous_id(Some(4));
        manager.add_detection(newer);
        manager.add_detection(older);
        assert_eq!(manager.get(2).unwrap().previous_id(), Some(4));

        manager.add_detection(detection(3, 0.5, 0.5, 40));

        assert_eq!(manager.get(3).unwrap().previous_id(), Some(9));
    }

    #[test]
    fn test_admission_merges_labels_from_duplicates() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0).with_label("toy", 0.7));
        manager.add_detection(detection(2, 0.5, 0.5, 10).with_label("ball", 0.6));

        let merged = manager.get(2).unwrap();
        assert_eq!(merged.label_scores().len(), 2);
        assert_eq!(merged.label_scores()["toy"], 0.7);
    }

    #[test]
    fn test_admission_iou_last_match_overwrites() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.52, 0.5, 0));

        manager.add_detection(detection(3, 0.5, 0.5, 50));

        // Id 2 is visited last, so its lower overlap is kept.
        let last_match = detection(2, 0.52, 0.5, 0);
        let expected = detection(3, 0.5, 0.5, 50).intersection_over_union(&last_match);
        assert!(expected < 1.0);
        assert!((manager.current_frame_iou(3).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_admission_never_rejects() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 0));
        manager.add_detection(detection(3, 0.9, 0.9, 0));

        assert_eq!(ids(&manager), vec![1, 2, 3]);
    }

    #[test]
    fn test_readmitting_id_keeps_lineage() {
        let mut manager = TrackedDetectionManager::default();
        let mut chained = detection(4, 0.2, 0.2, 0);
        chained.set_previous_id(Some(1));
        manager.add_detection(chained);

        manager.add_detection(detection(4, 0.8, 0.8, 10));

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get(4).unwrap().previous_id(), Some(1));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));

        assert!(manager.update_detection_location(9, rect(0.1, 0.1, 0.1), 10).is_empty());
        assert!(manager.remove_duplicated_detections(9).is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_update_moves_box_and_resolves_duplicates() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.2, 0.2, 0).with_label("toy", 0.5));
        manager.add_detection(detection(2, 0.6, 0.6, 10).with_label("ball", 0.9));
        manager.update_detection_location(2, rect(0.6, 0.6, 0.1), 20);

        // Detection 1 catches up onto detection 2 at the same timestamp.
        let removed = manager.update_detection_location(1, rect(0.6, 0.6, 0.1), 20);

        assert_eq!(removed, vec![1]);
        let survivor = manager.get(2).unwrap();
        assert_eq!(survivor.previous_id(), Some(1));
        assert_eq!(survivor.label_scores().len(), 2);
        assert_eq!(survivor.last_updated_timestamp(), 20);
    }

    #[test]
    fn test_duplicates_at_different_timestamps_are_kept() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 10));

        assert!(manager.remove_duplicated_detections(2).is_empty());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_duplicate_resolution_keeps_newest_and_records_ancestor() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0).with_label("a", 0.1));
        manager.add_detection(detection(2, 0.8, 0.8, 10).with_label("b", 0.2));
        manager.add_detection(detection(3, 0.2, 0.2, 20).with_label("c", 0.3));
        for id in [1, 2, 3] {
            manager.update_detection_location(id, rect(0.1 + id as f64 * 0.2, 0.5, 0.1), 30);
        }
        assert_eq!(manager.len(), 3);

        // Bring all three onto the same spot, updating the oldest last.
        manager.update_detection_location(3, rect(0.5, 0.5, 0.1), 40);
        manager.update_detection_location(2, rect(0.5, 0.5, 0.1), 40);
        let removed = manager.update_detection_location(1, rect(0.5, 0.5, 0.1), 40);

        assert_eq!(removed, vec![1]);
        assert_eq!(ids(&manager), vec![3]);
        let survivor = manager.get(3).unwrap();
        assert_eq!(survivor.label_scores().len(), 3);
        assert_eq!(survivor.previous_id(), Some(2));
    }

    #[test]
    fn test_chained_survivor_keeps_predecessor() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.1, 0.1, 0));
        manager.add_detection(detection(2, 0.9, 0.1, 10));
        manager.add_detection(detection(3, 0.1, 0.9, 20));
        manager.update_detection_location(2, rect(0.5, 0.5, 0.1), 30);
        manager.update_detection_location(3, rect(0.5, 0.5, 0.1), 30);
        assert_eq!(ids(&manager), vec![1, 3]);
        assert_eq!(manager.get(3).unwrap().previous_id(), Some(2));

        let removed = manager.update_detection_location(1, rect(0.5, 0.5, 0.1), 30);

        assert_eq!(removed, vec![1]);
        assert_eq!(manager.get(3).unwrap().previous_id(), Some(2));
    }

    #[test]
    fn test_duplicate_survivor_flips_within_one_pass() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.1, 0.1, 10).with_label("a", 0.1));
        manager.add_detection(detection(3, 0.9, 0.9, 20).with_label("b", 0.2));
        manager.add_detection(detection(2, 0.1, 0.9, 30).with_label("c", 0.3));
        // 1 and 2 sit on either side of the center and do not overlap enough.
        manager.update_detection_location(1, rect(0.46, 0.5, 0.1), 50);
        manager.update_detection_location(2, rect(0.54, 0.5, 0.1), 50);
        assert_eq!(manager.len(), 3);

        // 3 beats the older 1, then loses to the newer 2.
        let removed = manager.update_detection_location(3, rect(0.5, 0.5, 0.1), 50);

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(ids(&manager), vec![2]);
        let survivor = manager.get(2).unwrap();
        assert_eq!(survivor.previous_id(), Some(3));
        assert_eq!(survivor.label_scores().len(), 3);
    }

    #[test]
    fn test_equal_creation_time_keeps_lower_id_as_root() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.3, 0.3, 0).with_label("toy", 0.8));
        manager.add_detection(detection(2, 0.31, 0.31, 0).with_label("ball", 0.4));

        let removed = manager.remove_duplicated_detections(2);

        assert_eq!(removed, vec![2]);
        let survivor = manager.get(1).unwrap();
        assert!(survivor.is_root());
        assert_eq!(survivor.label_scores().len(), 2);
    }

    #[test]
    fn test_duplicate_removal_clears_iou_entries() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 10));
        manager.add_detection(detection(3, 0.9, 0.9, 20));
        assert!(manager.current_frame_iou(2).is_some());

        manager.update_detection_location(3, rect(0.5, 0.5, 0.1), 30);
        let removed = manager.update_detection_location(2, rect(0.5, 0.5, 0.1), 30);

        assert_eq!(removed, vec![2]);
        assert!(manager.current_frame_iou(2).is_none());
        // The root survivor inherits the discarded detection's chain.
        assert_eq!(manager.get(3).unwrap().previous_id(), Some(1));
    }

    #[test]
    fn test_obsolete_detections_strictly_older() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 100));

        assert!(manager.remove_obsolete_detections(100).is_empty());
        assert_eq!(manager.remove_obsolete_detections(101), vec![1]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_expired_detections_use_horizon() {
        let mut manager = TrackedDetectionManager::new(TrackerConfig {
            obsolete_horizon_us: 100,
            ..Default::default()
        });
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.2, 0.2, 50));

        assert!(manager.remove_expired_detections(100).is_empty());
        assert_eq!(manager.remove_expired_detections(120), vec![1]);
        assert_eq!(ids(&manager), vec![2]);
    }

    #[test]
    fn test_obsolete_removal_clears_iou() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 10));

        assert_eq!(manager.remove_obsolete_detections(20), vec![1, 2]);
        assert!(manager.current_frame_iou(2).is_none());
    }

    #[test]
    fn test_out_of_view_detections() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 1.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 0));
        manager.add_detection(detection(3, 0.5, -0.3, 0));

        assert_eq!(manager.remove_out_of_view_detections(), vec![1, 3]);
        assert_eq!(ids(&manager), vec![2]);
    }

    #[test]
    fn test_convergence_keeps_closest_to_center() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.2, 0.2, 0));
        manager.add_detection(detection(2, 0.55, 0.5, 0));
        manager.add_detection(detection(3, 0.8, 0.7, 0));

        let removed = manager.remove_multiple_detections();

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(manager.get(2).unwrap().previous_id(), Some(2));
    }

    #[test]
    fn test_convergence_prefers_confirmed_anchor_over_center() {
        let mut manager = TrackedDetectionManager::default();
        let mut anchor = detection(40, 0.8, 0.7, 0);
        anchor.set_previous_id(Some(17));
        manager.set_previous_confirmed_detection(Some(anchor));

        manager.add_detection(detection(1, 0.2, 0.2, 100));
        manager.add_detection(detection(2, 0.5, 0.5, 100));
        manager.add_detection(detection(3, 0.81, 0.7, 100));

        let removed = manager.remove_multiple_detections();

        assert_eq!(removed, vec![1, 2]);
        assert_eq!(manager.get(3).unwrap().previous_id(), Some(17));
    }

    #[test]
    fn test_convergence_with_root_anchor_chains_to_anchor_id() {
        let mut manager = TrackedDetectionManager::default();
        manager.set_previous_confirmed_detection(Some(detection(40, 0.8, 0.7, 0)));

        manager.add_detection(detection(1, 0.5, 0.5, 100));
        manager.add_detection(detection(2, 0.81, 0.7, 100));

        let removed = manager.remove_multiple_detections();

        // A root anchor has no predecessor, so its own id starts the chain.
        assert_eq!(removed, vec![1]);
        assert_eq!(manager.get(2).unwrap().previous_id(), Some(40));
    }

    #[test]
    fn test_convergence_with_unmatched_anchor_removes_all_roots() {
        let mut manager = TrackedDetectionManager::default();
        let mut anchor = detection(40, 0.9, 0.9, 0);
        anchor.set_previous_id(Some(17));
        manager.set_previous_confirmed_detection(Some(anchor));
        manager.add_detection(detection(1, 0.2, 0.2, 100));
        manager.add_detection(detection(2, 0.5, 0.5, 100));

        assert_eq!(manager.remove_multiple_detections(), vec![1, 2]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_convergence_with_no_root_near_center_removes_all() {
        let mut manager = TrackedDetectionManager::default();
        // Squared distance to center is at least 1.0.
        manager.add_detection(detection(1, 1.5, 0.5, 0));

        assert_eq!(manager.remove_multiple_detections(), vec![1]);
    }

    #[test]
    fn test_convergence_removes_roots_when_chain_exists() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.add_detection(detection(2, 0.5, 0.5, 10));
        manager.add_detection(detection(3, 0.1, 0.1, 10));

        let removed = manager.remove_multiple_detections();

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(ids(&manager), vec![2]);
        assert!(manager.current_frame_iou(2).is_none());
    }

    #[test]
    fn test_convergence_prunes_below_max_iou() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.3, 0.3, 0));
        manager.add_detection(detection(2, 0.7, 0.7, 0));
        manager.add_detection(detection(3, 0.3, 0.3, 10));
        manager.add_detection(detection(4, 0.72, 0.7, 10));

        let removed = manager.remove_multiple_detections();

        // Roots 1 and 2 go, then 4 overlaps its predecessor less than 3 does.
        assert_eq!(removed, vec![1, 2, 4]);
        assert_eq!(manager.get(3).unwrap().previous_id(), Some(1));
    }

    #[test]
    fn test_convergence_keeps_ties_at_max_iou() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.3, 0.3, 0));
        manager.add_detection(detection(2, 0.7, 0.7, 0));
        manager.add_detection(detection(3, 0.3, 0.3, 10));
        manager.add_detection(detection(4, 0.7, 0.7, 10));

        let removed = manager.remove_multiple_detections();

        // Both chained detections overlap perfectly and both survive.
        assert_eq!(removed, vec![1, 2]);
        assert_eq!(ids(&manager), vec![3, 4]);
    }

    #[test]
    fn test_convergence_on_empty_manager() {
        let mut manager = TrackedDetectionManager::default();
        assert!(manager.remove_multiple_detections().is_empty());
    }

    #[test]
    fn test_clear_drops_anchor() {
        let mut manager = TrackedDetectionManager::default();
        manager.add_detection(detection(1, 0.5, 0.5, 0));
        manager.set_previous_confirmed_detection(Some(detection(1, 0.5, 0.5, 0)));

        manager.clear();

        assert!(manager.is_empty());
        assert!(manager.previous_confirmed_detection().is_none());
    }
}
