use glam::Vec3;
use rayon::prelude::*;

use crate::indirection::{SlotRemap, TransformSource};
use crate::settings::BatcherSettings;

use super::frustum::{Frustum, Viewpoint};
use super::lod::{LodTable, LOD_NONE};

/// Per-slot classification output, double-buffered across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub distance: f32,
    pub lod: u32,
    pub culled: bool,
}

impl Default for Classification {
    /// New slots start culled with no LOD, so the first evaluation of a
    /// visible instance produces an edge.
    fn default() -> Self {
        Self {
            distance: 0.0,
            lod: LOD_NONE,
            culled: true,
        }
    }
}

/// One entry of the compacted change list produced by
/// [`ViewClassifier::evaluate`]. Carries both sides of the edge so listeners
/// see old and new values without another lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationChange {
    pub slot: usize,
    pub owner: u32,
    pub previous: Classification,
    pub current: Classification,
}

/// Slot relabeling caused by a swap-removal: `owner`'s data moved from the
/// end of the arrays to `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRelabel {
    pub owner: u32,
    pub slot: usize,
}

/// Visibility/LOD classifier for one viewpoint.
///
/// Everything is a parallel array indexed by dense slot so the evaluation
/// pass streams straight through memory: inputs (bounds, LOD table, transform
/// slot, owner) and double-buffered outputs. Membership changes compact via
/// swap-with-last.
pub struct ViewClassifier {
    centers: Vec<Vec3>,
    extents: Vec<Vec3>,
    lod_tables: Vec<LodTable>,
    transform_slots: Vec<u32>,
    owners: Vec<u32>,
    current: Vec<Classification>,
    previous: Vec<Classification>,
    lod_bias: f32,
    min_parallel_slots: usize,
}

impl ViewClassifier {
    pub fn new(settings: &BatcherSettings) -> Self {
        Self {
            centers: Vec::new(),
            extents: Vec::new(),
            lod_tables: Vec::new(),
            transform_slots: Vec::new(),
            owners: Vec::new(),
            current: Vec::new(),
            previous: Vec::new(),
            lod_bias: settings.lod_bias,
            min_parallel_slots: settings.min_parallel_slots,
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn add(
        &mut self,
        owner: u32,
        transform_slot: u32,
        center_local: Vec3,
        extents_local: Vec3,
        lod_table: LodTable,
    ) -> usize {
        let slot = self.owners.len();
        self.centers.push(center_local);
        self.extents.push(extents_local);
        self.lod_tables.push(lod_table);
        self.transform_slots.push(transform_slot);
        self.owners.push(owner);
        self.current.push(Classification::default());
        self.previous.push(Classification::default());
        log::trace!("classifier: slot {} added for owner {}", slot, owner);
        slot
    }

    /// Swap-with-last compaction of every parallel array. Returns the
    /// relabeling of the slot that moved into the vacancy, if any, so its
    /// owner's record can be rewritten.
    pub fn remove(&mut self, slot: usize) -> Option<SlotRelabel> {
        if slot >= self.owners.len() {
            log::warn!("classifier: remove of out-of-range slot {}", slot);
            return None;
        }
        let last = self.owners.len() - 1;
        self.centers.swap_remove(slot);
        self.extents.swap_remove(slot);
        self.lod_tables.swap_remove(slot);
        self.transform_slots.swap_remove(slot);
        self.owners.swap_remove(slot);
        self.current.swap_remove(slot);
        self.previous.swap_remove(slot);
        if slot == last {
            None
        } else {
            Some(SlotRelabel {
                owner: self.owners[slot],
                slot,
            })
        }
    }

    pub fn owner(&self, slot: usize) -> Option<u32> {
        self.owners.get(slot).copied()
    }

    pub fn classification(&self, slot: usize) -> Option<Classification> {
        self.current.get(slot).copied()
    }

    /// Rewrites stored indirection slots after the transform table renumbers
    /// one. Push-notification path; the classifier never polls for moves.
    pub fn remap_transform(&mut self, remap: SlotRemap) {
        for stored in &mut self.transform_slots {
            if *stored == remap.old {
                *stored = remap.new;
            }
        }
    }

    /// Classifies every tracked slot against the viewpoint and returns the
    /// compacted list of slots whose `(lod, culled)` pair changed.
    ///
    /// Data-parallel with read-only shared inputs and per-slot-exclusive
    /// writes; must complete before change notifications are delivered and
    /// before the render pass reads group buffers.
    pub fn evaluate(
        &mut self,
        viewpoint: &Viewpoint,
        transforms: &impl TransformSource,
    ) -> Vec<ClassificationChange> {
        if self.is_empty() {
            return Vec::new();
        }

        let frustum = Frustum::from_viewpoint(viewpoint);
        let eye = viewpoint.position();
        let lod_bias = self.lod_bias;

        let centers = &self.centers;
        let extents = &self.extents;
        let lod_tables = &self.lod_tables;
        let transform_slots = &self.transform_slots;

        let classify = |slot: usize, out: &mut Classification| {
            let world = transforms.world_matrix(transform_slots[slot]);
            let center = world.transform_point3(centers[slot]);
            let culled = !frustum.contains_aabb(center, extents[slot]);
            let distance = center.distance(eye);
            let lod = lod_tables[slot].select(distance * lod_bias);
            *out = Classification {
                distance,
                lod,
                culled,
            };
        };

        let serial = self.owners.len() < self.min_parallel_slots;
        if serial {
            for (slot, out) in self.current.iter_mut().enumerate() {
                classify(slot, out);
            }
        } else {
            self.current
                .par_iter_mut()
                .enumerate()
                .for_each(|(slot, out)| classify(slot, out));
        }

        let owners = &self.owners;
        let edge = |(slot, (cur, prev)): (usize, (&Classification, &Classification))| {
            if cur.lod != prev.lod || cur.culled != prev.culled {
                Some(ClassificationChange {
                    slot,
                    owner: owners[slot],
                    previous: *prev,
                    current: *cur,
                })
            } else {
                None
            }
        };
        let changes: Vec<ClassificationChange> = if serial {
            self.current
                .iter()
                .zip(self.previous.iter())
                .enumerate()
                .filter_map(edge)
                .collect()
        } else {
            self.current
                .par_iter()
                .zip(self.previous.par_iter())
                .enumerate()
                .filter_map(edge)
                .collect()
        };

        self.previous.copy_from_slice(&self.current);

        log::trace!(
            "classifier: {} slots evaluated, {} changed",
            self.owners.len(),
            changes.len()
        );
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirection::TransformTable;
    use glam::Mat4;

    fn viewpoint() -> Viewpoint {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 500.0);
        Viewpoint::looking_at(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, proj)
    }

    fn classifier() -> ViewClassifier {
        ViewClassifier::new(&BatcherSettings::default())
    }

    #[test]
    fn empty_classifier_evaluation_is_noop() {
        let mut c = classifier();
        let table = TransformTable::new();
        assert!(c.evaluate(&viewpoint(), &table).is_empty());
    }

    #[test]
    fn first_evaluation_reports_visibility_edge() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let t = table.track(Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0)));
        c.add(7, t, Vec3::ZERO, Vec3::ONE, LodTable::from_pairs(&[(0.0, 0)]));

        let changes = c.evaluate(&viewpoint(), &table);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].owner, 7);
        assert!(changes[0].previous.culled);
        assert!(!changes[0].current.culled);
        assert_eq!(changes[0].current.lod, 0);
    }

    #[test]
    fn second_evaluation_without_movement_is_quiet() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let t = table.track(Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0)));
        c.add(0, t, Vec3::ZERO, Vec3::ONE, LodTable::from_pairs(&[(0.0, 0)]));

        assert_eq!(c.evaluate(&viewpoint(), &table).len(), 1);
        assert!(c.evaluate(&viewpoint(), &table).is_empty());
    }

    #[test]
    fn distance_change_flips_lod_once() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let t = table.track(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        c.add(
            0,
            t,
            Vec3::ZERO,
            Vec3::ONE,
            LodTable::from_pairs(&[(0.0, 0), (10.0, 1), (25.0, 2)]),
        );

        let first = c.evaluate(&viewpoint(), &table);
        assert_eq!(first[0].current.lod, 0);

        table.set_world_matrix(t, Mat4::from_translation(Vec3::new(0.0, 0.0, -30.0)));
        let second = c.evaluate(&viewpoint(), &table);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].previous.lod, 0);
        assert_eq!(second[0].current.lod, 2);
        assert!(c.evaluate(&viewpoint(), &table).is_empty());
    }

    #[test]
    fn empty_lod_table_keeps_sentinel_forever() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let t = table.track(Mat4::IDENTITY);
        let slot = c.add(0, t, Vec3::ZERO, Vec3::ONE, LodTable::empty());

        for _ in 0..3 {
            c.evaluate(&viewpoint(), &table);
            assert_eq!(c.classification(slot).unwrap().lod, LOD_NONE);
        }
    }

    #[test]
    fn serial_and_parallel_paths_report_the_same_edges() {
        let mut transforms = TransformTable::new();
        let mut serial = ViewClassifier::new(&BatcherSettings {
            min_parallel_slots: usize::MAX,
            ..BatcherSettings::default()
        });
        let mut parallel = ViewClassifier::new(&BatcherSettings {
            min_parallel_slots: 0,
            ..BatcherSettings::default()
        });

        for i in 0..64u32 {
            let z = if i % 3 == 0 { 60.0 } else { -(5.0 + i as f32) };
            let t = transforms.track(Mat4::from_translation(Vec3::new(0.0, 0.0, z)));
            let table = LodTable::from_pairs(&[(0.0, 0), (20.0, 1)]);
            serial.add(i, t, Vec3::ZERO, Vec3::ONE, table.clone());
            parallel.add(i, t, Vec3::ZERO, Vec3::ONE, table);
        }

        let vp = viewpoint();
        assert_eq!(serial.evaluate(&vp, &transforms), parallel.evaluate(&vp, &transforms));
        assert_eq!(serial.evaluate(&vp, &transforms), parallel.evaluate(&vp, &transforms));
    }

    #[test]
    fn remove_relabels_the_former_last_slot() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let t = table.track(Mat4::IDENTITY);
        c.add(10, t, Vec3::ZERO, Vec3::ONE, LodTable::empty());
        c.add(11, t, Vec3::ZERO, Vec3::ONE, LodTable::empty());
        let last = c.add(12, t, Vec3::ZERO, Vec3::ONE, LodTable::empty());

        let relabel = c.remove(0).expect("end slot moves into the vacancy");
        assert_eq!(relabel, SlotRelabel { owner: 12, slot: 0 });
        assert_eq!(c.owner(0), Some(12));
        assert_eq!(c.len(), 2);

        assert!(c.remove(last).is_none(), "slot index no longer tracked");
    }

    #[test]
    fn remap_rewrites_stored_transform_slots() {
        let mut c = classifier();
        let mut table = TransformTable::new();
        let a = table.track(Mat4::IDENTITY);
        let b = table.track(Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0)));
        c.add(0, b, Vec3::ZERO, Vec3::ONE, LodTable::from_pairs(&[(0.0, 0)]));

        // Removing `a` moves `b`'s matrix into slot 0.
        let remap = table.untrack(a).unwrap();
        c.remap_transform(remap);

        let changes = c.evaluate(&viewpoint(), &table);
        assert!(!changes[0].current.culled, "still reads the moved matrix");
    }
}
