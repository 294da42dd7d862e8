use glam::Mat4;

use crate::asset::{Geometry, Handle};
use crate::classify::Viewpoint;
use crate::draw::DrawDescriptor;

use super::config::ShadingConfig;
use super::instance::{InstanceBuffer, InstanceLayout, InstanceValue};
use super::property::PropertyValue;
use super::sequence::RenderSequence;
use super::sub_batch::SubBatch;
use super::{BatchError, BATCH_SIZE};

/// Key of one instance within its render group. Stable across membership
/// churn; the sparse slot table maps it to the instance's current dense
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey(pub(crate) u32);

impl InstanceKey {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Dense position of an instance: which sequence, which sub-batch, which
/// slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLocation {
    pub sequence: usize,
    pub sub_batch: usize,
    pub index: usize,
}

/// All instances sharing one geometry asset, sub-part and instance-data
/// layout.
///
/// Owns the contiguous instance buffer (grown only in whole-batch
/// increments), the config-deduplicated sequences, and the sparse slot table
/// mapping external keys to dense positions. Every mutation keeps the slot
/// table consistent with swap-with-last eviction.
pub struct RenderGroup {
    geometry: Handle<Geometry>,
    sub_part: u32,
    buffer: InstanceBuffer,
    sequences: Vec<RenderSequence>,
    slots: Vec<Option<InstanceLocation>>,
}

impl RenderGroup {
    pub fn new(geometry: Handle<Geometry>, sub_part: u32, layout: InstanceLayout) -> Self {
        Self {
            geometry,
            sub_part,
            buffer: InstanceBuffer::new(layout),
            sequences: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn geometry(&self) -> Handle<Geometry> {
        self.geometry
    }

    pub fn sub_part(&self) -> u32 {
        self.sub_part
    }

    pub fn layout(&self) -> InstanceLayout {
        self.buffer.layout()
    }

    pub fn buffer(&self) -> &InstanceBuffer {
        &self.buffer
    }

    pub fn sequences(&self) -> &[RenderSequence] {
        &self.sequences
    }

    /// Count of live instances across every sequence.
    pub fn instance_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn locate(&self, key: InstanceKey) -> Option<InstanceLocation> {
        self.slots.get(key.0 as usize).copied().flatten()
    }

    /// Adds an instance under the given shading configuration.
    ///
    /// Finds or creates the sequence whose config structurally equals the
    /// request, packs the instance into the first sub-batch with spare
    /// capacity (appending one and growing the buffer by a whole
    /// [`BATCH_SIZE`] otherwise), writes the initial data and any supplied
    /// overrides, and hands back the lowest free external key.
    pub fn add_instance(
        &mut self,
        config: ShadingConfig,
        value: InstanceValue,
        overrides: &[(&str, PropertyValue)],
    ) -> Result<InstanceKey, BatchError> {
        if !config.is_valid() {
            log::warn!("add_instance rejected: shading config has no material");
            return Err(BatchError::MissingMaterial);
        }
        if value.layout() != self.buffer.layout() {
            return Err(BatchError::LayoutMismatch {
                expected: self.buffer.layout(),
                got: value.layout(),
            });
        }

        let seq_index = match self.sequences.iter().position(|s| *s.config() == config) {
            Some(i) => i,
            None => {
                self.sequences.push(RenderSequence::new(config));
                self.sequences.len() - 1
            }
        };

        let sb_index = match self.sequences[seq_index].first_open_sub_batch() {
            Some(i) => i,
            None => {
                let start = self.buffer.len();
                self.buffer.grow(BATCH_SIZE);
                log::debug!(
                    "group {:?}/{}: sequence {} gains sub-batch at offset {}",
                    self.geometry,
                    self.sub_part,
                    seq_index,
                    start
                );
                self.sequences[seq_index].push_sub_batch(SubBatch::new(start))
            }
        };

        let key = self.alloc_key();
        let seq = &mut self.sequences[seq_index];
        let index = seq.sub_batches_mut()[sb_index].push_member(key.0);
        for (name, v) in overrides {
            let default = seq.property_default(name, *v);
            seq.sub_batches_mut()[sb_index].set_override(index, name, *v, default);
        }
        let slot = seq.sub_batches()[sb_index].start() + index;
        self.buffer.write(slot, value)?;
        self.slots[key.0 as usize] = Some(InstanceLocation {
            sequence: seq_index,
            sub_batch: sb_index,
            index,
        });

        debug_assert_eq!(
            self.buffer.len(),
            self.sequences
                .iter()
                .map(|s| s.sub_batches().len() * BATCH_SIZE)
                .sum::<usize>(),
            "buffer grows in whole-batch increments only"
        );
        Ok(key)
    }

    /// Evicts an instance via swap-with-last. Stale keys are a logged no-op.
    pub fn remove_instance(&mut self, key: InstanceKey) {
        let Some(rec) = self.locate(key) else {
            log::debug!("remove_instance on stale key {:?}", key);
            return;
        };

        let seq = &mut self.sequences[rec.sequence];
        let sb = &mut seq.sub_batches_mut()[rec.sub_batch];
        let start = sb.start();
        let last = sb.len() - 1;
        if rec.index != last {
            self.buffer.swap(start + rec.index, start + last);
        }
        let moved = sb.swap_remove(rec.index);
        if let Some(moved_key) = moved {
            if let Some(Some(moved_rec)) = self.slots.get_mut(moved_key as usize) {
                moved_rec.index = rec.index;
            }
        }
        self.slots[key.0 as usize] = None;
    }

    /// Writes one per-instance shading parameter; the property table is
    /// created on first use, backfilled with the sequence's recorded default.
    pub fn set_override(&mut self, key: InstanceKey, name: &str, value: PropertyValue) {
        let Some(rec) = self.locate(key) else {
            log::debug!("set_override on stale key {:?}", key);
            return;
        };
        let seq = &mut self.sequences[rec.sequence];
        let default = seq.property_default(name, value);
        seq.sub_batches_mut()[rec.sub_batch].set_override(rec.index, name, value, default);
    }

    /// Restores every known property to its recorded default for one
    /// instance.
    pub fn reset_overrides(&mut self, key: InstanceKey) {
        let Some(rec) = self.locate(key) else {
            log::debug!("reset_overrides on stale key {:?}", key);
            return;
        };
        self.sequences[rec.sequence].sub_batches_mut()[rec.sub_batch].reset_overrides(rec.index);
    }

    pub fn float_override(&self, key: InstanceKey, name: &str) -> Option<f32> {
        let rec = self.locate(key)?;
        self.sequences[rec.sequence].sub_batches()[rec.sub_batch].float_override(rec.index, name)
    }

    /// Rewrites one instance's world matrix, preserving the previous matrix
    /// for motion-vector layouts.
    pub fn write_matrix(&mut self, key: InstanceKey, world: Mat4) {
        let Some(rec) = self.locate(key) else {
            log::debug!("write_matrix on stale key {:?}", key);
            return;
        };
        let slot = self.sequences[rec.sequence].sub_batches()[rec.sub_batch].start() + rec.index;
        self.buffer.set_matrix(slot, world);
    }

    pub fn matrix_of(&self, key: InstanceKey) -> Option<Mat4> {
        let rec = self.locate(key)?;
        let slot = self.sequences[rec.sequence].sub_batches()[rec.sub_batch].start() + rec.index;
        Some(self.buffer.matrix(slot))
    }

    /// Sequence-wide property value for every instance matching `config`.
    pub fn set_global(&mut self, config: &ShadingConfig, name: &str, value: PropertyValue) {
        if let Some(seq) = self.sequences.iter_mut().find(|s| s.config() == config) {
            seq.set_global(name, value);
        }
    }

    /// Records the backfill default for a property of the matching sequence.
    pub fn set_property_default(
        &mut self,
        config: &ShadingConfig,
        name: &str,
        value: PropertyValue,
    ) {
        if let Some(seq) = self.sequences.iter_mut().find(|s| s.config() == config) {
            seq.set_property_default(name, value);
        }
    }

    /// Fixed viewpoint offset for the matching view-locked sequence.
    pub fn set_view_offset(&mut self, config: &ShadingConfig, offset: Mat4) {
        if let Some(seq) = self.sequences.iter_mut().find(|s| s.config() == config) {
            seq.set_view_offset(offset);
        }
    }

    /// Repacks the group for drawing: view-locked sequences get their
    /// matrices rewritten to the viewpoint anchor (parallel pass, scoped to
    /// each sequence's active ranges), then every dirty sub-batch rebuilds
    /// its property block. Must run after classification notifications and
    /// before [`draw_calls`](Self::draw_calls).
    pub fn prepare(&mut self, viewpoint: &Viewpoint) {
        for seq in self.sequences.iter_mut() {
            if seq.is_view_locked() {
                let anchor = viewpoint.world() * seq.view_offset();
                for sb in seq.sub_batches() {
                    if !sb.is_empty() {
                        self.buffer.set_matrices(sb.active_range(), anchor);
                    }
                }
            }
            seq.refresh_dirty();
        }
    }

    /// One draw per non-empty sub-batch, instance counts clamped to
    /// [`BATCH_SIZE`].
    pub fn draw_calls(&self) -> Vec<DrawDescriptor<'_>> {
        let mut calls = Vec::new();
        for seq in &self.sequences {
            for sb in seq.sub_batches() {
                if sb.is_empty() {
                    continue;
                }
                calls.push(DrawDescriptor {
                    geometry: self.geometry,
                    sub_part: self.sub_part,
                    config: *seq.config(),
                    block: sb.block(),
                    first_instance: sb.start() as u32,
                    instance_count: sb.len().min(BATCH_SIZE) as u32,
                });
            }
        }
        calls
    }

    /// Lowest free external key, scanning the sparse table so keys stay
    /// dense.
    fn alloc_key(&mut self) -> InstanceKey {
        if let Some(i) = self.slots.iter().position(Option::is_none) {
            InstanceKey(i as u32)
        } else {
            self.slots.push(None);
            InstanceKey((self.slots.len() - 1) as u32)
        }
    }
}
