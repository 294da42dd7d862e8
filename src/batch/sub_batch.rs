use glam::Vec4;
use std::collections::HashMap;
use std::ops::Range;

use super::property::{OverrideArray, PropertyBlock, PropertyValue};
use super::BATCH_SIZE;

/// Contiguous run of up to [`BATCH_SIZE`] instance slots, submitted as one
/// draw call.
///
/// Members are external instance keys in draw order; eviction compacts via
/// swap-with-last so the member list and every override array stay dense.
/// The `dirty` flag gates property-block rebuilds in
/// [`refresh`](SubBatch::refresh).
pub struct SubBatch {
    start: usize,
    members: Vec<u32>,
    float_overrides: HashMap<String, OverrideArray<f32>>,
    vector_overrides: HashMap<String, OverrideArray<Vec4>>,
    block: PropertyBlock,
    dirty: bool,
}

impl SubBatch {
    pub fn new(start: usize) -> Self {
        Self {
            start,
            members: Vec::new(),
            float_overrides: HashMap::new(),
            vector_overrides: HashMap::new(),
            block: PropertyBlock::default(),
            dirty: false,
        }
    }

    /// Offset of this sub-batch's first slot in the group's instance buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= BATCH_SIZE
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn members(&self) -> &[u32] {
        &self.members
    }

    /// Buffer range covered by the active members.
    pub fn active_range(&self) -> Range<usize> {
        self.start..self.start + self.members.len()
    }

    pub fn block(&self) -> &PropertyBlock {
        &self.block
    }

    /// Appends a member and keeps every override array sized to the new
    /// member count. Caller checks capacity first.
    pub fn push_member(&mut self, key: u32) -> usize {
        debug_assert!(!self.is_full());
        let index = self.members.len();
        self.members.push(key);
        let len = self.members.len();
        for arr in self.float_overrides.values_mut() {
            arr.resize(len);
        }
        for arr in self.vector_overrides.values_mut() {
            arr.resize(len);
        }
        self.dirty = true;
        index
    }

    /// Swap-with-last eviction. The last member and its override values move
    /// into the vacated slot; returns that member's key so the caller can
    /// rewrite its record.
    pub fn swap_remove(&mut self, index: usize) -> Option<u32> {
        let last = self.members.len() - 1;
        self.members.swap_remove(index);
        for arr in self.float_overrides.values_mut() {
            arr.swap_remove(index);
        }
        for arr in self.vector_overrides.values_mut() {
            arr.swap_remove(index);
        }
        self.dirty = true;
        if index == last {
            None
        } else {
            Some(self.members[index])
        }
    }

    /// Writes one member's override, lazily creating the property table
    /// backfilled with `default` for every other member.
    pub fn set_override(&mut self, index: usize, name: &str, value: PropertyValue, default: PropertyValue) {
        let len = self.members.len();
        match (value, default) {
            (PropertyValue::Float(v), PropertyValue::Float(d)) => {
                let arr = self
                    .float_overrides
                    .entry(name.to_owned())
                    .or_insert_with(|| OverrideArray::new(d, len));
                arr.resize(len);
                arr.set(index, v);
            }
            (PropertyValue::Vector(v), PropertyValue::Vector(d)) => {
                let arr = self
                    .vector_overrides
                    .entry(name.to_owned())
                    .or_insert_with(|| OverrideArray::new(d, len));
                arr.resize(len);
                arr.set(index, v);
            }
            _ => {
                log::warn!("override \"{}\" default/value kind mismatch, ignored", name);
                return;
            }
        }
        self.dirty = true;
    }

    /// Restores every known property to its recorded default for one member.
    pub fn reset_overrides(&mut self, index: usize) {
        for arr in self.float_overrides.values_mut() {
            arr.reset(index);
        }
        for arr in self.vector_overrides.values_mut() {
            arr.reset(index);
        }
        self.dirty = true;
    }

    pub fn float_override(&self, index: usize, name: &str) -> Option<f32> {
        self.float_overrides
            .get(name)
            .and_then(|arr| arr.values().get(index))
            .copied()
    }

    pub fn vector_override(&self, index: usize, name: &str) -> Option<Vec4> {
        self.vector_overrides
            .get(name)
            .and_then(|arr| arr.values().get(index))
            .copied()
    }

    /// Rebuilds the shading-parameter block if dirty.
    ///
    /// A block whose GPU-side capacity fell below the current membership is
    /// rebuilt from scratch (one extra allocation); bound override arrays
    /// cannot be resized in place. Per-instance arrays are applied first,
    /// then the sequence-wide values.
    pub fn refresh(
        &mut self,
        global_floats: &HashMap<String, f32>,
        global_vectors: &HashMap<String, Vec4>,
    ) {
        if !self.dirty {
            return;
        }
        let count = self.members.len();
        if self.block.capacity() < count {
            log::debug!(
                "property block capacity {} below {} members, rebuilding",
                self.block.capacity(),
                count
            );
            self.block = PropertyBlock::with_capacity(count.max(self.block.capacity()));
        }
        for (name, arr) in &self.float_overrides {
            self.block.set_float_array(name, arr.values());
        }
        for (name, arr) in &self.vector_overrides {
            self.block.set_vector_array(name, arr.values());
        }
        for (name, value) in global_floats {
            self.block.set_float(name, *value);
        }
        for (name, value) in global_vectors {
            self.block.set_vector(name, *value);
        }
        self.dirty = false;
    }
}
