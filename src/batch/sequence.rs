use glam::{Mat4, Vec4};
use std::collections::HashMap;

use super::config::{ShadingConfig, ShadingFlags};
use super::property::PropertyValue;
use super::sub_batch::SubBatch;

/// All instances of a group that share one shading configuration.
///
/// Membership is split across sub-batches of at most
/// [`BATCH_SIZE`](super::BATCH_SIZE) slots each. The sequence also carries
/// the state that is per-config rather than per-instance: recorded property
/// defaults, sequence-wide property values and the view-lock offset.
pub struct RenderSequence {
    config: ShadingConfig,
    sub_batches: Vec<SubBatch>,
    float_defaults: HashMap<String, f32>,
    vector_defaults: HashMap<String, Vec4>,
    global_floats: HashMap<String, f32>,
    global_vectors: HashMap<String, Vec4>,
    view_offset: Mat4,
}

impl RenderSequence {
    pub fn new(config: ShadingConfig) -> Self {
        Self {
            config,
            sub_batches: Vec::new(),
            float_defaults: HashMap::new(),
            vector_defaults: HashMap::new(),
            global_floats: HashMap::new(),
            global_vectors: HashMap::new(),
            view_offset: Mat4::IDENTITY,
        }
    }

    pub fn config(&self) -> &ShadingConfig {
        &self.config
    }

    pub fn sub_batches(&self) -> &[SubBatch] {
        &self.sub_batches
    }

    pub fn sub_batches_mut(&mut self) -> &mut [SubBatch] {
        &mut self.sub_batches
    }

    pub fn push_sub_batch(&mut self, sub_batch: SubBatch) -> usize {
        self.sub_batches.push(sub_batch);
        self.sub_batches.len() - 1
    }

    /// First sub-batch with spare capacity, if any.
    pub fn first_open_sub_batch(&self) -> Option<usize> {
        self.sub_batches.iter().position(|sb| !sb.is_full())
    }

    pub fn is_view_locked(&self) -> bool {
        self.config.flags.contains(ShadingFlags::VIEW_LOCKED)
    }

    /// Fixed offset from the viewpoint transform applied to every instance
    /// of a view-locked sequence before drawing.
    pub fn view_offset(&self) -> Mat4 {
        self.view_offset
    }

    pub fn set_view_offset(&mut self, offset: Mat4) {
        self.view_offset = offset;
    }

    /// Records the default a lazily created override table backfills with.
    pub fn set_property_default(&mut self, name: &str, value: PropertyValue) {
        match value {
            PropertyValue::Float(v) => {
                self.float_defaults.insert(name.to_owned(), v);
            }
            PropertyValue::Vector(v) => {
                self.vector_defaults.insert(name.to_owned(), v);
            }
        }
    }

    pub fn property_default(&self, name: &str, like: PropertyValue) -> PropertyValue {
        match like {
            PropertyValue::Float(_) => PropertyValue::Float(
                self.float_defaults.get(name).copied().unwrap_or_default(),
            ),
            PropertyValue::Vector(_) => PropertyValue::Vector(
                self.vector_defaults.get(name).copied().unwrap_or_default(),
            ),
        }
    }

    /// Sets a whole-sequence property value; every sub-batch block must pick
    /// it up on its next rebuild.
    pub fn set_global(&mut self, name: &str, value: PropertyValue) {
        match value {
            PropertyValue::Float(v) => {
                self.global_floats.insert(name.to_owned(), v);
            }
            PropertyValue::Vector(v) => {
                self.global_vectors.insert(name.to_owned(), v);
            }
        }
        for sb in &mut self.sub_batches {
            sb.mark_dirty();
        }
    }

    /// Rebuilds the property block of every dirty sub-batch.
    pub fn refresh_dirty(&mut self) {
        for sb in &mut self.sub_batches {
            sb.refresh(&self.global_floats, &self.global_vectors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Handle;

    #[test]
    fn open_sub_batch_lookup_is_first_fit() {
        let mut seq = RenderSequence::new(ShadingConfig::new(Handle::new(0)));
        assert_eq!(seq.first_open_sub_batch(), None);
        seq.push_sub_batch(SubBatch::new(0));
        assert_eq!(seq.first_open_sub_batch(), Some(0));
    }

    #[test]
    fn setting_a_global_dirties_every_sub_batch() {
        let mut seq = RenderSequence::new(ShadingConfig::new(Handle::new(0)));
        seq.push_sub_batch(SubBatch::new(0));
        seq.refresh_dirty();
        assert!(!seq.sub_batches()[0].is_dirty());

        seq.set_global("_Exposure", PropertyValue::Float(2.0));
        assert!(seq.sub_batches()[0].is_dirty());

        seq.refresh_dirty();
        assert_eq!(seq.sub_batches()[0].block().float("_Exposure"), Some(2.0));
    }

    #[test]
    fn recorded_defaults_answer_by_kind() {
        let mut seq = RenderSequence::new(ShadingConfig::new(Handle::new(0)));
        seq.set_property_default("_Fade", PropertyValue::Float(1.0));
        assert_eq!(
            seq.property_default("_Fade", PropertyValue::Float(0.0)),
            PropertyValue::Float(1.0)
        );
        assert_eq!(
            seq.property_default("_Missing", PropertyValue::Float(0.0)),
            PropertyValue::Float(0.0)
        );
    }
}
