use glam::Vec4;
use std::collections::HashMap;

/// A single per-instance shading parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Vector(Vec4),
}

/// Per-property override storage for one sub-batch: a value per active
/// member plus the default recorded when the table was created, used to
/// backfill new members and to reset slots.
#[derive(Debug, Clone)]
pub struct OverrideArray<T: Copy> {
    default: T,
    values: Vec<T>,
}

impl<T: Copy> OverrideArray<T> {
    pub fn new(default: T, len: usize) -> Self {
        Self {
            default,
            values: vec![default; len],
        }
    }

    pub fn default_value(&self) -> T {
        self.default
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.values[index] = value;
    }

    pub fn reset(&mut self, index: usize) {
        self.values[index] = self.default;
    }

    /// Grows or shrinks to exactly `len`, default-filling new slots. Every
    /// mutating sub-batch operation calls this so the array length always
    /// matches the member count before it is read.
    pub fn resize(&mut self, len: usize) {
        self.values.resize(len, self.default);
    }

    /// Swap-removes one slot, mirroring member eviction: the last value
    /// moves into the vacancy.
    pub fn swap_remove(&mut self, index: usize) {
        self.values.swap_remove(index);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Rebuilt shading-parameter block handed to the draw boundary.
///
/// Models the GPU-side constraint that a bound override array cannot be
/// resized: `capacity` is fixed at construction, per-instance arrays are
/// capped to it, and growth past it requires building a fresh block.
#[derive(Debug, Clone, Default)]
pub struct PropertyBlock {
    capacity: usize,
    float_arrays: HashMap<String, Vec<f32>>,
    vector_arrays: HashMap<String, Vec<Vec4>>,
    floats: HashMap<String, f32>,
    vectors: HashMap<String, Vec4>,
}

impl PropertyBlock {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_float_array(&mut self, name: &str, values: &[f32]) {
        let capped = &values[..values.len().min(self.capacity)];
        self.float_arrays.insert(name.to_owned(), capped.to_vec());
    }

    pub fn set_vector_array(&mut self, name: &str, values: &[Vec4]) {
        let capped = &values[..values.len().min(self.capacity)];
        self.vector_arrays.insert(name.to_owned(), capped.to_vec());
    }

    /// Whole-sequence values, applied after the per-instance arrays. The
    /// arrays stay authoritative where both exist because the GPU indexes
    /// them per instance.
    pub fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_owned(), value);
    }

    pub fn set_vector(&mut self, name: &str, value: Vec4) {
        self.vectors.insert(name.to_owned(), value);
    }

    pub fn float_array(&self, name: &str) -> Option<&[f32]> {
        self.float_arrays.get(name).map(Vec::as_slice)
    }

    pub fn vector_array(&self, name: &str) -> Option<&[Vec4]> {
        self.vector_arrays.get(name).map(Vec::as_slice)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.get(name).copied()
    }
}
