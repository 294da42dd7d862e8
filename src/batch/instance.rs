//! Per-instance GPU data layouts.
//!
//! The handful of known layouts is a closed set, so the buffer is a tagged
//! variant over three plain-old-data vectors and every per-sequence pass
//! dispatches on the tag exactly once instead of inspecting element types.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rayon::prelude::*;
use std::ops::Range;

use super::BatchError;

/// Transform only.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MatrixInstance {
    pub transform: [[f32; 4]; 4],
}

/// Transform plus previous-frame transform for motion vectors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MatrixMotionInstance {
    pub transform: [[f32; 4]; 4],
    pub prev_transform: [[f32; 4]; 4],
}

/// Transform, previous transform and a per-instance layer mask.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MatrixLayerMotionInstance {
    pub transform: [[f32; 4]; 4],
    pub prev_transform: [[f32; 4]; 4],
    pub layer_mask: u32,
    pub _padding: [u32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceLayout {
    Matrix,
    MatrixMotion,
    MatrixLayerMotion,
}

/// One instance's worth of data in some layout, as supplied to
/// `add_instance` and buffer writes.
#[derive(Debug, Clone, Copy)]
pub enum InstanceValue {
    Matrix(MatrixInstance),
    MatrixMotion(MatrixMotionInstance),
    MatrixLayerMotion(MatrixLayerMotionInstance),
}

impl InstanceValue {
    /// Builds a value for `layout` from a world matrix, with the previous
    /// matrix seeded to the same transform and an empty layer mask.
    pub fn from_matrix(layout: InstanceLayout, world: Mat4) -> Self {
        let m = world.to_cols_array_2d();
        match layout {
            InstanceLayout::Matrix => Self::Matrix(MatrixInstance { transform: m }),
            InstanceLayout::MatrixMotion => Self::MatrixMotion(MatrixMotionInstance {
                transform: m,
                prev_transform: m,
            }),
            InstanceLayout::MatrixLayerMotion => {
                Self::MatrixLayerMotion(MatrixLayerMotionInstance {
                    transform: m,
                    prev_transform: m,
                    layer_mask: u32::MAX,
                    _padding: [0; 3],
                })
            }
        }
    }

    pub fn layout(&self) -> InstanceLayout {
        match self {
            Self::Matrix(_) => InstanceLayout::Matrix,
            Self::MatrixMotion(_) => InstanceLayout::MatrixMotion,
            Self::MatrixLayerMotion(_) => InstanceLayout::MatrixLayerMotion,
        }
    }
}

/// Growable contiguous instance-data buffer of one layout.
///
/// Grows only in whole-batch increments; slots are addressed by the offsets
/// the owning sub-batches record.
pub enum InstanceBuffer {
    Matrix(Vec<MatrixInstance>),
    MatrixMotion(Vec<MatrixMotionInstance>),
    MatrixLayerMotion(Vec<MatrixLayerMotionInstance>),
}

impl InstanceBuffer {
    pub fn new(layout: InstanceLayout) -> Self {
        match layout {
            InstanceLayout::Matrix => Self::Matrix(Vec::new()),
            InstanceLayout::MatrixMotion => Self::MatrixMotion(Vec::new()),
            InstanceLayout::MatrixLayerMotion => Self::MatrixLayerMotion(Vec::new()),
        }
    }

    pub fn layout(&self) -> InstanceLayout {
        match self {
            Self::Matrix(_) => InstanceLayout::Matrix,
            Self::MatrixMotion(_) => InstanceLayout::MatrixMotion,
            Self::MatrixLayerMotion(_) => InstanceLayout::MatrixLayerMotion,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Matrix(v) => v.len(),
            Self::MatrixMotion(v) => v.len(),
            Self::MatrixLayerMotion(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `count` zeroed slots.
    pub fn grow(&mut self, count: usize) {
        match self {
            Self::Matrix(v) => v.resize(v.len() + count, MatrixInstance::zeroed()),
            Self::MatrixMotion(v) => v.resize(v.len() + count, MatrixMotionInstance::zeroed()),
            Self::MatrixLayerMotion(v) => {
                v.resize(v.len() + count, MatrixLayerMotionInstance::zeroed())
            }
        }
    }

    pub fn write(&mut self, slot: usize, value: InstanceValue) -> Result<(), BatchError> {
        match (self, value) {
            (Self::Matrix(v), InstanceValue::Matrix(data)) => {
                v[slot] = data;
                Ok(())
            }
            (Self::MatrixMotion(v), InstanceValue::MatrixMotion(data)) => {
                v[slot] = data;
                Ok(())
            }
            (Self::MatrixLayerMotion(v), InstanceValue::MatrixLayerMotion(data)) => {
                v[slot] = data;
                Ok(())
            }
            (buffer, value) => Err(BatchError::LayoutMismatch {
                expected: buffer.layout(),
                got: value.layout(),
            }),
        }
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        match self {
            Self::Matrix(v) => v.swap(a, b),
            Self::MatrixMotion(v) => v.swap(a, b),
            Self::MatrixLayerMotion(v) => v.swap(a, b),
        }
    }

    /// Rewrites one slot's transform, rotating the old transform into the
    /// previous-frame field for motion-vector layouts.
    pub fn set_matrix(&mut self, slot: usize, world: Mat4) {
        let m = world.to_cols_array_2d();
        match self {
            Self::Matrix(v) => v[slot].transform = m,
            Self::MatrixMotion(v) => {
                v[slot].prev_transform = v[slot].transform;
                v[slot].transform = m;
            }
            Self::MatrixLayerMotion(v) => {
                v[slot].prev_transform = v[slot].transform;
                v[slot].transform = m;
            }
        }
    }

    pub fn matrix(&self, slot: usize) -> Mat4 {
        let m = match self {
            Self::Matrix(v) => v[slot].transform,
            Self::MatrixMotion(v) => v[slot].transform,
            Self::MatrixLayerMotion(v) => v[slot].transform,
        };
        Mat4::from_cols_array_2d(&m)
    }

    /// Overwrites every transform in `range` with `world`, in parallel.
    /// Used by view-locked sequences, scoped to that sequence's slots only.
    pub fn set_matrices(&mut self, range: Range<usize>, world: Mat4) {
        let m = world.to_cols_array_2d();
        match self {
            Self::Matrix(v) => v[range].par_iter_mut().for_each(|inst| inst.transform = m),
            Self::MatrixMotion(v) => v[range].par_iter_mut().for_each(|inst| {
                inst.prev_transform = inst.transform;
                inst.transform = m;
            }),
            Self::MatrixLayerMotion(v) => v[range].par_iter_mut().for_each(|inst| {
                inst.prev_transform = inst.transform;
                inst.transform = m;
            }),
        }
    }

    /// Raw bytes for the GPU upload boundary.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Matrix(v) => bytemuck::cast_slice(v),
            Self::MatrixMotion(v) => bytemuck::cast_slice(v),
            Self::MatrixLayerMotion(v) => bytemuck::cast_slice(v),
        }
    }
}
