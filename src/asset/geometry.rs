use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One indexed range of a geometry asset that can be drawn on its own.
///
/// Instances batch per `(geometry, sub_part)` pair, so two sub-parts of the
/// same asset never share a draw call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubPart {
    pub index_start: u32,
    pub index_count: u32,
}

/// Shared geometry asset, referenced by handle from every render group.
///
/// Only the data the batcher itself needs lives here: sub-part ranges and the
/// authored object-space bounds (center + half extents) that seed the
/// classifier. Vertex/index payloads stay with the graphics layer.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    pub sub_parts: Vec<SubPart>,
    pub bounds: LocalBounds,
}

/// Object-space AABB as center + half extents, the form the frustum test
/// consumes directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocalBounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl LocalBounds {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    pub fn unit() -> Self {
        Self {
            center: Vec3::ZERO,
            extents: Vec3::splat(0.5),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extents.min_element() < 0.0
    }
}

impl Geometry {
    pub fn new(name: impl Into<String>, bounds: LocalBounds) -> Self {
        Self {
            name: name.into(),
            sub_parts: vec![SubPart {
                index_start: 0,
                index_count: 0,
            }],
            bounds,
        }
    }

    pub fn with_sub_parts(mut self, sub_parts: Vec<SubPart>) -> Self {
        self.sub_parts = sub_parts;
        self
    }

    pub fn sub_part_count(&self) -> u32 {
        self.sub_parts.len() as u32
    }
}
