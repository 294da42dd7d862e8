use crate::asset::{Handle, Material};

/// Draw-parameter flags that participate in sequence deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadingFlags(u32);

impl ShadingFlags {
    pub const NONE: Self = Self(0);
    pub const CAST_SHADOWS: Self = Self(1 << 0);
    pub const MOTION_VECTORS: Self = Self(1 << 1);
    pub const REFLECTIONS: Self = Self(1 << 2);
    pub const LIGHT_PROBES: Self = Self(1 << 3);
    /// Instances follow the viewpoint at a fixed offset (camera-attached
    /// effects); their matrices are rewritten per frame before drawing.
    pub const VIEW_LOCKED: Self = Self(1 << 4);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ShadingFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ShadingFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Everything that decides which render sequence an instance joins.
///
/// Structural equality over these fields is the deduplication key; two
/// sequences in one group never carry equal configs. Per-instance property
/// blocks are deliberately not part of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadingConfig {
    /// Absent material marks the config invalid; adds are rejected.
    pub material: Option<Handle<Material>>,
    pub layer: u8,
    pub priority: i16,
    /// Index of the camera/render-target this sequence is restricted to.
    pub camera_target: u8,
    pub flags: ShadingFlags,
}

impl ShadingConfig {
    pub fn new(material: Handle<Material>) -> Self {
        Self {
            material: Some(material),
            layer: 0,
            priority: 0,
            camera_target: 0,
            flags: ShadingFlags::NONE,
        }
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_priority(mut self, priority: i16) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_camera_target(mut self, target: u8) -> Self {
        self.camera_target = target;
        self
    }

    pub fn with_flags(mut self, flags: ShadingFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.material.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_query() {
        let mut flags = ShadingFlags::CAST_SHADOWS | ShadingFlags::MOTION_VECTORS;
        assert!(flags.contains(ShadingFlags::CAST_SHADOWS));
        assert!(!flags.contains(ShadingFlags::VIEW_LOCKED));
        flags.insert(ShadingFlags::VIEW_LOCKED);
        assert!(flags.contains(ShadingFlags::VIEW_LOCKED));
    }

    #[test]
    fn configs_compare_structurally() {
        let mat = Handle::new(3);
        let a = ShadingConfig::new(mat).with_layer(2);
        let b = ShadingConfig::new(mat).with_layer(2);
        let c = ShadingConfig::new(mat).with_layer(3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn every_builder_field_participates_in_identity() {
        let mat = Handle::new(0);
        let base = ShadingConfig::new(mat);
        assert_ne!(base, base.with_priority(-5));
        assert_ne!(base, base.with_camera_target(1));
        assert_ne!(base, base.with_flags(ShadingFlags::CAST_SHADOWS));
        assert_eq!(base.with_priority(-5).priority, -5);
        assert_eq!(base.with_camera_target(1).camera_target, 1);
    }
}
