use glam::{Mat4, Quat, Vec3};

/// Translation/rotation/scale triple, converted to a world matrix on demand.
///
/// Convenience for hosts that author placements as TRS; anything that already
/// carries matrices hands `Mat4` to the context directly. Viewpoints accept
/// either form ([`Viewpoint::from_transform`](crate::classify::Viewpoint::from_transform)).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Column-major world matrix applying scale, then rotation, then
    /// translation.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
