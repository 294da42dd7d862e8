//! Viewpoint and frustum math.
//!
//! Conventions used in this codebase:
//! - Right-handed view space (camera looks down -Z).
//! - Clip/NDC depth range is [0, 1] (wgpu/D3D). Near -> 0, Far -> 1.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use crate::transform::Transform;

/// Observation point: world transform plus projection, the source of both
/// the frustum planes and the distance used for LOD selection.
#[derive(Debug, Clone, Copy)]
pub struct Viewpoint {
    world: Mat4,
    proj: Mat4,
}

impl Viewpoint {
    pub fn new(world: Mat4, proj: Mat4) -> Self {
        Self { world, proj }
    }

    pub fn from_transform(transform: Transform, proj: Mat4) -> Self {
        Self::new(transform.matrix(), proj)
    }

    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3, proj: Mat4) -> Self {
        Self {
            world: Mat4::look_at_rh(eye, target, up).inverse(),
            proj,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.world.w_axis.xyz()
    }

    /// Viewpoint local-to-world matrix, the anchor for view-locked sequences.
    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn view(&self) -> Mat4 {
        self.world.inverse()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view()
    }
}

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    fn from_coefficients(v: Vec4) -> Self {
        let normal = v.xyz();
        let len = normal.length();
        if len <= f32::EPSILON {
            return Self {
                normal: Vec3::Z,
                distance: f32::MAX,
            };
        }
        Self {
            normal: normal / len,
            distance: v.w / len,
        }
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// True when the AABB lies entirely on the negative side.
    ///
    /// Tests only the corner most positive along the plane normal; if even
    /// that corner is behind the plane the whole box is.
    fn aabb_outside(&self, center: Vec3, extents: Vec3) -> bool {
        let corner = center + extents * self.normal.signum();
        self.signed_distance(corner) < 0.0
    }
}

/// Six half-space planes extracted from a view-projection matrix, normals
/// pointing into the visible volume.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Gribb/Hartmann extraction, adjusted for the [0, 1] clip depth range.
    pub fn from_view_proj(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 + r1), // bottom
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r2),      // near (z = 0)
                Plane::from_coefficients(r3 - r2), // far
            ],
        }
    }

    pub fn from_viewpoint(viewpoint: &Viewpoint) -> Self {
        Self::from_view_proj(viewpoint.view_proj())
    }

    /// Conservative AABB visibility: the box passes unless it is fully
    /// outside at least one plane. Boxes near frustum corners can pass even
    /// though they are outside the true volume; they never fail while
    /// actually visible.
    pub fn contains_aabb(&self, center: Vec3, extents: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| !plane.aabb_outside(center, extents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_viewpoint() -> Viewpoint {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        Viewpoint::looking_at(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, proj)
    }

    #[test]
    fn box_in_front_of_camera_is_visible() {
        let frustum = Frustum::from_viewpoint(&test_viewpoint());
        assert!(frustum.contains_aabb(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE));
    }

    #[test]
    fn box_behind_camera_is_culled() {
        let frustum = Frustum::from_viewpoint(&test_viewpoint());
        assert!(!frustum.contains_aabb(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE));
    }

    #[test]
    fn box_beyond_far_plane_is_culled() {
        let frustum = Frustum::from_viewpoint(&test_viewpoint());
        assert!(!frustum.contains_aabb(Vec3::new(0.0, 0.0, -150.0), Vec3::ONE));
    }

    #[test]
    fn box_far_to_the_side_is_culled() {
        let frustum = Frustum::from_viewpoint(&test_viewpoint());
        assert!(!frustum.contains_aabb(Vec3::new(500.0, 0.0, -10.0), Vec3::ONE));
    }

    #[test]
    fn box_straddling_a_plane_is_visible() {
        let frustum = Frustum::from_viewpoint(&test_viewpoint());
        // Centered on the near plane, half inside.
        assert!(frustum.contains_aabb(Vec3::new(0.0, 0.0, -0.1), Vec3::splat(0.5)));
    }

    #[test]
    fn transform_built_viewpoint_matches_look_at() {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let a = Viewpoint::from_transform(Transform::from_translation(eye), proj);
        let b = Viewpoint::looking_at(eye, eye + Vec3::NEG_Z, Vec3::Y, proj);
        assert!(a.view_proj().abs_diff_eq(b.view_proj(), 1e-4));
        assert!(a.position().abs_diff_eq(eye, 1e-5));
    }

    #[test]
    fn looking_at_recovers_eye_position() {
        let vp = test_viewpoint();
        assert!(vp.position().abs_diff_eq(Vec3::ZERO, 1e-5));

        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 10.0);
        let vp = Viewpoint::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y, proj);
        assert!(vp.position().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-4));
    }
}
