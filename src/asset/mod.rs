pub mod cache;
pub mod geometry;
pub mod handle;
pub mod material;

pub use cache::AssetCache;
pub use geometry::{Geometry, LocalBounds, SubPart};
pub use handle::Handle;
pub use material::Material;

pub struct Assets {
    pub geometries: AssetCache<Geometry>,
    pub materials: AssetCache<Material>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            geometries: AssetCache::new(),
            materials: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
