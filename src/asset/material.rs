/// Material asset referenced from shading configurations.
///
/// The batcher only needs a stable identity plus a few quantized parameters;
/// shader binding data belongs to the graphics layer. Factors are stored as
/// u8 (0-255 -> 0.0-1.0) so the material stays `Eq + Hash` and can key batch
/// deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    pub base_color: [u8; 4],
    pub metallic_factor: u8,
    pub roughness_factor: u8,
    pub double_sided: bool,
}

impl Material {
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            base_color: color,
            metallic_factor: 0,
            roughness_factor: 255, // Default to rough
            double_sided: false,
        }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new([r, g, b, 255])
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic_factor = (metallic.clamp(0.0, 1.0) * 255.0) as u8;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness_factor = (roughness.clamp(0.0, 1.0) * 255.0) as u8;
        self
    }

    pub fn with_double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn color_f32(&self) -> [f32; 4] {
        [
            self.base_color[0] as f32 / 255.0,
            self.base_color[1] as f32 / 255.0,
            self.base_color[2] as f32 / 255.0,
            self.base_color[3] as f32 / 255.0,
        ]
    }

    pub fn metallic_f32(&self) -> f32 {
        self.metallic_factor as f32 / 255.0
    }

    pub fn roughness_f32(&self) -> f32 {
        self.roughness_factor as f32 / 255.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}
