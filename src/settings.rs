use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Runtime-tunable batcher settings.
///
/// Loaded once at startup; every field has a sane default so a missing or
/// partial settings file never blocks bring-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatcherSettings {
    /// Multiplier applied to the viewpoint distance before LOD selection.
    /// Values above 1.0 bias toward coarser levels.
    #[serde(default = "BatcherSettings::default_lod_bias")]
    pub lod_bias: f32,
    /// Below this many tracked slots the classification pass runs serially;
    /// the rayon fan-out is not worth it for small populations.
    #[serde(default = "BatcherSettings::default_min_parallel_slots")]
    pub min_parallel_slots: usize,
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            lod_bias: Self::default_lod_bias(),
            min_parallel_slots: Self::default_min_parallel_slots(),
        }
    }
}

impl BatcherSettings {
    fn default_lod_bias() -> f32 {
        1.0
    }

    fn default_min_parallel_slots() -> usize {
        256
    }

    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BatcherSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded batcher settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default batcher settings.",
                        path, err
                    );
                    BatcherSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {:?}, using defaults", path);
                BatcherSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default batcher settings.",
                    path, err
                );
                BatcherSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if !self.lod_bias.is_finite() || self.lod_bias <= 0.0 {
            warn!("lod_bias {} is invalid, clamping to 1.0", self.lod_bias);
            self.lod_bias = 1.0;
        }
        self
    }
}
