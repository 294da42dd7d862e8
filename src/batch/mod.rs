pub mod config;
pub mod group;
pub mod instance;
pub mod property;
pub mod sequence;
pub mod sub_batch;

pub use config::{ShadingConfig, ShadingFlags};
pub use group::{InstanceKey, InstanceLocation, RenderGroup};
pub use instance::{InstanceBuffer, InstanceLayout, InstanceValue};
pub use property::{PropertyBlock, PropertyValue};
pub use sequence::RenderSequence;
pub use sub_batch::SubBatch;

/// Maximum instances per sub-batch; one sub-batch is one draw call.
pub const BATCH_SIZE: usize = 511;

/// Rejections from the batch manager. None of these are fatal; callers skip
/// the instance and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    /// Shading config carried no material.
    MissingMaterial,
    /// Instance data written in a layout the group's buffer does not use.
    LayoutMismatch {
        expected: InstanceLayout,
        got: InstanceLayout,
    },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMaterial => write!(f, "shading config has no material"),
            Self::LayoutMismatch { expected, got } => write!(
                f,
                "instance data layout {:?} does not match group layout {:?}",
                got, expected
            ),
        }
    }
}

impl std::error::Error for BatchError {}
