use crate::asset::{Geometry, Handle};
use crate::batch::{PropertyBlock, ShadingConfig};

/// Everything the graphics layer needs to submit one sub-batch: which
/// geometry and sub-part, the shading configuration with its rebuilt
/// parameter block, and the range of the group's instance buffer to bind.
///
/// Borrowed view; valid until the owning group is mutated again.
#[derive(Debug)]
pub struct DrawDescriptor<'a> {
    pub geometry: Handle<Geometry>,
    pub sub_part: u32,
    pub config: ShadingConfig,
    pub block: &'a PropertyBlock,
    pub first_instance: u32,
    pub instance_count: u32,
}

impl DrawDescriptor<'_> {
    pub fn instance_range(&self) -> std::ops::Range<u32> {
        self.first_instance..self.first_instance + self.instance_count
    }
}
