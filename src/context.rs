//! The explicit context owning every registry the batcher needs: asset
//! caches, the transform table, groups keyed by `(geometry, sub-part,
//! layout)`, per-view classifiers, the instance arena and the listener
//! table. Nothing here is global; init and teardown follow the context's
//! lifetime.
//!
//! Frame order is fixed: [`classify`](RenderContext::classify) (which also
//! delivers change notifications) must precede
//! [`prepare`](RenderContext::prepare), which must precede
//! [`draw_calls`](RenderContext::draw_calls). No membership mutation is
//! permitted while a classification pass runs; `classify` joins the pass
//! before returning, so the ordering holds whenever the three are called in
//! sequence on the submission thread.

use glam::{Mat4, Vec3, Vec4Swizzles};
use std::collections::HashMap;

use crate::asset::{Assets, Geometry, Handle, LocalBounds};
use crate::batch::{
    BatchError, InstanceKey, InstanceLayout, InstanceValue, PropertyValue, RenderGroup,
    ShadingConfig,
};
use crate::classify::{Classification, LodTable, ViewClassifier, Viewpoint};
use crate::handle::{ClassificationListener, GroupId, RenderableInstance, ViewId};
use crate::indirection::{TransformSource, TransformTable};
use crate::settings::BatcherSettings;

/// Everything needed to spawn one renderable instance.
pub struct InstanceDesc {
    pub geometry: Handle<Geometry>,
    pub sub_part: u32,
    pub layout: InstanceLayout,
    pub config: ShadingConfig,
    pub world: Mat4,
    pub bounds: LocalBounds,
    pub lod_table: LodTable,
}

struct InstanceRecord {
    group: GroupId,
    key: InstanceKey,
    transform_slot: u32,
    /// Dense classifier slot per view, indexed by `ViewId`.
    classifier_slots: Vec<usize>,
    /// Kept so classifiers added later can pick up existing instances.
    bounds: LocalBounds,
    lod_table: LodTable,
    world_position: Vec3,
    moved: bool,
}

type GroupKey = (Handle<Geometry>, u32, InstanceLayout);

pub struct RenderContext {
    pub assets: Assets,
    settings: BatcherSettings,
    transforms: TransformTable,
    groups: Vec<RenderGroup>,
    group_lookup: HashMap<GroupKey, GroupId>,
    views: Vec<ViewClassifier>,
    records: Vec<Option<InstanceRecord>>,
    listeners: HashMap<(u32, u32), Vec<Box<dyn ClassificationListener>>>,
}

impl RenderContext {
    pub fn new(settings: BatcherSettings) -> Self {
        Self {
            assets: Assets::new(),
            settings,
            transforms: TransformTable::new(),
            groups: Vec::new(),
            group_lookup: HashMap::new(),
            views: Vec::new(),
            records: Vec::new(),
            listeners: HashMap::new(),
        }
    }

    /// Registers a new observation point. Existing instances are replayed
    /// into the new classifier so every view tracks the full population.
    pub fn add_view(&mut self) -> ViewId {
        let view = ViewId(self.views.len() as u32);
        let mut classifier = ViewClassifier::new(&self.settings);
        for (id, record) in self.records.iter_mut().enumerate() {
            if let Some(record) = record {
                let slot = classifier.add(
                    id as u32,
                    record.transform_slot,
                    record.bounds.center,
                    record.bounds.extents,
                    record.lod_table.clone(),
                );
                record.classifier_slots.push(slot);
            }
        }
        self.views.push(classifier);
        log::info!("view {:?} registered", view);
        view
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Creates an instance: tracks its transform, packs it into the matching
    /// render group and registers it with every view's classifier. Rejected
    /// configs leave no partial state behind.
    pub fn spawn(&mut self, desc: InstanceDesc) -> Result<RenderableInstance, BatchError> {
        let group = self.group_for(desc.geometry, desc.sub_part, desc.layout);
        let transform_slot = self.transforms.track(desc.world);

        let value = InstanceValue::from_matrix(desc.layout, desc.world);
        let key = match self.groups[group.0 as usize].add_instance(desc.config, value, &[]) {
            Ok(key) => key,
            Err(err) => {
                if let Some(remap) = self.transforms.untrack(transform_slot) {
                    for classifier in &mut self.views {
                        classifier.remap_transform(remap);
                    }
                    for record in self.records.iter_mut().flatten() {
                        if record.transform_slot == remap.old {
                            record.transform_slot = remap.new;
                        }
                    }
                }
                return Err(err);
            }
        };

        let id = self.alloc_record();
        let mut classifier_slots = Vec::with_capacity(self.views.len());
        for classifier in &mut self.views {
            classifier_slots.push(classifier.add(
                id,
                transform_slot,
                desc.bounds.center,
                desc.bounds.extents,
                desc.lod_table.clone(),
            ));
        }

        self.records[id as usize] = Some(InstanceRecord {
            group,
            key,
            transform_slot,
            classifier_slots,
            bounds: desc.bounds,
            lod_table: desc.lod_table,
            world_position: desc.world.w_axis.xyz(),
            moved: false,
        });

        Ok(RenderableInstance { id, group, key })
    }

    /// Removes an instance everywhere. Stale handles are a logged no-op; a
    /// handle never outlives its slots.
    pub fn despawn(&mut self, instance: RenderableInstance) {
        let Some(record) = self
            .records
            .get_mut(instance.id as usize)
            .and_then(Option::take)
        else {
            log::debug!("despawn of stale instance {}", instance.id);
            return;
        };

        self.groups[record.group.0 as usize].remove_instance(record.key);

        for (view, &slot) in record.classifier_slots.iter().enumerate() {
            if let Some(relabel) = self.views[view].remove(slot) {
                if let Some(Some(other)) = self.records.get_mut(relabel.owner as usize) {
                    other.classifier_slots[view] = relabel.slot;
                }
            }
        }

        if let Some(remap) = self.transforms.untrack(record.transform_slot) {
            for classifier in &mut self.views {
                classifier.remap_transform(remap);
            }
            for other in self.records.iter_mut().flatten() {
                if other.transform_slot == remap.old {
                    other.transform_slot = remap.new;
                }
            }
        }

        for view in 0..self.views.len() as u32 {
            self.listeners.remove(&(view, instance.id));
        }
    }

    /// Updates an instance's world transform. The group buffer is rewritten
    /// lazily at [`prepare`](Self::prepare) so unmoved instances cost no
    /// buffer traffic.
    pub fn set_world_matrix(&mut self, instance: &RenderableInstance, world: Mat4) {
        let Some(record) = self.record_mut(instance) else {
            return;
        };
        record.world_position = world.w_axis.xyz();
        record.moved = true;
        let slot = record.transform_slot;
        self.transforms.set_world_matrix(slot, world);
    }

    pub fn world_position(&self, instance: &RenderableInstance) -> Option<Vec3> {
        self.record(instance).map(|r| r.world_position)
    }

    /// Registers an edge-triggered listener for one instance in one view.
    pub fn listen(
        &mut self,
        view: ViewId,
        instance: &RenderableInstance,
        listener: Box<dyn ClassificationListener>,
    ) {
        if self.record(instance).is_none() {
            log::debug!("listen on stale instance {}", instance.id);
            return;
        }
        self.listeners
            .entry((view.0, instance.id))
            .or_default()
            .push(listener);
    }

    /// Runs the classification pass for one view and delivers the resulting
    /// edge notifications. Returns how many instances changed class.
    pub fn classify(&mut self, view: ViewId, viewpoint: &Viewpoint) -> usize {
        let Some(classifier) = self.views.get_mut(view.0 as usize) else {
            log::warn!("classify on unknown view {:?}", view);
            return 0;
        };
        let changes = classifier.evaluate(viewpoint, &self.transforms);

        for change in &changes {
            let Some(list) = self.listeners.get_mut(&(view.0, change.owner)) else {
                continue;
            };
            for listener in list.iter_mut() {
                if change.current.lod != change.previous.lod {
                    listener.on_lod_change(change.previous.lod, change.current.lod);
                }
                if change.current.culled != change.previous.culled {
                    listener.on_visibility_change(!change.current.culled);
                }
            }
        }
        changes.len()
    }

    pub fn classification(
        &self,
        view: ViewId,
        instance: &RenderableInstance,
    ) -> Option<Classification> {
        let record = self.record(instance)?;
        let slot = *record.classifier_slots.get(view.0 as usize)?;
        self.views.get(view.0 as usize)?.classification(slot)
    }

    /// Flushes moved transforms into group buffers and repacks every dirty
    /// sub-batch. Runs after `classify`, before `draw_calls`.
    pub fn prepare(&mut self, viewpoint: &Viewpoint) {
        for record in self.records.iter_mut().flatten() {
            if record.moved {
                let world = self.transforms.world_matrix(record.transform_slot);
                self.groups[record.group.0 as usize].write_matrix(record.key, world);
                record.moved = false;
            }
        }
        for group in &mut self.groups {
            group.prepare(viewpoint);
        }
    }

    /// One descriptor per non-empty sub-batch across every group.
    pub fn draw_calls(&self) -> Vec<crate::draw::DrawDescriptor<'_>> {
        self.groups.iter().flat_map(RenderGroup::draw_calls).collect()
    }

    pub fn set_override(&mut self, instance: &RenderableInstance, name: &str, value: PropertyValue) {
        let Some((group, key)) = self.record(instance).map(|r| (r.group, r.key)) else {
            return;
        };
        self.groups[group.0 as usize].set_override(key, name, value);
    }

    pub fn reset_overrides(&mut self, instance: &RenderableInstance) {
        let Some((group, key)) = self.record(instance).map(|r| (r.group, r.key)) else {
            return;
        };
        self.groups[group.0 as usize].reset_overrides(key);
    }

    pub fn group(&self, id: GroupId) -> Option<&RenderGroup> {
        self.groups.get(id.0 as usize)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut RenderGroup> {
        self.groups.get_mut(id.0 as usize)
    }

    pub fn instance_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    fn group_for(&mut self, geometry: Handle<Geometry>, sub_part: u32, layout: InstanceLayout) -> GroupId {
        let key = (geometry, sub_part, layout);
        if let Some(&id) = self.group_lookup.get(&key) {
            return id;
        }
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(RenderGroup::new(geometry, sub_part, layout));
        self.group_lookup.insert(key, id);
        log::debug!("group {:?} created for {:?}/{}", id, geometry, sub_part);
        id
    }

    fn record(&self, instance: &RenderableInstance) -> Option<&InstanceRecord> {
        self.records.get(instance.id as usize)?.as_ref()
    }

    fn record_mut(&mut self, instance: &RenderableInstance) -> Option<&mut InstanceRecord> {
        match self.records.get_mut(instance.id as usize) {
            Some(Some(record)) => Some(record),
            _ => {
                log::debug!("operation on stale instance {}", instance.id);
                None
            }
        }
    }

    fn alloc_record(&mut self) -> u32 {
        if let Some(i) = self.records.iter().position(Option::is_none) {
            i as u32
        } else {
            self.records.push(None);
            (self.records.len() - 1) as u32
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(BatcherSettings::default())
    }
}
