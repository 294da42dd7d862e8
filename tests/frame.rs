//! End-to-end frame flow through the context: spawn, classify, edge
//! notifications, moved-transform flushing, prepare and draw emission.

use glam::{Mat4, Vec3};
use instance_batcher::asset::{Geometry, LocalBounds};
use instance_batcher::batch::{InstanceLayout, ShadingConfig};
use instance_batcher::classify::{LodTable, Viewpoint};
use instance_batcher::context::{InstanceDesc, RenderContext};
use instance_batcher::handle::ClassificationListener;
use instance_batcher::settings::BatcherSettings;
use instance_batcher::transform::Transform;
use std::cell::RefCell;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Lod(u32, u32),
    Visibility(bool),
}

#[derive(Default)]
struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl ClassificationListener for Recorder {
    fn on_lod_change(&mut self, old_level: u32, new_level: u32) {
        self.events.borrow_mut().push(Event::Lod(old_level, new_level));
    }

    fn on_visibility_change(&mut self, visible: bool) {
        self.events.borrow_mut().push(Event::Visibility(visible));
    }
}

fn context() -> RenderContext {
    RenderContext::new(BatcherSettings::default())
}

// Identity TRS places the camera at the origin looking down -Z.
fn viewpoint() -> Viewpoint {
    let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 500.0);
    Viewpoint::from_transform(Transform::IDENTITY, proj)
}

fn desc(ctx: &mut RenderContext, world: Mat4, lod_table: LodTable) -> InstanceDesc {
    let geometry = ctx
        .assets
        .geometries
        .insert(Geometry::new("rock", LocalBounds::unit()));
    let material = ctx.assets.materials.insert(Default::default());
    InstanceDesc {
        geometry,
        sub_part: 0,
        layout: InstanceLayout::Matrix,
        config: ShadingConfig::new(material),
        world,
        bounds: LocalBounds::new(Vec3::ZERO, Vec3::ONE),
        lod_table,
    }
}

#[test]
fn classify_notify_prepare_draw_round_trip() {
    init_logging();
    let mut ctx = context();
    let view = ctx.add_view();

    let d = desc(
        &mut ctx,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        LodTable::from_pairs(&[(0.0, 0), (10.0, 1), (25.0, 2)]),
    );
    let instance = ctx.spawn(d).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    ctx.listen(
        view,
        &instance,
        Box::new(Recorder {
            events: events.clone(),
        }),
    );

    let vp = viewpoint();
    assert_eq!(ctx.classify(view, &vp), 1);
    assert_eq!(
        events.borrow().as_slice(),
        &[Event::Lod(u32::MAX, 0), Event::Visibility(true)],
        "first classification is an edge from the culled/no-LOD default"
    );

    ctx.prepare(&vp);
    let calls = ctx.draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].instance_count, 1);

    // A quiet frame delivers nothing.
    events.borrow_mut().clear();
    assert_eq!(ctx.classify(view, &vp), 0);
    assert!(events.borrow().is_empty());
}

#[test]
fn moving_an_instance_fires_one_lod_edge_and_updates_the_buffer() {
    init_logging();
    let mut ctx = context();
    let view = ctx.add_view();

    let d = desc(
        &mut ctx,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        LodTable::from_pairs(&[(0.0, 0), (10.0, 1), (25.0, 2)]),
    );
    let instance = ctx.spawn(d).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    ctx.listen(
        view,
        &instance,
        Box::new(Recorder {
            events: events.clone(),
        }),
    );

    let vp = viewpoint();
    ctx.classify(view, &vp);
    ctx.prepare(&vp);
    events.borrow_mut().clear();

    let far = Mat4::from_translation(Vec3::new(0.0, 0.0, -40.0));
    ctx.set_world_matrix(&instance, far);
    ctx.classify(view, &vp);
    assert_eq!(events.borrow().as_slice(), &[Event::Lod(0, 2)]);

    ctx.prepare(&vp);
    let group = ctx.group(instance.group()).unwrap();
    assert_eq!(group.matrix_of(instance.key()).unwrap(), far);
}

#[test]
fn despawn_is_idempotent_and_silences_listeners() {
    init_logging();
    let mut ctx = context();
    let view = ctx.add_view();

    let near = desc(
        &mut ctx,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        LodTable::from_pairs(&[(0.0, 0)]),
    );
    let a = ctx.spawn(near).unwrap();
    let far = desc(
        &mut ctx,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -30.0)),
        LodTable::from_pairs(&[(0.0, 0)]),
    );
    let b = ctx.spawn(far).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    ctx.listen(
        view,
        &a,
        Box::new(Recorder {
            events: events.clone(),
        }),
    );

    ctx.despawn(a);
    ctx.despawn(a);
    assert_eq!(ctx.instance_count(), 1);

    let vp = viewpoint();
    ctx.classify(view, &vp);
    assert!(
        events.borrow().is_empty(),
        "a despawned instance must not reach its listeners"
    );

    // The survivor still classifies and draws.
    assert!(!ctx.classification(view, &b).unwrap().culled);
    ctx.prepare(&vp);
    assert_eq!(ctx.draw_calls().len(), 1);
}

#[test]
fn views_added_late_replay_existing_instances() {
    init_logging();
    let mut ctx = context();

    let d = desc(
        &mut ctx,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0)),
        LodTable::from_pairs(&[(0.0, 0)]),
    );
    let instance = ctx.spawn(d).unwrap();

    let view = ctx.add_view();
    let vp = viewpoint();
    assert_eq!(ctx.classify(view, &vp), 1);
    assert!(!ctx.classification(view, &instance).unwrap().culled);
}

#[test]
fn groups_deduplicate_by_geometry_sub_part_and_layout() {
    init_logging();
    let mut ctx = context();
    let _ = ctx.add_view();

    let geometry = ctx
        .assets
        .geometries
        .insert(Geometry::new("tree", LocalBounds::unit()));
    let material = ctx.assets.materials.insert(Default::default());

    let make = |sub_part: u32, layout: InstanceLayout| InstanceDesc {
        geometry,
        sub_part,
        layout,
        config: ShadingConfig::new(material),
        world: Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
        bounds: LocalBounds::unit(),
        lod_table: LodTable::empty(),
    };

    let a = ctx.spawn(make(0, InstanceLayout::Matrix)).unwrap();
    let b = ctx.spawn(make(0, InstanceLayout::Matrix)).unwrap();
    let c = ctx.spawn(make(1, InstanceLayout::Matrix)).unwrap();
    let d = ctx.spawn(make(0, InstanceLayout::MatrixMotion)).unwrap();

    assert_eq!(a.group(), b.group());
    assert_ne!(a.group(), c.group());
    assert_ne!(a.group(), d.group());
}
