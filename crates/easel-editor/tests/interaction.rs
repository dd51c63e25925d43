//! Full interaction scenarios: pointer-down through commit, across
//! selection, handles, and the viewport transform.

use easel_core::config::EngineConfig;
use easel_core::event::EventKind;
use easel_core::geom::Point;
use easel_core::node::{NodeKind, Origin, Prop, SceneNode};
use easel_core::scene::{ActiveTarget, Scene};
use easel_editor::{ControllerState, InputEvent, Modifiers, PointerController};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn square_at(scene: &mut Scene, left: f64, top: f64, size: f64) -> easel_core::NodeIndex {
    let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
    n.set_many([
        Prop::Left(left),
        Prop::Top(top),
        Prop::Width(size),
        Prop::Height(size),
        Prop::OriginX(Origin::Near),
        Prop::OriginY(Origin::Near),
    ]);
    scene.add(scene.root(), n).unwrap()
}

/// Grab the bottom-right handle of a selected square and drag outward: the
/// square doubles, the top-left corner never moves, and the session emits
/// scaling events then one modified on release.
#[test]
fn corner_scale_end_to_end() {
    init_logging();
    let mut scene = Scene::new();
    let idx = square_at(&mut scene, 0.0, 0.0, 100.0);
    scene.set_active_node(idx);
    scene.drain_events();

    let mut ctl = PointerController::new(EngineConfig::default());
    ctl.handle(&mut scene, &InputEvent::down(100.0, 100.0, Modifiers::NONE));
    assert_eq!(ctl.state(), ControllerState::TransformActive);

    // A few intermediate steps, like a real drag.
    for step in [130.0, 160.0, 200.0] {
        ctl.handle(&mut scene, &InputEvent::moved(step, step, Modifiers::NONE));
    }
    ctl.handle(&mut scene, &InputEvent::up(200.0, 200.0, Modifiers::NONE));

    let n = scene.node_ref(idx);
    assert!((n.scale_x - 2.0).abs() < 1e-9, "scale_x = {}", n.scale_x);
    assert!((n.scale_y - 2.0).abs() < 1e-9, "scale_y = {}", n.scale_y);

    let corners = scene.absolute_corners(idx);
    assert!(
        corners.tl.distance(Point::ZERO) < 1e-9,
        "anchored corner stayed at the origin: {}",
        corners.tl
    );

    let events = scene.drain_events();
    let scaling = events.iter().filter(|e| e.kind == EventKind::Scaling).count();
    assert_eq!(scaling, 3, "one scaling event per pointer step");
    assert_eq!(
        events.iter().filter(|e| e.kind == EventKind::Modified).count(),
        1,
        "exactly one modified on commit"
    );
}

/// Dragging a member of a multi-selection moves the whole selection, and
/// discarding it drops members back at their new absolute positions.
#[test]
fn multi_selection_drag_moves_members_together() {
    init_logging();
    let mut scene = Scene::new();
    let a = square_at(&mut scene, 0.0, 0.0, 50.0);
    let b = square_at(&mut scene, 100.0, 0.0, 50.0);
    scene.select_nodes(&[a, b]);
    let sel = match scene.active_target() {
        Some(ActiveTarget::Selection(sel)) => sel,
        other => panic!("expected selection, got {other:?}"),
    };

    let mut ctl = PointerController::new(EngineConfig::default());
    // Press inside member `a`, which hits the selection group.
    ctl.handle(&mut scene, &InputEvent::down(25.0, 25.0, Modifiers::NONE));
    assert_eq!(ctl.session().map(|s| s.target), Some(sel));
    ctl.handle(&mut scene, &InputEvent::moved(35.0, 45.0, Modifiers::NONE));
    ctl.handle(&mut scene, &InputEvent::up(35.0, 45.0, Modifiers::NONE));

    scene.discard_active_selection();
    let ca = scene.absolute_corners(a);
    let cb = scene.absolute_corners(b);
    assert!(ca.tl.distance(Point::new(10.0, 20.0)) < 1e-6, "a.tl = {}", ca.tl);
    assert!(cb.tl.distance(Point::new(110.0, 20.0)) < 1e-6, "b.tl = {}", cb.tl);
}

/// `end_transform` commits an in-flight session without a pointer-up.
#[test]
fn explicit_end_transform_commits() {
    init_logging();
    let mut scene = Scene::new();
    let idx = square_at(&mut scene, 0.0, 0.0, 100.0);
    let mut ctl = PointerController::new(EngineConfig::default());

    ctl.handle(&mut scene, &InputEvent::down(50.0, 50.0, Modifiers::NONE));
    ctl.handle(&mut scene, &InputEvent::moved(60.0, 50.0, Modifiers::NONE));
    scene.drain_events();

    ctl.end_transform(&mut scene);
    assert_eq!(ctl.state(), ControllerState::Idle);
    assert!(
        scene
            .drain_events()
            .iter()
            .any(|e| e.kind == EventKind::Modified),
        "commit fires modified"
    );
    assert_eq!(scene.node_ref(idx).left, 10.0, "applied change survives");
}

/// Rotation through the floating handle, with snapping from the engine
/// default config.
#[test]
fn rotate_with_engine_snap_default() {
    init_logging();
    let mut scene = Scene::new();
    let root = scene.root();
    let mut n = SceneNode::new(NodeKind::Rect { rx: 0.0 });
    n.set_many([
        Prop::Left(200.0),
        Prop::Top(200.0),
        Prop::Width(100.0),
        Prop::Height(100.0),
    ]);
    let idx = scene.add(root, n).unwrap();
    scene.set_active_node(idx);

    let config = EngineConfig {
        snap_angle: Some(45.0),
        snap_threshold: Some(5.0),
        ..EngineConfig::default()
    };
    let mut ctl = PointerController::new(config);

    // Rotate handle floats 40px above the top edge: (200, 110).
    ctl.handle(&mut scene, &InputEvent::down(200.0, 110.0, Modifiers::NONE));
    assert_eq!(
        ctl.session().map(|s| s.action),
        Some(easel_editor::Action::Rotate)
    );

    // Swing the pointer 43° around the center (200, 200): within the
    // 5° window of 45.
    let rad = (-90f64 + 43.0).to_radians();
    let target = Point::new(200.0 + 90.0 * rad.cos(), 200.0 + 90.0 * rad.sin());
    ctl.handle(&mut scene, &InputEvent::moved(target.x, target.y, Modifiers::NONE));
    ctl.handle(&mut scene, &InputEvent::up(target.x, target.y, Modifiers::NONE));

    assert_eq!(scene.node_ref(idx).angle, 45.0);
}
