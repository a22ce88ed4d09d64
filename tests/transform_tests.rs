//! Transformation caching tests
//!
//! Tests for:
//! - Absolute transformation composition along the root path
//! - Lazy cleaning: which nodes get recomputed, and when
//! - Query idempotence (cache hits)
//! - Relative queries (ancestor frame, same-tree reference frame)
//! - Transformation multiplication order
//! - 2D graphs

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine2, Affine3A, Mat4, Vec2, Vec3};
use myth_scene::{
    GraphSettings, HierarchyError, NodeHandle, SceneGraph, SceneGraph2D, TransformationOrder,
};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn translate(x: f32, y: f32, z: f32) -> Affine3A {
    Affine3A::from_translation(Vec3::new(x, y, z))
}

fn assert_affine_eq(actual: Affine3A, expected: Affine3A) {
    assert!(
        actual.abs_diff_eq(expected, EPSILON),
        "expected {expected:?}, got {actual:?}"
    );
}

fn new_graph() -> SceneGraph {
    let _ = env_logger::builder().is_test(true).try_init();
    SceneGraph::with_settings(GraphSettings {
        check_invariants: true,
        ..Default::default()
    })
}

/// Records every node the cleaning traversal recomputes.
#[derive(Clone, Default)]
struct CleanLog(Rc<RefCell<Vec<NodeHandle>>>);

impl CleanLog {
    fn watch(&self, graph: &mut SceneGraph, handle: NodeHandle) {
        let log = Rc::clone(&self.0);
        graph
            .set_clean_observer(handle, move |node: NodeHandle, _: &Affine3A| log.borrow_mut().push(node))
            .unwrap();
    }

    fn take(&self) -> Vec<NodeHandle> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// R (identity scene) -> A (+X) -> B (+Y)
fn build_rab() -> (SceneGraph, NodeHandle, NodeHandle, NodeHandle) {
    let mut graph = new_graph();
    let r = graph.create_scene();
    let a = graph.create_child(r, translate(1.0, 0.0, 0.0)).unwrap();
    let b = graph.create_child(a, translate(0.0, 1.0, 0.0)).unwrap();
    (graph, r, a, b)
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn chain_world_positions() {
    let mut graph = new_graph();
    let mut handles = vec![graph.create_root(translate(1.0, 0.0, 0.0))];
    for _ in 1..5 {
        let parent = *handles.last().unwrap();
        handles.push(graph.create_child(parent, translate(1.0, 0.0, 0.0)).unwrap());
    }

    // Node[i] should have world X = i+1 (cumulative translations)
    for (i, &handle) in handles.iter().enumerate() {
        let world = graph.absolute_transformation(handle).unwrap();
        let expected_x = (i + 1) as f32;
        assert!(
            (world.translation.x - expected_x).abs() < EPSILON,
            "Node {i}: expected x={expected_x}, got x={}",
            world.translation.x
        );
    }
}

#[test]
fn root_absolute_is_its_local() {
    let mut graph = new_graph();
    let root = graph.create_root(Affine3A::from_rotation_z(0.5));
    assert_affine_eq(
        graph.absolute_transformation(root).unwrap(),
        Affine3A::from_rotation_z(0.5),
    );
}

#[test]
fn rotation_composes_parent_first() {
    let mut graph = new_graph();
    let root = graph.create_root(Affine3A::from_rotation_z(std::f32::consts::FRAC_PI_2));
    let child = graph.create_child(root, translate(1.0, 0.0, 0.0)).unwrap();

    // The child's offset is expressed in the rotated frame.
    let world = graph.absolute_transformation(child).unwrap();
    assert!(
        world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), EPSILON)
    );
}

#[test]
fn mat4_graph() {
    let mut graph: SceneGraph<Mat4> = SceneGraph::new();
    let root = graph.create_root(Mat4::from_scale(Vec3::splat(2.0)));
    let child = graph
        .create_child(root, Mat4::from_translation(Vec3::X))
        .unwrap();

    let world = graph.absolute_transformation(child).unwrap();
    assert!(
        world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPSILON)
    );
}

// ============================================================================
// Lazy Cleaning
// ============================================================================

#[test]
fn concrete_scenario_moving_a() {
    let (mut graph, r, a, b) = build_rab();
    let log = CleanLog::default();
    for h in [r, a, b] {
        log.watch(&mut graph, h);
    }

    assert_affine_eq(graph.absolute_transformation(b).unwrap(), translate(1.0, 1.0, 0.0));
    assert_eq!(log.take(), vec![r, a, b]);

    graph.set_transformation(a, translate(5.0, 0.0, 0.0)).unwrap();
    assert!(!graph.is_dirty(r).unwrap());
    assert!(graph.is_dirty(a).unwrap());
    assert!(graph.is_dirty(b).unwrap());

    assert_affine_eq(graph.absolute_transformation(b).unwrap(), translate(5.0, 1.0, 0.0));
    assert_eq!(log.take(), vec![a, b], "R must not be recomputed");
}

#[test]
fn query_is_idempotent() {
    let (mut graph, _, _, b) = build_rab();
    let log = CleanLog::default();
    log.watch(&mut graph, b);

    let first = graph.absolute_transformation(b).unwrap();
    assert_eq!(log.take().len(), 1);

    let second = graph.absolute_transformation(b).unwrap();
    assert_eq!(first, second, "cache hit must be bit-identical");
    assert!(log.take().is_empty(), "second query must not recompute");
}

#[test]
fn query_leaves_sibling_subtrees_dirty() {
    let (mut graph, r, a, b) = build_rab();
    let c = graph.create_child(r, translate(0.0, 0.0, 1.0)).unwrap();
    let d = graph.create_child(c, translate(0.0, 0.0, 1.0)).unwrap();

    graph.absolute_transformation(b).unwrap();
    assert!(!graph.is_dirty(a).unwrap());
    assert!(graph.is_dirty(c).unwrap());
    assert!(graph.is_dirty(d).unwrap());

    assert_affine_eq(graph.absolute_transformation(d).unwrap(), translate(0.0, 0.0, 2.0));
}

#[test]
fn querying_a_parent_does_not_clean_children() {
    let (mut graph, _, a, b) = build_rab();
    graph.absolute_transformation(a).unwrap();
    assert!(!graph.is_dirty(a).unwrap());
    assert!(graph.is_dirty(b).unwrap());
}

#[test]
fn observer_sees_value_before_clean() {
    let (mut graph, _, a, b) = build_rab();
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    graph
        .set_clean_observer(a, move |_: NodeHandle, absolute: &Affine3A| *sink.borrow_mut() = Some(*absolute))
        .unwrap();

    graph.absolute_transformation(b).unwrap();
    assert_affine_eq(seen.borrow().unwrap(), translate(1.0, 0.0, 0.0));

    assert!(graph.remove_clean_observer(a).unwrap());
    assert!(!graph.remove_clean_observer(a).unwrap());
}

#[test]
fn repeated_mutations_mark_once() {
    let (mut graph, r, a, b) = build_rab();
    let log = CleanLog::default();
    log.watch(&mut graph, b);
    graph.absolute_transformation(b).unwrap();
    log.take();

    // A burst of edits inside one dirty region: a single recomputation.
    for i in 0..10 {
        graph.set_transformation(a, translate(i as f32, 0.0, 0.0)).unwrap();
        graph.set_transformation(b, translate(0.0, i as f32, 0.0)).unwrap();
    }
    assert!(!graph.is_dirty(r).unwrap());
    assert_affine_eq(graph.absolute_transformation(b).unwrap(), translate(9.0, 9.0, 0.0));
    assert_eq!(log.take(), vec![b]);
}

#[test]
fn set_dirty_and_set_clean() {
    let (mut graph, r, a, b) = build_rab();
    graph.set_clean(b).unwrap();
    assert!(!graph.is_dirty(a).unwrap());

    graph.set_dirty(a).unwrap();
    assert!(!graph.is_dirty(r).unwrap());
    assert!(graph.is_dirty(a).unwrap());
    assert!(graph.is_dirty(b).unwrap());

    graph.set_clean(a).unwrap();
    assert!(!graph.is_dirty(a).unwrap());
    assert!(graph.is_dirty(b).unwrap());
}

#[test]
fn set_dirty_on_checked_graph() {
    let (mut graph, r, a, b) = build_rab();
    assert!(graph.settings().check_invariants);
    graph.clean_all();

    graph.set_dirty(r).unwrap();
    assert!([r, a, b].iter().all(|&h| graph.is_dirty(h).unwrap()));
    assert_eq!(graph.validate(), Ok(()));

    graph.remove_node(b).unwrap();
    assert_eq!(graph.set_dirty(b), Err(HierarchyError::NodeNotFound(b)));
    assert_affine_eq(graph.absolute_transformation(a).unwrap(), translate(1.0, 0.0, 0.0));
}

#[test]
fn clean_all_cleans_everything() {
    let (mut graph, r, _, b) = build_rab();
    let c = graph.create_child(r, translate(0.0, 0.0, 3.0)).unwrap();

    assert_eq!(graph.clean_all(), 4);
    assert!(graph.iter().all(|(_, node)| !node.is_dirty()));
    assert_eq!(graph.clean_all(), 0);

    assert_affine_eq(*graph.get_node(b).unwrap().cached_absolute().unwrap(), translate(1.0, 1.0, 0.0));
    assert_affine_eq(*graph.get_node(c).unwrap().cached_absolute().unwrap(), translate(0.0, 0.0, 3.0));
}

#[test]
fn cached_absolute_hidden_while_dirty() {
    let (mut graph, _, a, _) = build_rab();
    assert!(graph.get_node(a).unwrap().cached_absolute().is_none());
    graph.absolute_transformation(a).unwrap();
    assert!(graph.get_node(a).unwrap().cached_absolute().is_some());
}

// ============================================================================
// Reparenting
// ============================================================================

#[test]
fn concrete_scenario_reparent_b_to_root() {
    let (mut graph, r, a, b) = build_rab();
    graph.absolute_transformation(b).unwrap();

    graph.set_parent(b, Some(r)).unwrap();
    assert_affine_eq(graph.absolute_transformation(b).unwrap(), translate(0.0, 1.0, 0.0));
    assert!(!graph.children(a).unwrap().contains(&b));
    assert!(graph.children(r).unwrap().contains(&b));
}

#[test]
fn reparent_keeps_local_frame() {
    let mut graph = new_graph();
    let scene = graph.create_scene();
    let p1 = graph.create_child(scene, translate(1.0, 0.0, 0.0)).unwrap();
    let p2 = graph.create_child(scene, Affine3A::from_rotation_y(1.0)).unwrap();
    let child = graph.create_child(p1, translate(0.0, 0.0, 2.0)).unwrap();
    graph.absolute_transformation(child).unwrap();

    graph.set_parent(child, Some(p2)).unwrap();

    let expected = graph.absolute_transformation(p2).unwrap() * graph.local_transformation(child).unwrap();
    assert_affine_eq(graph.absolute_transformation(child).unwrap(), expected);
}

#[test]
fn reparent_keep_absolute_preserves_world_pose() {
    let mut graph = new_graph();
    let scene = graph.create_scene();
    let p1 = graph.create_child(scene, translate(1.0, 2.0, 3.0)).unwrap();
    let p2 = graph
        .create_child(scene, Affine3A::from_rotation_x(0.8) * translate(-4.0, 0.0, 1.0))
        .unwrap();
    let child = graph.create_child(p1, Affine3A::from_rotation_z(0.3)).unwrap();
    let grandchild = graph.create_child(child, translate(0.0, 1.0, 0.0)).unwrap();

    let before = graph.absolute_transformation(grandchild).unwrap();
    graph.set_parent_keep_absolute(child, Some(p2)).unwrap();
    assert_eq!(graph.parent(child).unwrap(), Some(p2));
    assert!(graph.is_dirty(grandchild).unwrap());

    let after = graph.absolute_transformation(grandchild).unwrap();
    assert!(after.abs_diff_eq(before, 1e-4));
}

#[test]
fn detach_to_root_keep_absolute() {
    let (mut graph, _, a, b) = build_rab();
    graph.set_parent_keep_absolute(b, None).unwrap();
    assert_eq!(graph.parent(b).unwrap(), None);
    assert!(!graph.children(a).unwrap().contains(&b));
    assert_affine_eq(graph.local_transformation(b).unwrap(), translate(1.0, 1.0, 0.0));
}

// ============================================================================
// Relative Queries
// ============================================================================

#[test]
fn relative_to_ancestor() {
    let (mut graph, r, a, b) = build_rab();
    let rel = graph.absolute_transformation_relative_to(b, a).unwrap();
    assert_affine_eq(rel, translate(0.0, 1.0, 0.0));

    let rel_root = graph.absolute_transformation_relative_to(b, r).unwrap();
    assert_affine_eq(rel_root, translate(1.0, 1.0, 0.0));

    let own = graph.absolute_transformation_relative_to(b, b).unwrap();
    assert_affine_eq(own, Affine3A::IDENTITY);
}

#[test]
fn relative_to_non_ancestor_is_rejected() {
    let (mut graph, r, a, b) = build_rab();
    let sibling = graph.create_child(r, translate(3.0, 0.0, 0.0)).unwrap();

    let err = graph.absolute_transformation_relative_to(b, sibling).unwrap_err();
    assert_eq!(err, HierarchyError::UnrelatedNode { node: b, ancestor: sibling });

    // Descendants are not ancestors either.
    assert!(matches!(
        graph.absolute_transformation_relative_to(a, b),
        Err(HierarchyError::UnrelatedNode { .. })
    ));
}

#[test]
fn cross_tree_query_is_rejected() {
    let mut graph = new_graph();
    let x = graph.create_root(translate(1.0, 0.0, 0.0));
    let y = graph.create_root(translate(0.0, 1.0, 0.0));

    assert!(matches!(
        graph.absolute_transformation_relative_to(x, y),
        Err(HierarchyError::UnrelatedNode { .. })
    ));
    assert_eq!(
        graph.transformation_relative_to(x, y).unwrap_err(),
        HierarchyError::DisjointTrees { node: x, reference: y }
    );
}

#[test]
fn relative_to_camera_in_same_tree() {
    let (mut graph, r, _, b) = build_rab();
    let camera = graph.create_child(r, translate(0.0, 0.0, 5.0)).unwrap();

    let in_camera = graph.transformation_relative_to(b, camera).unwrap();
    assert_affine_eq(in_camera, translate(1.0, 1.0, -5.0));
}

// ============================================================================
// Multiplication Order
// ============================================================================

#[test]
fn multiply_global_and_local() {
    let mut graph = new_graph();
    let quarter = Affine3A::from_rotation_z(std::f32::consts::FRAC_PI_2);

    let global = graph.create_root(translate(1.0, 0.0, 0.0));
    graph
        .multiply_transformation(global, quarter, TransformationOrder::Global)
        .unwrap();
    // Rotation applied after the translation, in the parent frame.
    assert!(
        graph
            .absolute_transformation(global)
            .unwrap()
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), EPSILON)
    );

    let local = graph.create_root(translate(1.0, 0.0, 0.0));
    graph
        .multiply_transformation(local, quarter, TransformationOrder::Local)
        .unwrap();
    assert!(
        graph
            .absolute_transformation(local)
            .unwrap()
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON)
    );
}

// ============================================================================
// 2D
// ============================================================================

#[test]
fn two_dimensional_graph() {
    let mut graph = SceneGraph2D::new();
    let scene = graph.create_scene();
    let a = graph.create_child(scene, Affine2::from_translation(Vec2::new(1.0, 0.0))).unwrap();
    let b = graph.create_child(a, Affine2::from_angle(std::f32::consts::PI)).unwrap();
    let c = graph.create_child(b, Affine2::from_translation(Vec2::new(1.0, 0.0))).unwrap();

    let world = graph.absolute_transformation(c).unwrap();
    assert!(world.transform_point2(Vec2::ZERO).abs_diff_eq(Vec2::ZERO, EPSILON));
}
