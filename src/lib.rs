//! Myth Scene
//!
//! A hierarchical scene graph whose absolute transformations are cached and
//! recomputed lazily. Mutations only mark subtrees dirty; queries clean the
//! minimal dirty path to the nearest trustworthy ancestor.
//!
//! ```rust,ignore
//! use glam::{Affine3A, Vec3};
//! use myth_scene::SceneGraph;
//!
//! let mut graph: SceneGraph = SceneGraph::new();
//! let scene = graph.create_scene();
//! let a = graph.create_child(scene, Affine3A::from_translation(Vec3::X))?;
//! let b = graph.create_child(a, Affine3A::from_translation(Vec3::Y))?;
//!
//! graph.set_transformation(a, Affine3A::from_translation(Vec3::X * 5.0))?;
//! let world = graph.absolute_transformation(b)?; // translate(5, 1, 0)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod scene;
pub mod settings;

pub use errors::HierarchyError;
pub use scene::{
    CleanObserver, Node, NodeFlags, NodeHandle, SceneGraph, SceneGraph2D, SceneGraph3D, SceneNode,
    Transformation, TransformationOrder,
};
pub use settings::GraphSettings;
