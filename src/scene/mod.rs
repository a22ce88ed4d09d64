//! Scene graph module
//!
//! Manages the node hierarchy and its transformation caches:
//! - Node: hierarchy links, local transformation, cached absolute transformation
//! - Transformation: the composable transformation capability (glam types)
//! - SceneGraph: the arena owning every node, and all mutation/query entry points
//! - TransformSystem: dirty propagation and the cleaning traversals
//! - CleanObserver: per-node notification of recomputed absolute transformations
//! - SceneNode: chainable editing wrapper

pub mod node;
pub mod transform;
pub mod transform_system;
pub mod graph;
pub mod observer;
pub mod wrapper;
mod validate;

// Re-export commonly used types
pub use node::{Node, NodeFlags};
pub use transform::{Transformation, TransformationOrder};
pub use graph::{SceneGraph, SceneGraph2D, SceneGraph3D};
pub use observer::CleanObserver;
pub use wrapper::SceneNode;

use slotmap::new_key_type;

new_key_type! {
    /// Generational handle of a node in a [`SceneGraph`].
    pub struct NodeHandle;
}
