//! Chainable node operation wrapper.
//!
//! [`SceneNode`] borrows a [`SceneGraph`] mutably and provides a fluent API
//! for editing one node without threading `?` through every step.
//!
//! Rejected steps (stale handle, cycle, scene reparent) are logged at `warn`
//! level and skipped; the first rejection is kept and can be retrieved with
//! [`SceneNode::finish`].
//!
//! # Example
//!
//! ```rust,ignore
//! graph.node(moon)
//!     .set_parent(Some(planet))
//!     .set_transformation(Affine3A::from_translation(Vec3::X * 3.0))
//!     .multiply(Affine3A::from_rotation_y(0.1), TransformationOrder::Global)
//!     .finish()?;
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]

use crate::errors::{HierarchyError, Result};
use crate::scene::NodeHandle;
use crate::scene::graph::SceneGraph;
use crate::scene::transform::{Transformation, TransformationOrder};

/// Temporary mutable borrow of a scene graph node for chainable operations.
pub struct SceneNode<'a, T: Transformation> {
    graph: &'a mut SceneGraph<T>,
    handle: NodeHandle,
    error: Option<HierarchyError>,
}

impl<'a, T: Transformation> SceneNode<'a, T> {
    #[inline]
    pub fn new(graph: &'a mut SceneGraph<T>, handle: NodeHandle) -> Self {
        Self { graph, handle, error: None }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Replaces the local transformation.
    #[inline]
    pub fn set_transformation(mut self, local: T) -> Self {
        let result = self.graph.set_transformation(self.handle, local);
        self.record(result);
        self
    }

    /// Composes an extra transformation into the local one.
    #[inline]
    pub fn multiply(mut self, transformation: T, order: TransformationOrder) -> Self {
        let result = self.graph.multiply_transformation(self.handle, transformation, order);
        self.record(result);
        self
    }

    /// Moves the node, keeping its local transformation.
    #[inline]
    pub fn set_parent(mut self, parent: Option<NodeHandle>) -> Self {
        let result = self.graph.set_parent(self.handle, parent);
        self.record(result);
        self
    }

    /// Moves the node, keeping its world pose.
    #[inline]
    pub fn set_parent_keep_absolute(mut self, parent: Option<NodeHandle>) -> Self {
        let result = self.graph.set_parent_keep_absolute(self.handle, parent);
        self.record(result);
        self
    }

    /// Ends the chain with the node's absolute transformation.
    pub fn absolute_transformation(self) -> Result<T> {
        let Self { graph, handle, error } = self;
        match error {
            Some(err) => Err(err),
            None => graph.absolute_transformation(handle),
        }
    }

    /// Ends the chain, reporting the first rejected step.
    pub fn finish(self) -> Result<NodeHandle> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.handle),
        }
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(err) = result {
            log::warn!("Skipped operation on {:?}: {err}", self.handle);
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }
}
