//! Error Types
//!
//! This module defines the error types returned by the scene graph.
//!
//! # Overview
//!
//! [`HierarchyError`] covers every rejected operation:
//! - Parenting that would introduce a cycle
//! - Relative queries against nodes outside the queried node's root path
//! - Reparenting a scene root
//! - Stale handles (the node was removed)
//!
//! Every check runs before the graph is touched, so an `Err` always means the
//! hierarchy is exactly as it was before the call.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_scene::errors::{HierarchyError, Result};
//!
//! fn attach(graph: &mut SceneGraph, child: NodeHandle, parent: NodeHandle) -> Result<()> {
//!     graph.set_parent(child, Some(parent))?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::scene::NodeHandle;

/// The error type for all hierarchy operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    // ========================================================================
    // Parenting Errors
    // ========================================================================
    /// `parent` is `node` itself or one of its descendants.
    #[error("Cannot parent {node:?} to {parent:?}: the new parent is inside its subtree")]
    CyclicParenting {
        /// Node being reparented
        node: NodeHandle,
        /// Rejected parent
        parent: NodeHandle,
    },

    /// Scene roots anchor a coordinate frame and never get a parent.
    #[error("Cannot reparent scene root {0:?}")]
    SceneReparent(NodeHandle),

    // ========================================================================
    // Query Errors
    // ========================================================================
    /// `ancestor` is not on the path from `node` to its root.
    #[error("{ancestor:?} is not an ancestor of {node:?}")]
    UnrelatedNode {
        /// Queried node
        node: NodeHandle,
        /// Requested reference frame
        ancestor: NodeHandle,
    },

    /// The two nodes live in different trees (their root walks never meet).
    #[error("{node:?} and {reference:?} belong to different trees")]
    DisjointTrees {
        /// Queried node
        node: NodeHandle,
        /// Requested reference frame
        reference: NodeHandle,
    },

    // ========================================================================
    // Handle & Consistency Errors
    // ========================================================================
    /// The handle does not refer to a live node.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// Reported by [`SceneGraph::validate`](crate::scene::SceneGraph::validate).
    #[error("Corrupt hierarchy at {node:?}: {reason}")]
    CorruptHierarchy {
        /// First node found violating an invariant
        node: NodeHandle,
        /// Which invariant failed
        reason: &'static str,
    },
}

/// Alias for `Result<T, HierarchyError>`.
pub type Result<T> = std::result::Result<T, HierarchyError>;
