use bitflags::bitflags;

use crate::scene::NodeHandle;
use crate::scene::transform::Transformation;

bitflags! {
    /// Per-node role flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct NodeFlags: u8 {
        /// The node is a scene: a root that anchors a coordinate frame and
        /// can never be given a parent.
        const SCENE = 1 << 0;
    }
}

/// A scene graph node.
///
/// # Hierarchy
///
/// Nodes form a forest through parent-child relationships stored as arena
/// handles:
/// - `parent`: Optional handle to parent node (None for root nodes)
/// - `children`: Child node handles, in attachment order
///
/// Both sides of every edge are kept in sync by [`SceneGraph`](crate::scene::SceneGraph);
/// nodes are never mutated structurally on their own.
///
/// # Transformation
///
/// - `local`: pose relative to the parent (or to the world for a root)
/// - `absolute`: cached pose relative to the root, trusted only while
///   `dirty` is `false`
///
/// A dirty node always has a dirty subtree.
#[derive(Debug, Clone)]
pub struct Node<T: Transformation> {
    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    pub(crate) local: T,
    pub(crate) absolute: T,

    // === Core State ===
    pub(crate) dirty: bool,
    pub(crate) flags: NodeFlags,
}

impl<T: Transformation> Node<T> {
    /// Creates a detached, dirty node with the given local transformation.
    #[must_use]
    pub(crate) fn new(local: T, flags: NodeFlags) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local,
            absolute: T::identity(),
            dirty: true,
            flags,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns the local transformation.
    #[inline]
    #[must_use]
    pub fn local_transformation(&self) -> &T {
        &self.local
    }

    /// Returns the cached absolute transformation if it is trustworthy.
    ///
    /// This never recomputes anything; use
    /// [`SceneGraph::absolute_transformation`](crate::scene::SceneGraph::absolute_transformation)
    /// to clean the node first.
    #[inline]
    #[must_use]
    pub fn cached_absolute(&self) -> Option<&T> {
        (!self.dirty).then_some(&self.absolute)
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_scene(&self) -> bool {
        self.flags.contains(NodeFlags::SCENE)
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Removes `child` from the children list, keeping the order of the rest.
    pub(crate) fn unlink_child(&mut self, child: NodeHandle) {
        if let Some(pos) = self.children.iter().position(|&c| c == child) {
            self.children.remove(pos);
        }
    }
}
