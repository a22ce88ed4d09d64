use glam::Affine3A;
use slotmap::SlotMap;

use crate::errors::{HierarchyError, Result};
use crate::scene::NodeHandle;
use crate::scene::node::{Node, NodeFlags};
use crate::scene::observer::CleanObserver;
use crate::scene::transform::{Transformation, TransformationOrder};
use crate::scene::transform_system::{self, Observers};
use crate::scene::wrapper::SceneNode;
use crate::settings::GraphSettings;

/// A forest of nodes with lazily cached absolute transformations.
///
/// The graph is the only way to mutate nodes: it keeps parent and child
/// links symmetric, rejects cycles, and maintains the dirty protocol described
/// in [`transform_system`]. Queries take `&mut self` because answering them
/// may refresh caches along the queried path.
///
/// Access must be serialized by the caller; the graph has no interior
/// synchronization.
///
/// # Example
///
/// ```rust,ignore
/// let mut graph = SceneGraph::new();
/// let scene = graph.create_scene();
/// let arm = graph.create_child(scene, Affine3A::from_translation(Vec3::X))?;
/// let hand = graph.create_child(arm, Affine3A::from_translation(Vec3::Y))?;
///
/// assert_eq!(graph.absolute_transformation(hand)?.translation, Vec3A::new(1.0, 1.0, 0.0));
/// ```
pub struct SceneGraph<T: Transformation = Affine3A> {
    pub(crate) nodes: SlotMap<NodeHandle, Node<T>>,
    pub(crate) observers: Observers<T>,
    pub(crate) settings: GraphSettings,
}

/// Scene graph over 2D affine transformations.
pub type SceneGraph2D = SceneGraph<glam::Affine2>;
/// Scene graph over 3D affine transformations.
pub type SceneGraph3D = SceneGraph<Affine3A>;

impl<T: Transformation> Default for SceneGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transformation> std::fmt::Debug for SceneGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .field("observers", &self.observers.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T: Transformation> SceneGraph<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(GraphSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: GraphSettings) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(settings.initial_capacity),
            observers: Observers::new(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Creates a scene: an identity root that can never be reparented.
    pub fn create_scene(&mut self) -> NodeHandle {
        self.nodes.insert(Node::new(T::identity(), NodeFlags::SCENE))
    }

    /// Creates a plain root node.
    pub fn create_root(&mut self, local: T) -> NodeHandle {
        self.nodes.insert(Node::new(local, NodeFlags::empty()))
    }

    /// Creates a node as the last child of `parent`.
    pub fn create_child(&mut self, parent: NodeHandle, local: T) -> Result<NodeHandle> {
        self.node_ref(parent)?;

        let mut node = Node::new(local, NodeFlags::empty());
        node.parent = Some(parent);
        let handle = self.nodes.insert(node);
        self.nodes[parent].children.push(handle);

        self.after_mutation();
        Ok(handle)
    }

    // ========================================================================
    // Node Access
    // ========================================================================

    /// Returns a read-only view of a node.
    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node<T>> {
        self.nodes.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node<T>)> {
        self.nodes.iter()
    }

    /// Iterates over every node without a parent.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(handle, _)| handle)
    }

    /// Starts a chainable operation on `handle`.
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_, T> {
        SceneNode::new(self, handle)
    }

    pub fn parent(&self, handle: NodeHandle) -> Result<Option<NodeHandle>> {
        Ok(self.node_ref(handle)?.parent)
    }

    /// Returns the children of `handle` in attachment order.
    ///
    /// The slice borrows the graph, so the hierarchy cannot change while it
    /// is being iterated.
    pub fn children(&self, handle: NodeHandle) -> Result<&[NodeHandle]> {
        Ok(&self.node_ref(handle)?.children)
    }

    pub fn local_transformation(&self, handle: NodeHandle) -> Result<T> {
        Ok(self.node_ref(handle)?.local)
    }

    pub fn is_dirty(&self, handle: NodeHandle) -> Result<bool> {
        Ok(self.node_ref(handle)?.dirty)
    }

    pub fn is_scene(&self, handle: NodeHandle) -> Result<bool> {
        Ok(self.node_ref(handle)?.is_scene())
    }

    // ========================================================================
    // Tree Queries
    // ========================================================================

    /// Iterates over the strict ancestors of `handle`, nearest first.
    ///
    /// Yields nothing for a stale handle.
    pub fn ancestors(&self, handle: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        std::iter::successors(
            self.nodes.get(handle).and_then(|n| n.parent),
            |&h| self.nodes.get(h).and_then(|n| n.parent),
        )
    }

    /// Returns the root of the tree containing `handle`.
    pub fn root(&self, handle: NodeHandle) -> Result<NodeHandle> {
        self.node_ref(handle)?;
        Ok(self.ancestors(handle).last().unwrap_or(handle))
    }

    /// Returns the scene containing `handle`, or `None` if its root is a
    /// plain root.
    pub fn scene(&self, handle: NodeHandle) -> Result<Option<NodeHandle>> {
        let root = self.root(handle)?;
        Ok(self.nodes[root].is_scene().then_some(root))
    }

    /// Number of edges between `handle` and its root.
    pub fn depth(&self, handle: NodeHandle) -> Result<usize> {
        self.node_ref(handle)?;
        Ok(self.ancestors(handle).count())
    }

    /// Whether `ancestor` is a strict ancestor of `handle`.
    pub fn is_ancestor_of(&self, ancestor: NodeHandle, handle: NodeHandle) -> Result<bool> {
        self.node_ref(ancestor)?;
        self.node_ref(handle)?;
        Ok(self.ancestors(handle).any(|h| h == ancestor))
    }

    /// Returns every strict descendant of `handle` in pre-order.
    pub fn descendants(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.node_ref(handle)?.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Hierarchy Mutation
    // ========================================================================

    /// Moves `handle` under `parent`, or makes it a root when `parent` is
    /// `None`.
    ///
    /// The local transformation is kept, so the world pose generally changes.
    /// Setting the current parent again is a no-op. On error nothing changes.
    pub fn set_parent(&mut self, handle: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        if !self.check_reparent(handle, parent)? {
            return Ok(());
        }
        self.relink(handle, parent);
        self.after_mutation();
        Ok(())
    }

    /// Like [`set_parent`](Self::set_parent), but rewrites the local
    /// transformation so the node keeps its world pose:
    /// `local = inverse(parent_absolute) * old_absolute`.
    pub fn set_parent_keep_absolute(
        &mut self,
        handle: NodeHandle,
        parent: Option<NodeHandle>,
    ) -> Result<()> {
        if !self.check_reparent(handle, parent)? {
            return Ok(());
        }

        let absolute = self.absolute_transformation(handle)?;
        let parent_absolute = match parent {
            Some(p) => self.absolute_transformation(p)?,
            None => T::identity(),
        };
        self.nodes[handle].local = parent_absolute.inverse().combine(&absolute);

        self.relink(handle, parent);
        self.after_mutation();
        Ok(())
    }

    /// Replaces the local transformation and marks the subtree dirty.
    pub fn set_transformation(&mut self, handle: NodeHandle, local: T) -> Result<()> {
        self.node_mut(handle)?.local = local;
        transform_system::mark_subtree_dirty(&mut self.nodes, handle);
        self.after_mutation();
        Ok(())
    }

    /// Composes `transformation` into the local transformation.
    pub fn multiply_transformation(
        &mut self,
        handle: NodeHandle,
        transformation: T,
        order: TransformationOrder,
    ) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.local = match order {
            TransformationOrder::Global => transformation.combine(&node.local),
            TransformationOrder::Local => node.local.combine(&transformation),
        };
        transform_system::mark_subtree_dirty(&mut self.nodes, handle);
        self.after_mutation();
        Ok(())
    }

    /// Marks `handle` and its subtree dirty without changing anything else.
    ///
    /// Useful when an observer's own state was reset and it needs to see the
    /// next recomputation.
    pub fn set_dirty(&mut self, handle: NodeHandle) -> Result<()> {
        self.node_ref(handle)?;
        transform_system::mark_subtree_dirty(&mut self.nodes, handle);
        self.after_mutation();
        Ok(())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes `handle` and its entire subtree. Returns the number of nodes
    /// removed.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<usize> {
        let mut doomed = self.descendants(handle)?;
        doomed.push(handle);

        if let Some(parent) = self.nodes[handle].parent {
            self.nodes[parent].unlink_child(handle);
        }
        for &h in &doomed {
            self.nodes.remove(h);
            self.observers.remove(h);
        }

        log::debug!("Removed {:?} with {} descendant(s)", handle, doomed.len() - 1);
        self.after_mutation();
        Ok(doomed.len())
    }

    /// Removes only `handle`, promoting its children to its former parent
    /// (or to roots). Each promoted child keeps its world pose.
    pub fn remove_node_keep_children(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.node_ref(handle)?;
        let parent = node.parent;
        let children = node.children.clone();

        let parent_inverse = match parent {
            Some(p) => self.absolute_transformation(p)?.inverse(),
            None => T::identity(),
        };
        let mut promoted = Vec::with_capacity(children.len());
        for &child in &children {
            let absolute = self.absolute_transformation(child)?;
            promoted.push((child, parent_inverse.combine(&absolute)));
        }

        if let Some(p) = parent {
            self.nodes[p].unlink_child(handle);
        }
        for (child, local) in promoted {
            let node = &mut self.nodes[child];
            node.parent = parent;
            node.local = local;
            if let Some(p) = parent {
                self.nodes[p].children.push(child);
            }
            transform_system::mark_subtree_dirty(&mut self.nodes, child);
        }
        self.nodes.remove(handle);
        self.observers.remove(handle);

        log::debug!("Removed {:?}, promoted {} child(ren)", handle, children.len());
        self.after_mutation();
        Ok(())
    }

    // ========================================================================
    // Transformation Queries
    // ========================================================================

    /// Returns the transformation of `handle` relative to its root, cleaning
    /// the dirty part of its root path on the way.
    pub fn absolute_transformation(&mut self, handle: NodeHandle) -> Result<T> {
        transform_system::clean_path(&mut self.nodes, &mut self.observers, handle)
            .ok_or(HierarchyError::NodeNotFound(handle))
    }

    /// Expresses `handle`'s transformation in the frame of `ancestor`.
    ///
    /// `ancestor` must be `handle` itself or on its path to the root.
    pub fn absolute_transformation_relative_to(
        &mut self,
        handle: NodeHandle,
        ancestor: NodeHandle,
    ) -> Result<T> {
        if handle == ancestor {
            self.node_ref(handle)?;
            return Ok(T::identity());
        }
        if !self.is_ancestor_of(ancestor, handle)? {
            log::warn!("Rejected relative query: {ancestor:?} is not an ancestor of {handle:?}");
            return Err(HierarchyError::UnrelatedNode { node: handle, ancestor });
        }
        self.relative_unchecked(handle, ancestor)
    }

    /// Expresses `handle`'s transformation in the frame of any node of the
    /// same tree, such as a camera that is not one of its ancestors.
    pub fn transformation_relative_to(
        &mut self,
        handle: NodeHandle,
        reference: NodeHandle,
    ) -> Result<T> {
        if self.root(handle)? != self.root(reference)? {
            log::warn!("Rejected relative query: {handle:?} and {reference:?} are in different trees");
            return Err(HierarchyError::DisjointTrees { node: handle, reference });
        }
        self.relative_unchecked(handle, reference)
    }

    /// Runs the cleaning traversal for `handle` without returning the result.
    pub fn set_clean(&mut self, handle: NodeHandle) -> Result<()> {
        self.absolute_transformation(handle).map(|_| ())
    }

    /// Eagerly cleans every dirty node in the graph. Returns how many nodes
    /// were recomputed.
    pub fn clean_all(&mut self) -> usize {
        let roots: Vec<NodeHandle> = self.roots().collect();
        transform_system::clean_all(&mut self.nodes, &mut self.observers, &roots)
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Registers the clean observer of `handle`, replacing any previous one.
    pub fn set_clean_observer<O>(&mut self, handle: NodeHandle, observer: O) -> Result<()>
    where
        O: CleanObserver<T> + 'static,
    {
        self.node_ref(handle)?;
        self.observers.insert(handle, Box::new(observer));
        Ok(())
    }

    /// Unregisters the clean observer of `handle`. Returns whether one was set.
    pub fn remove_clean_observer(&mut self, handle: NodeHandle) -> Result<bool> {
        self.node_ref(handle)?;
        Ok(self.observers.remove(handle).is_some())
    }

    // ========================================================================
    // Internal
    // ========================================================================

    pub(crate) fn node_ref(&self, handle: NodeHandle) -> Result<&Node<T>> {
        self.nodes.get(handle).ok_or(HierarchyError::NodeNotFound(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node<T>> {
        self.nodes.get_mut(handle).ok_or(HierarchyError::NodeNotFound(handle))
    }

    /// Validates a reparent request. Returns `false` when it is a no-op.
    fn check_reparent(&self, handle: NodeHandle, parent: Option<NodeHandle>) -> Result<bool> {
        let node = self.node_ref(handle)?;
        if node.parent == parent {
            return Ok(false);
        }
        if node.is_scene() {
            log::warn!("Cannot reparent scene root {handle:?}");
            return Err(HierarchyError::SceneReparent(handle));
        }
        if let Some(p) = parent {
            self.node_ref(p)?;
            if p == handle || self.ancestors(p).any(|h| h == handle) {
                log::warn!("Rejected cyclic parenting of {handle:?} under {p:?}");
                return Err(HierarchyError::CyclicParenting { node: handle, parent: p });
            }
        }
        Ok(true)
    }

    /// Moves the edge of a validated reparent and dirties the subtree.
    fn relink(&mut self, handle: NodeHandle, parent: Option<NodeHandle>) {
        if let Some(old) = self.nodes[handle].parent {
            self.nodes[old].unlink_child(handle);
        }
        if let Some(p) = parent {
            self.nodes[p].children.push(handle);
        }
        self.nodes[handle].parent = parent;
        transform_system::mark_subtree_dirty(&mut self.nodes, handle);

        log::debug!("Reparented {handle:?} under {parent:?}");
    }

    fn relative_unchecked(&mut self, handle: NodeHandle, reference: NodeHandle) -> Result<T> {
        let reference_absolute = self.absolute_transformation(reference)?;
        let absolute = self.absolute_transformation(handle)?;
        Ok(reference_absolute.inverse().combine(&absolute))
    }

    fn after_mutation(&self) {
        if self.settings.check_invariants
            && let Err(err) = self.validate()
        {
            log::error!("Scene graph invariant violated: {err}");
        }
    }
}
