//! Structural and cache consistency checks.

use crate::errors::{HierarchyError, Result};
use crate::scene::NodeHandle;
use crate::scene::graph::SceneGraph;
use crate::scene::transform::Transformation;

impl<T: Transformation> SceneGraph<T> {
    /// Checks every invariant of the graph and reports the first violation.
    ///
    /// - Parent and child links are symmetric and point at live nodes
    /// - Every node reaches a root (no cycles)
    /// - Scene nodes are roots
    /// - Dirty nodes only have dirty children
    /// - Clean caches match a from-scratch recomputation within
    ///   [`GraphSettings::tolerance`](crate::GraphSettings::tolerance)
    ///
    /// This walks the whole arena and is meant for tests and debug builds.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |node: NodeHandle, reason: &'static str| -> Result<()> {
            Err(HierarchyError::CorruptHierarchy { node, reason })
        };

        for (handle, node) in &self.nodes {
            if let Some(parent) = node.parent {
                let Some(p) = self.nodes.get(parent) else {
                    return corrupt(handle, "parent is not a live node");
                };
                if !p.children.contains(&handle) {
                    return corrupt(handle, "missing from its parent's children");
                }
                if node.is_scene() {
                    return corrupt(handle, "scene node has a parent");
                }
            }

            for (i, &child) in node.children.iter().enumerate() {
                let Some(c) = self.nodes.get(child) else {
                    return corrupt(handle, "child is not a live node");
                };
                if c.parent != Some(handle) {
                    return corrupt(child, "child does not point back at its parent");
                }
                if node.children[..i].contains(&child) {
                    return corrupt(handle, "duplicate child");
                }
                if node.dirty && !c.dirty {
                    return corrupt(child, "clean node under a dirty parent");
                }
            }

            // A walk longer than the arena can only mean a cycle.
            if self.ancestors(handle).take(self.nodes.len() + 1).count() > self.nodes.len() {
                return corrupt(handle, "parent chain contains a cycle");
            }
        }

        for (handle, node) in &self.nodes {
            if node.dirty {
                continue;
            }
            let Some(expected) = self.recompute_absolute(handle) else {
                return corrupt(handle, "broken parent chain");
            };
            if !node.absolute.approx_eq(&expected, self.settings.tolerance) {
                return corrupt(handle, "stale absolute transformation cache");
            }
        }

        Ok(())
    }

    /// Composes local transformations from the root down to `handle`,
    /// ignoring every cache.
    #[must_use]
    pub fn recompute_absolute(&self, handle: NodeHandle) -> Option<T> {
        let mut locals = vec![self.nodes.get(handle)?.local];
        for ancestor in self.ancestors(handle) {
            locals.push(self.nodes.get(ancestor)?.local);
        }
        Some(
            locals
                .iter()
                .rev()
                .fold(T::identity(), |absolute, local| absolute.combine(local)),
        )
    }
}
