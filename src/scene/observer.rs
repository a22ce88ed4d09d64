//! Clean notifications.
//!
//! A [`CleanObserver`] registered on a node is told about every absolute
//! transformation the cleaning traversal computes for that node, right before
//! the node is marked clean. This is the only side channel of the traversal:
//! anything derived from a node's world pose (bounding volumes, renderer
//! caches, camera matrices) hooks in here instead of polling.
//!
//! ```rust,ignore
//! graph.set_clean_observer(camera, move |_node, absolute: &Affine3A| {
//!     view.set(absolute.inverse());
//! })?;
//! ```

use crate::scene::NodeHandle;

/// Receives freshly computed absolute transformations.
pub trait CleanObserver<T> {
    /// Called once per recomputation of `node`, while the node is still dirty.
    fn clean(&mut self, node: NodeHandle, absolute: &T);
}

impl<T, F> CleanObserver<T> for F
where
    F: FnMut(NodeHandle, &T),
{
    #[inline]
    fn clean(&mut self, node: NodeHandle, absolute: &T) {
        self(node, absolute);
    }
}
