//! Transform System
//!
//! Dirty propagation and the cleaning traversals, decoupled from
//! [`SceneGraph`](crate::scene::SceneGraph) so they only borrow the node arena
//! and the observer map.
//!
//! # Dirty protocol
//!
//! A dirty node always has a fully dirty subtree. Marking therefore stops at
//! the first node that is already dirty: a burst of mutations inside one
//! region costs a single subtree walk.
//!
//! # Cleaning
//!
//! - [`clean_path`] is the lazy, demand-driven traversal behind every query:
//!   walk up to the nearest clean ancestor (or past the root), then recompute
//!   back down along that path only. Sibling subtrees stay dirty.
//! - [`clean_all`] is the eager variant: one parent-before-child pass over the
//!   whole forest, recomputing every dirty node exactly once.

use slotmap::{SlotMap, SparseSecondaryMap};
use smallvec::SmallVec;

use crate::scene::NodeHandle;
use crate::scene::node::Node;
use crate::scene::observer::CleanObserver;
use crate::scene::transform::Transformation;

/// Per-node clean observers.
pub type Observers<T> = SparseSecondaryMap<NodeHandle, Box<dyn CleanObserver<T>>>;

/// Dirty chains deeper than this spill to the heap.
const INLINE_CHAIN: usize = 16;

/// Marks `handle` and its whole subtree dirty.
///
/// Returns how many nodes changed from clean to dirty. Subtrees whose root
/// is already dirty are skipped.
pub fn mark_subtree_dirty<T: Transformation>(
    nodes: &mut SlotMap<NodeHandle, Node<T>>,
    handle: NodeHandle,
) -> usize {
    let mut marked = 0;
    let mut stack: Vec<NodeHandle> = vec![handle];

    while let Some(current) = stack.pop() {
        let Some(node) = nodes.get_mut(current) else {
            continue;
        };
        if node.dirty {
            continue;
        }
        node.dirty = true;
        marked += 1;
        stack.extend_from_slice(&node.children);
    }

    marked
}

/// Returns the absolute transformation of `handle`, recomputing and caching
/// it for the dirty run between `handle` and its nearest clean ancestor.
///
/// Returns `None` if `handle` is not in the arena.
pub fn clean_path<T: Transformation>(
    nodes: &mut SlotMap<NodeHandle, Node<T>>,
    observers: &mut Observers<T>,
    handle: NodeHandle,
) -> Option<T> {
    let node = nodes.get(handle)?;
    if !node.dirty {
        return Some(node.absolute);
    }

    // 1. Collect the dirty run, bottom-up
    let mut chain: SmallVec<[NodeHandle; INLINE_CHAIN]> = SmallVec::new();
    let mut anchor = T::identity();
    let mut current = Some(handle);
    while let Some(h) = current {
        let Some(node) = nodes.get(h) else {
            break;
        };
        if !node.dirty {
            anchor = node.absolute;
            break;
        }
        chain.push(h);
        current = node.parent;
    }

    log::trace!("Cleaning {} node(s) on the path to {:?}", chain.len(), handle);

    // 2. Recompute top-down from the anchor
    let mut absolute = anchor;
    for &h in chain.iter().rev() {
        let Some(node) = nodes.get_mut(h) else {
            continue;
        };
        absolute = absolute.combine(&node.local);
        if let Some(observer) = observers.get_mut(h) {
            observer.clean(h, &absolute);
        }
        node.absolute = absolute;
        node.dirty = false;
    }

    Some(absolute)
}

/// Cleans every dirty node reachable from `roots`.
///
/// Uses an explicit stack so deep hierarchies cannot overflow the call stack.
/// Returns the number of recomputed nodes.
pub fn clean_all<T: Transformation>(
    nodes: &mut SlotMap<NodeHandle, Node<T>>,
    observers: &mut Observers<T>,
    roots: &[NodeHandle],
) -> usize {
    let mut cleaned = 0;

    // Work stack: (node, parent absolute)
    let mut stack: Vec<(NodeHandle, T)> = Vec::with_capacity(64);
    for &root in roots.iter().rev() {
        stack.push((root, T::identity()));
    }

    while let Some((handle, parent_absolute)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        if node.dirty {
            let absolute = parent_absolute.combine(&node.local);
            if let Some(observer) = observers.get_mut(handle) {
                observer.clean(handle, &absolute);
            }
            node.absolute = absolute;
            node.dirty = false;
            cleaned += 1;
        }

        // A clean node may still have dirty descendants, so always descend.
        let current = node.absolute;
        for &child in node.children.iter().rev() {
            stack.push((child, current));
        }
    }

    if cleaned > 0 {
        log::trace!("Eager clean recomputed {cleaned} node(s)");
    }
    cleaned
}
