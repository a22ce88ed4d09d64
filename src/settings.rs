//! Scene Graph Settings
//!
//! [`GraphSettings`] configures a [`SceneGraph`](crate::scene::SceneGraph)
//! at construction time.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_scene::{GraphSettings, SceneGraph};
//!
//! // Large scene, with a whole-arena check after every mutation
//! let graph: SceneGraph = SceneGraph::with_settings(GraphSettings {
//!     initial_capacity: 4096,
//!     check_invariants: true,
//!     ..Default::default()
//! });
//! ```

/// Construction-time configuration for a scene graph.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphSettings {
    /// Number of node slots reserved up front.
    pub initial_capacity: usize,

    /// Run [`SceneGraph::validate`](crate::scene::SceneGraph::validate)
    /// after every structural mutation and log any violation at `error` level.
    ///
    /// This walks the whole arena on every mutation, so it is off by default.
    pub check_invariants: bool,

    /// Absolute per-element tolerance used when comparing cached
    /// transformations against a from-scratch recomputation.
    pub tolerance: f32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            check_invariants: false,
            tolerance: 1e-4,
        }
    }
}
