//! The transformation capability consumed by the scene graph.
//!
//! The graph never inspects a transformation: it only composes, inverts and
//! compares them. [`Transformation`] captures exactly that, and is
//! implemented for the glam types used by the engine:
//!
//! | Type       | Space | Notes                               |
//! |------------|-------|-------------------------------------|
//! | `Affine3A` | 3D    | Default, SIMD-friendly              |
//! | `Mat4`     | 3D    | Arbitrary projective matrices       |
//! | `Affine2`  | 2D    |                                     |
//! | `Mat3`     | 2D    | Homogeneous 2D matrices             |

use glam::{Affine2, Affine3A, Mat3, Mat4};

/// A composable, invertible transformation.
///
/// Implementations must form a monoid under [`combine`](Self::combine) with
/// [`identity`](Self::identity) as unit, and [`inverse`](Self::inverse) must
/// satisfy `inverse(t).combine(t) ≈ identity()`.
pub trait Transformation: Copy + PartialEq + std::fmt::Debug {
    /// The neutral transformation.
    fn identity() -> Self;

    /// Composes `self` (the outer/parent frame) with `child`.
    ///
    /// For matrix types this is `self * child`: `child` is applied first.
    #[must_use]
    fn combine(&self, child: &Self) -> Self;

    /// Returns the inverse transformation.
    #[must_use]
    fn inverse(&self) -> Self;

    /// Element-wise comparison with an absolute tolerance.
    fn approx_eq(&self, other: &Self, max_abs_diff: f32) -> bool;
}

/// Where [`SceneGraph::multiply_transformation`](crate::scene::SceneGraph::multiply_transformation)
/// applies the extra transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformationOrder {
    /// Applied after the current local transformation, in the parent's frame.
    #[default]
    Global,
    /// Applied before the current local transformation, in the node's own frame.
    Local,
}

macro_rules! impl_transformation {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Transformation for $ty {
                #[inline]
                fn identity() -> Self {
                    <$ty>::IDENTITY
                }

                #[inline]
                fn combine(&self, child: &Self) -> Self {
                    *self * *child
                }

                #[inline]
                fn inverse(&self) -> Self {
                    <$ty>::inverse(self)
                }

                #[inline]
                fn approx_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
                    <$ty>::abs_diff_eq(self, *other, max_abs_diff)
                }
            }
        )*
    };
}

impl_transformation!(Affine3A, Mat4, Affine2, Mat3);
