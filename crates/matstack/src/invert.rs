//! Fallible matrix inversion.
//!
//! `glam::Mat4::inverse` never fails: a singular input silently produces
//! non-finite values. Rebase needs an explicit "no inverse" signal, so it goes
//! through [`try_inverse`] instead.

use glam::Mat4;

/// Default singularity tolerance on the absolute determinant.
///
/// A matrix whose `|det|` is at or below this value is treated as singular.
/// The limit is absolute, so it depends on scale: scale factors as small as
/// `1e-3` on all three axes (det `1e-9`) still invert, but cumulative
/// determinants multiply with depth. Four nested uniform scales of `0.05`
/// give det `~2.4e-16` and are rejected although they are invertible. Stacks
/// holding deep chains of small scales should pick a smaller tolerance with
/// [`TransformStack::with_singular_epsilon`](crate::TransformStack::with_singular_epsilon).
pub const DEFAULT_SINGULAR_EPSILON: f32 = 1e-10;

/// Returns `true` if `m` is singular under `epsilon`.
#[inline]
pub fn is_singular(m: &Mat4, epsilon: f32) -> bool {
    let det = m.determinant();
    !det.is_finite() || det.abs() <= epsilon
}

/// Inverts `m`, or returns `None` when it is singular under `epsilon`
/// or the computed inverse is not finite.
pub fn try_inverse(m: &Mat4, epsilon: f32) -> Option<Mat4> {
    if is_singular(m, epsilon) {
        return None;
    }
    let inv = m.inverse();
    inv.is_finite().then_some(inv)
}
