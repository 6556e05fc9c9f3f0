//! Cumulative transform stack for hierarchy traversal.

use std::slice;

use glam::Mat4;

use crate::error::{StackError, StackResult};
use crate::invert::{DEFAULT_SINGULAR_EPSILON, try_inverse};

const POP_UNDERFLOW: StackError = StackError::Underflow {
    requested: 1,
    available: 0,
};

/// Stack of cumulative matrices.
///
/// Index 0 always holds the identity and can never be removed or rebased.
/// Every deeper entry is its parent multiplied by the local factor given to
/// [`push`](Self::push). The factors themselves are not kept, only the
/// running products.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformStack {
    mats: Vec<Mat4>,
    singular_epsilon: f32,
}

#[allow(clippy::len_without_is_empty)]
impl TransformStack {
    pub fn new() -> Self {
        Self::with_singular_epsilon(DEFAULT_SINGULAR_EPSILON)
    }

    /// Stack whose [`rebase`](Self::rebase) treats `|det| <= epsilon` as singular.
    /// Negative and NaN tolerances are clamped to zero.
    pub fn with_singular_epsilon(epsilon: f32) -> Self {
        Self {
            mats: vec![Mat4::IDENTITY],
            singular_epsilon: epsilon.max(0.0),
        }
    }

    #[inline]
    pub fn singular_epsilon(&self) -> f32 {
        self.singular_epsilon
    }

    /// Multiplies the current top by `factor` and pushes the result.
    #[inline]
    pub fn push(&mut self, factor: Mat4) {
        let top = self.peek();
        self.mats.push(top * factor);
    }

    /// Removes and returns the top matrix.
    /// The identity floor is never removed.
    pub fn pop(&mut self) -> StackResult<Mat4> {
        if self.is_root() {
            return Err(POP_UNDERFLOW);
        }
        self.mats.pop().ok_or(POP_UNDERFLOW)
    }

    #[inline]
    pub fn peek(&self) -> Mat4 {
        self.mats[self.mats.len() - 1]
    }

    /// Number of matrices, including the identity floor. Never less than 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.mats.len()
    }

    /// Number of levels pushed above the identity floor.
    #[inline]
    pub fn depth(&self) -> usize {
        self.mats.len() - 1
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.mats.len() == 1
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Mat4> {
        self.mats.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Mat4] {
        &self.mats
    }

    /// Iterates from the identity floor up to the top.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Mat4> {
        self.mats.iter()
    }

    /// Pops `n` matrices at once. Fails without touching the stack if that
    /// would remove the identity floor.
    pub fn unwind(&mut self, n: usize) -> StackResult<()> {
        let available = self.depth();
        if n > available {
            return Err(StackError::Underflow {
                requested: n,
                available,
            });
        }
        self.mats.truncate(self.mats.len() - n);
        log::debug!("unwound {} levels, stack length now {}", n, self.mats.len());
        Ok(())
    }

    /// Unwinds until the stack holds exactly `len` matrices.
    pub fn unwind_to(&mut self, len: usize) -> StackResult<()> {
        let current = self.mats.len();
        if len == 0 {
            return Err(StackError::Underflow {
                requested: current,
                available: self.depth(),
            });
        }
        if len > current {
            return Err(StackError::OutOfBounds {
                index: len,
                len: current,
            });
        }
        self.unwind(current - len)
    }

    /// Independent copy for a traversal branch. Mutating either stack
    /// afterwards is never visible in the other.
    #[inline]
    pub fn branch(&self) -> Self {
        self.clone()
    }

    /// Pushes `factor`, runs `f`, then cuts the stack back to the length it
    /// had before the push.
    ///
    /// `f` may push, pop and rebase freely but must leave the pushed level in
    /// place. Unwinding below it cannot be undone here; debug builds panic.
    pub fn with_pushed<R>(&mut self, factor: Mat4, f: impl FnOnce(&mut Self) -> R) -> R {
        let len = self.mats.len();
        self.push(factor);
        let out = f(self);
        debug_assert!(
            self.mats.len() > len,
            "with_pushed closure unwound below its own level ({} <= {})",
            self.mats.len(),
            len
        );
        self.mats.truncate(len);
        out
    }

    /// Replaces the factor that produced level `n` with `change` and replays
    /// every deeper level on top of it.
    ///
    /// Factors are recovered by dividing each old cumulative matrix out of
    /// its successor, so every old matrix from `n` up to the one below the
    /// top must be invertible. The recovered factor is applied on the left of
    /// the updated parent: `M[i] = (old M[i-1]^-1 * old M[i]) * M[i-1]`.
    ///
    /// # Errors
    ///
    /// - [`StackError::OutOfBounds`] if `n` is 0 or not below [`len`](Self::len).
    /// - [`StackError::NoInverse`] if a matrix in the affected range is
    ///   singular. The stack is restored to its exact state before the call.
    pub fn rebase(&mut self, n: usize, change: Mat4) -> StackResult<()> {
        let len = self.mats.len();
        if n == 0 || n >= len {
            return Err(StackError::OutOfBounds { index: n, len });
        }
        log::debug!("rebasing level {} of {}", n, len);

        let backup = self.mats[n..].to_vec();

        let mut curr = self.mats[n];
        self.mats[n] = self.mats[n - 1] * change;

        for i in (n + 1)..len {
            let Some(inv) = try_inverse(&curr, self.singular_epsilon) else {
                self.mats[n..].copy_from_slice(&backup);
                log::warn!(
                    "matrix at level {} is singular (det {}), rebase at {} rolled back",
                    i - 1,
                    curr.determinant(),
                    n
                );
                return Err(StackError::NoInverse {
                    index: i - 1,
                    matrix: curr,
                });
            };

            let ghost = inv * self.mats[i];
            curr = self.mats[i];
            self.mats[i] = ghost * self.mats[i - 1];
        }

        log::debug!("rebase at {} replayed {} levels", n, len - n - 1);
        Ok(())
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a TransformStack {
    type Item = &'a Mat4;
    type IntoIter = slice::Iter<'a, Mat4>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
