//! Errors reported by [`TransformStack`](crate::stack::TransformStack).

use glam::Mat4;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StackError {
    /// Tried to remove matrices below the identity floor.
    #[error(
        "cannot remove {requested} matrices from the stack: only {available} above the identity floor"
    )]
    Underflow { requested: usize, available: usize },

    /// Index outside the range the operation accepts.
    #[error("stack index {index} is out of bounds for a stack of length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// A cumulative matrix met during rebase is singular; the rebase was rolled back.
    #[error("cannot invert matrix {matrix} at stack index {index}, rebase aborted")]
    NoInverse { index: usize, matrix: Mat4 },
}

pub type StackResult<T> = Result<T, StackError>;
