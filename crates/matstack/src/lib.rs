//! Persistent stack of cumulative 4x4 transforms for hierarchy traversal.
//!
//! Entering a child pushes its local factor, leaving pops it. On top of that
//! the stack can branch into independent copies, unwind to any depth, and
//! rebase: swap the factor applied at an earlier level and replay everything
//! above it, recovering the discarded factors through matrix inversion.

pub use glam::{Mat4, Quat, Vec3};

pub mod error;
pub mod invert;
pub mod stack;
pub mod transform;

pub use error::{StackError, StackResult};
pub use invert::{DEFAULT_SINGULAR_EPSILON, try_inverse};
pub use stack::TransformStack;
pub use transform::LocalTransform;
