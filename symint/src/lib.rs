//! Symbolic integers: a one-word value that is either a concrete 63-bit
//! integer or an owned reference to a node in a symbolic expression graph.
//!
//! Concrete values never allocate and never dispatch. When at least one
//! operand is symbolic, the concrete one is wrapped by the symbolic one's
//! node family and the operation is delegated to the node.
//!
//! Building without the default `symbolic` feature compiles symbolic values
//! out: [`SymInt::is_symbolic`] is constant `false` and every bridge to a
//! node handle panics.

mod error;
mod expr;
mod guard;
mod node;
mod normalize;
mod ops;
mod shape;
mod shape_env;
mod symint;
mod tagged;

#[cfg(test)]
mod testing;

pub use error::SymIntError;
pub use expr::{EvalError, Expr};
pub use guard::GuardSite;
pub use node::{NodeHandle, SymbolicNode};
pub(crate) use normalize::normalize;
pub use ops::{BinaryOp, CompareOp, floor_div, floor_mod};
pub use shape::{contiguous_strides, numel};
pub use shape_env::{ExprNode, Guard, ShapeEnv};
pub use symint::SymInt;
pub use tagged::{SYMBOLIC_TAG, Word};
