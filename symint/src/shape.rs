//! Helpers over tensor shapes made of [`SymInt`] sizes.
//!
//! These work on copies of the sizes, so a concrete size in the caller's
//! shape stays concrete even when it meets a symbolic one.

use crate::SymInt;

fn product(a: &SymInt, b: &SymInt) -> SymInt {
    &a.clone() * &b.clone()
}

/// Row-major strides: the last is 1, each earlier one the product of the
/// sizes after it.
pub fn contiguous_strides(shape: &[SymInt]) -> Vec<SymInt> {
    let mut strides = vec![SymInt::new(1); shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = product(&strides[i + 1], &shape[i + 1]);
    }
    strides
}

/// Total element count; 1 for a scalar shape.
pub fn numel(shape: &[SymInt]) -> SymInt {
    shape
        .iter()
        .fold(SymInt::new(1), |acc, size| product(&acc, size))
}
