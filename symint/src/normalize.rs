#[cfg(feature = "symbolic")]
use crate::SymbolicNode;
use crate::{NodeHandle, SymInt, SymIntError};

/// Resolve both operands to nodes of one family.
///
/// A concrete operand is wrapped by the other operand's node and promoted
/// in place, so the caller's value is symbolic afterwards. At least one
/// operand must be symbolic.
#[cfg(feature = "symbolic")]
pub(crate) fn normalize(a: &SymInt, b: &SymInt) -> Result<[NodeHandle; 2], SymIntError> {
    let lhs = a.is_symbolic().then(|| a.to_node());
    let rhs = b.is_symbolic().then(|| b.to_node());

    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => {
            if !lhs.same_family(&rhs) {
                return Err(SymIntError::FamilyMismatch {
                    lhs: lhs.family(),
                    rhs: rhs.family(),
                });
            }
            Ok([lhs, rhs])
        }
        (Some(lhs), None) => {
            let rhs = promote(b, lhs.node());
            Ok([lhs, rhs])
        }
        (None, Some(rhs)) => {
            let lhs = promote(a, rhs.node());
            Ok([lhs, rhs])
        }
        (None, None) => panic!("normalize needs at least one symbolic operand"),
    }
}

#[cfg(not(feature = "symbolic"))]
#[track_caller]
pub(crate) fn normalize(_a: &SymInt, _b: &SymInt) -> Result<[NodeHandle; 2], SymIntError> {
    crate::symint::unavailable()
}

#[cfg(feature = "symbolic")]
fn promote(value: &SymInt, common: &dyn SymbolicNode) -> NodeHandle {
    let seen = value.word();
    if seen.is_symbolic() {
        return value.to_node();
    }
    let constant = seen.as_int_unchecked();
    let node = common.wrap(constant);
    log::trace!("promoting {constant} to a {} node", common.family());
    value.promote(seen, node)
}
