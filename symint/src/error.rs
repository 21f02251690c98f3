use thiserror::Error;

use crate::GuardSite;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymIntError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot combine nodes of different families: {lhs} and {rhs}")]
    FamilyMismatch {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("could not resolve `{expr}` to a concrete integer (guarded at {site})")]
    Unresolved { expr: String, site: GuardSite },

    #[error("{value} does not fit in a 63-bit integer")]
    Overflow { value: i64 },
}

/// Report an error from an infallible operator as a contract violation.
#[track_caller]
pub(crate) fn fatal<T>(result: Result<T, SymIntError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
