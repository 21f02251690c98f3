use std::fmt;

use crate::{SymInt, SymIntError};

/// Where a guard was requested, for diagnostics when it cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardSite {
    pub file: &'static str,
    pub line: u32,
}

impl GuardSite {
    /// Used by node operations that force a value without a caller site.
    pub const UNKNOWN: GuardSite = GuardSite::new("<unknown>", 0);

    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for GuardSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The [`GuardSite`] of the macro invocation.
#[macro_export]
macro_rules! guard_site {
    () => {
        $crate::GuardSite::new(file!(), line!())
    };
}

/// Materialize a [`SymInt`] citing the invocation site.
#[macro_export]
macro_rules! guard_int {
    ($value:expr) => {
        $crate::SymInt::guard_int(&$value, $crate::guard_site!())
    };
}

impl SymInt {
    /// Force a concrete integer out of this value.
    ///
    /// Concrete values answer directly. Symbolic values ask their node,
    /// which may refuse with [`SymIntError::Unresolved`] citing `site`.
    pub fn guard_int(&self, site: GuardSite) -> Result<i64, SymIntError> {
        if !self.is_symbolic() {
            return Ok(self.as_int_unchecked());
        }
        self.to_node().guard_int(site)
    }
}
