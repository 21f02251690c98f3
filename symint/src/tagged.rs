//! Word: the packed 64-bit representation behind [`SymInt`](crate::SymInt).
//!
//! Encoding:
//! - **Concrete**: `...XXXXX0` 63-bit signed integer (low bit 0).
//! - **Symbolic**: `...XXXXX1` address of a node cell (mask the low bit; node
//!   cells are at least 2-byte aligned, checked when the cell type is
//!   defined).
//!
//! Nothing outside this module shifts or masks the raw bits.

/// Low bit set marks a symbolic word.
pub const SYMBOLIC_TAG: u64 = 0b1;

/// A packed concrete-or-symbolic word.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Word(u64);

impl Word {
    /// Smallest integer a concrete word can hold.
    pub const INT_MIN: i64 = -(1i64 << 62);
    /// Largest integer a concrete word can hold.
    pub const INT_MAX: i64 = (1i64 << 62) - 1;

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn fits(n: i64) -> bool {
        n >= Self::INT_MIN && n <= Self::INT_MAX
    }

    #[inline(always)]
    pub const fn is_symbolic(self) -> bool {
        self.0 & SYMBOLIC_TAG == SYMBOLIC_TAG
    }

    // ── Concrete ───────────────────────────────────────────────────

    #[inline(always)]
    pub fn from_int(n: i64) -> Self {
        debug_assert!(Self::fits(n), "concrete payload overflow: {n}");
        Self(n.cast_unsigned() << 1)
    }

    /// Encode `n`, silently dropping its top bit when it does not fit.
    #[inline(always)]
    pub const fn from_int_wrapping(n: i64) -> Self {
        Self(n.cast_unsigned() << 1)
    }

    /// The sign-extended payload.
    ///
    /// Only meaningful for concrete words; a symbolic word yields half of
    /// its node address.
    #[inline(always)]
    pub fn as_int_unchecked(self) -> i64 {
        debug_assert!(!self.is_symbolic(), "concrete payload of symbolic word");
        self.0.cast_signed() >> 1
    }

    // ── Symbolic ───────────────────────────────────────────────────

    #[inline(always)]
    pub fn encode_symbolic<T>(ptr: *const T) -> Self {
        let addr = ptr as usize as u64;
        debug_assert_eq!(addr & SYMBOLIC_TAG, 0, "node address not aligned");
        Self(addr | SYMBOLIC_TAG)
    }

    #[inline(always)]
    pub fn decode_symbolic<T>(self) -> *const T {
        debug_assert!(self.is_symbolic(), "node address of concrete word");
        (self.0 & !SYMBOLIC_TAG) as usize as *const T
    }
}

impl core::fmt::Debug for Word {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_symbolic() {
            write!(f, "Symbolic(0x{:x})", self.0 & !SYMBOLIC_TAG)
        } else {
            write!(f, "Concrete({})", self.as_int_unchecked())
        }
    }
}
