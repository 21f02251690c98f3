//! Arithmetic and comparison on [`SymInt`].
//!
//! Every operation first checks whether both operands are concrete and, if
//! so, works on the packed words directly. Otherwise the operands are
//! normalized to nodes of one family and the node operation is dispatched.
//!
//! Concrete arithmetic wraps at the 63-bit payload width. Division and
//! modulo round toward negative infinity, matching the node `floordiv` and
//! `mod` operations.

use std::{
    cmp::Ordering,
    ops::{Add, Div, Mul, MulAssign, Rem, Sub},
};

use crate::{NodeHandle, SymInt, SymIntError, SymbolicNode, Word, error::fatal, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Quotient rounded toward negative infinity. `b` must not be zero.
#[inline]
pub fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder with the sign of the divisor. `b` must not be zero.
#[inline]
pub fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }

    /// Apply to plain integers with the same semantics as the word path:
    /// the result wraps at the 63-bit payload width.
    pub fn apply(self, a: i64, b: i64) -> Result<i64, SymIntError> {
        let res = match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => {
                return Err(SymIntError::DivisionByZero);
            }
            BinaryOp::FloorDiv => floor_div(a, b),
            BinaryOp::Mod => floor_mod(a, b),
        };
        Ok(Word::from_int_wrapping(res).as_int_unchecked())
    }

    // add and sub work on the tagged words since the tag bits are zero;
    // mul only untags one side.
    #[inline(always)]
    fn concrete(self, a: Word, b: Word) -> Result<Word, SymIntError> {
        let word = match self {
            BinaryOp::Add => Word::from_raw(a.raw().wrapping_add(b.raw())),
            BinaryOp::Sub => Word::from_raw(a.raw().wrapping_sub(b.raw())),
            BinaryOp::Mul => {
                let res = a.as_int_unchecked().wrapping_mul(b.raw().cast_signed());
                Word::from_raw(res.cast_unsigned())
            }
            BinaryOp::FloorDiv | BinaryOp::Mod => {
                Word::from_int(self.apply(a.as_int_unchecked(), b.as_int_unchecked())?)
            }
        };
        Ok(word)
    }

    fn dispatch(self, a: &NodeHandle, b: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        log::trace!("dispatching {a} {} {b}", self.symbol());
        let a: &dyn SymbolicNode = a.node();
        match self {
            BinaryOp::Add => SymbolicNode::add(a, b),
            BinaryOp::Sub => SymbolicNode::sub(a, b),
            BinaryOp::Mul => SymbolicNode::mul(a, b),
            BinaryOp::FloorDiv => a.floordiv(b),
            BinaryOp::Mod => a.modulo(b),
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn apply(self, a: i64, b: i64) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }

    // shifting left by one keeps the signed order of the payloads
    #[inline(always)]
    fn concrete(self, a: Word, b: Word) -> bool {
        self.apply(a.raw().cast_signed(), b.raw().cast_signed())
    }

    fn dispatch(self, a: &NodeHandle, b: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        log::trace!("dispatching {a} {} {b}", self.symbol());
        let a: &dyn SymbolicNode = a.node();
        match self {
            CompareOp::Eq => SymbolicNode::eq(a, b),
            CompareOp::Lt => SymbolicNode::lt(a, b),
            CompareOp::Le => SymbolicNode::le(a, b),
            CompareOp::Gt => SymbolicNode::gt(a, b),
            CompareOp::Ge => SymbolicNode::ge(a, b),
        }
    }
}

impl SymInt {
    /// `self op rhs`, reporting division by zero and family mismatches.
    ///
    /// A concrete operand paired with a symbolic one is promoted in place.
    pub fn try_apply(&self, op: BinaryOp, rhs: &SymInt) -> Result<SymInt, SymIntError> {
        if !self.is_symbolic() && !rhs.is_symbolic() {
            return op.concrete(self.word(), rhs.word()).map(SymInt::from_word);
        }
        let [a, b] = normalize(self, rhs)?;
        let result = op.dispatch(&a, &b)?;
        Ok(SymInt::from_node(result))
    }

    /// `self op rhs` as a plain boolean; symbolic comparisons are forced
    /// through the node's `bool_`.
    pub fn try_compare(&self, op: CompareOp, rhs: &SymInt) -> Result<bool, SymIntError> {
        if !self.is_symbolic() && !rhs.is_symbolic() {
            return Ok(op.concrete(self.word(), rhs.word()));
        }
        let [a, b] = normalize(self, rhs)?;
        op.dispatch(&a, &b)?.bool_()
    }
}

// ── Operators ──────────────────────────────────────────────────────

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<&SymInt> for &SymInt {
            type Output = SymInt;

            #[track_caller]
            fn $method(self, rhs: &SymInt) -> SymInt {
                fatal(self.try_apply($op, rhs))
            }
        }

        impl $trait<SymInt> for SymInt {
            type Output = SymInt;

            #[track_caller]
            fn $method(self, rhs: SymInt) -> SymInt {
                fatal(self.try_apply($op, &rhs))
            }
        }

        impl $trait<&SymInt> for SymInt {
            type Output = SymInt;

            #[track_caller]
            fn $method(self, rhs: &SymInt) -> SymInt {
                fatal(self.try_apply($op, rhs))
            }
        }
    };
}

binary_operator!(Add, add, BinaryOp::Add);
binary_operator!(Sub, sub, BinaryOp::Sub);
binary_operator!(Mul, mul, BinaryOp::Mul);
binary_operator!(Div, div, BinaryOp::FloorDiv);
binary_operator!(Rem, rem, BinaryOp::Mod);

impl Mul<i64> for &SymInt {
    type Output = SymInt;

    #[track_caller]
    fn mul(self, rhs: i64) -> SymInt {
        self * &SymInt::new(rhs)
    }
}

impl Mul<i64> for SymInt {
    type Output = SymInt;

    #[track_caller]
    fn mul(self, rhs: i64) -> SymInt {
        &self * &SymInt::new(rhs)
    }
}

impl MulAssign<&SymInt> for SymInt {
    #[track_caller]
    fn mul_assign(&mut self, rhs: &SymInt) {
        *self = &*self * rhs;
    }
}

impl MulAssign<SymInt> for SymInt {
    #[track_caller]
    fn mul_assign(&mut self, rhs: SymInt) {
        *self = &*self * &rhs;
    }
}

// `ne` is the provided negation of `eq`.
impl PartialEq for SymInt {
    #[track_caller]
    fn eq(&self, other: &SymInt) -> bool {
        fatal(self.try_compare(CompareOp::Eq, other))
    }
}

impl PartialOrd for SymInt {
    #[track_caller]
    fn partial_cmp(&self, other: &SymInt) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self < other {
            Some(Ordering::Less)
        } else {
            Some(Ordering::Greater)
        }
    }

    #[track_caller]
    fn lt(&self, other: &SymInt) -> bool {
        fatal(self.try_compare(CompareOp::Lt, other))
    }

    #[track_caller]
    fn le(&self, other: &SymInt) -> bool {
        fatal(self.try_compare(CompareOp::Le, other))
    }

    #[track_caller]
    fn gt(&self, other: &SymInt) -> bool {
        fatal(self.try_compare(CompareOp::Gt, other))
    }

    #[track_caller]
    fn ge(&self, other: &SymInt) -> bool {
        fatal(self.try_compare(CompareOp::Ge, other))
    }
}

impl PartialEq<i64> for SymInt {
    #[track_caller]
    fn eq(&self, other: &i64) -> bool {
        *self == SymInt::new(*other)
    }
}

impl PartialOrd<i64> for SymInt {
    #[track_caller]
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.partial_cmp(&SymInt::new(*other))
    }

    #[track_caller]
    fn lt(&self, other: &i64) -> bool {
        *self < SymInt::new(*other)
    }

    #[track_caller]
    fn le(&self, other: &i64) -> bool {
        *self <= SymInt::new(*other)
    }

    #[track_caller]
    fn gt(&self, other: &i64) -> bool {
        *self > SymInt::new(*other)
    }

    #[track_caller]
    fn ge(&self, other: &i64) -> bool {
        *self >= SymInt::new(*other)
    }
}
