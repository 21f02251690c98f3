use std::{
    fmt, mem,
    sync::{Arc, LazyLock},
};

use crate::{BinaryOp, CompareOp};

/// An integer expression over named symbols.
///
/// Children are shared so combining two nodes never copies their trees.
/// Comparisons evaluate to `1` or `0`.
///
/// Expressions grow one operation at a time and can get arbitrarily deep,
/// so every walk over a tree (including drop) uses an explicit stack.
#[derive(Clone)]
pub enum Expr {
    Const(i64),
    Symbol(Arc<str>),
    Arith {
        op: BinaryOp,
        lhs: Arc<Expr>,
        rhs: Arc<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Arc<Expr>,
        rhs: Arc<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    Unbound(Arc<str>),
    DivisionByZero,
}

// Stands in for a child detached during drop.
static DETACHED: LazyLock<Arc<Expr>> = LazyLock::new(|| Arc::new(Expr::Const(0)));

enum Step<'a> {
    Visit(&'a Expr),
    Arith(BinaryOp),
    Compare(CompareOp),
}

enum Piece<'a> {
    Expr(&'a Expr),
    Text(&'static str),
}

impl Expr {
    pub fn symbol(name: &str) -> Self {
        Expr::Symbol(Arc::from(name))
    }

    fn children(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Arith { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                Some((lhs.as_ref(), rhs.as_ref()))
            }
            Expr::Const(_) | Expr::Symbol(_) => None,
        }
    }

    pub fn has_symbols(&self) -> bool {
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Expr::Symbol(_) => return true,
                Expr::Const(_) => {}
                _ => {
                    if let Some((lhs, rhs)) = expr.children() {
                        pending.extend([rhs, lhs]);
                    }
                }
            }
        }
        false
    }

    /// Evaluate with `lookup` supplying symbol values.
    ///
    /// Operands are evaluated left to right; the first failure wins.
    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<i64>) -> Result<i64, EvalError> {
        let mut steps = vec![Step::Visit(self)];
        let mut values: Vec<i64> = Vec::new();

        while let Some(step) = steps.pop() {
            let value = match step {
                Step::Visit(Expr::Const(value)) => *value,
                Step::Visit(Expr::Symbol(name)) => {
                    lookup(name).ok_or_else(|| EvalError::Unbound(name.clone()))?
                }
                Step::Visit(Expr::Arith { op, lhs, rhs }) => {
                    steps.extend([Step::Arith(*op), Step::Visit(rhs), Step::Visit(lhs)]);
                    continue;
                }
                Step::Visit(Expr::Compare { op, lhs, rhs }) => {
                    steps.extend([Step::Compare(*op), Step::Visit(rhs), Step::Visit(lhs)]);
                    continue;
                }
                Step::Arith(op) => {
                    let (a, b) = pop_operands(&mut values);
                    op.apply(a, b).map_err(|_| EvalError::DivisionByZero)?
                }
                Step::Compare(op) => {
                    let (a, b) = pop_operands(&mut values);
                    op.apply(a, b) as i64
                }
            };
            values.push(value);
        }

        match values.as_slice() {
            [value] => Ok(*value),
            _ => unreachable!("evaluation leaves exactly one value"),
        }
    }

    // Move composite children out so their drop happens on our worklist.
    fn detach_children(&mut self, pending: &mut Vec<Arc<Expr>>) {
        if let Expr::Arith { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } = self {
            for child in [lhs, rhs] {
                if child.children().is_some() {
                    pending.push(mem::replace(child, DETACHED.clone()));
                }
            }
        }
    }
}

fn pop_operands(values: &mut Vec<i64>) -> (i64, i64) {
    match (values.pop(), values.pop()) {
        (Some(b), Some(a)) => (a, b),
        _ => unreachable!("operands are evaluated before their operator"),
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Some(mut expr) = Arc::into_inner(child) {
                expr.detach_children(&mut pending);
            }
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if std::ptr::eq(a, b) {
                continue;
            }
            let same_node = match (a, b) {
                (Expr::Const(x), Expr::Const(y)) => x == y,
                (Expr::Symbol(x), Expr::Symbol(y)) => x == y,
                (Expr::Arith { op: x, .. }, Expr::Arith { op: y, .. }) => x == y,
                (Expr::Compare { op: x, .. }, Expr::Compare { op: y, .. }) => x == y,
                _ => false,
            };
            if !same_node {
                return false;
            }
            if let (Some((al, ar)), Some((bl, br))) = (a.children(), b.children()) {
                pending.extend([(ar, br), (al, bl)]);
            }
        }
        true
    }
}

impl Eq for Expr {}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Expr(self)];
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Expr(Expr::Const(value)) => write!(f, "{value}")?,
                Piece::Expr(Expr::Symbol(name)) => f.write_str(name)?,
                Piece::Expr(Expr::Arith { op, lhs, rhs }) => {
                    push_infix(&mut pending, lhs, op.symbol(), rhs)
                }
                Piece::Expr(Expr::Compare { op, lhs, rhs }) => {
                    push_infix(&mut pending, lhs, op.symbol(), rhs)
                }
            }
        }
        Ok(())
    }
}

fn push_infix<'a>(pending: &mut Vec<Piece<'a>>, lhs: &'a Expr, op: &'static str, rhs: &'a Expr) {
    pending.extend([
        Piece::Text(")"),
        Piece::Expr(rhs),
        Piece::Text(" "),
        Piece::Text(op),
        Piece::Text(" "),
        Piece::Expr(lhs),
        Piece::Text("("),
    ]);
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn arith(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Arith {
            op,
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
        }
    }

    #[test]
    fn display_is_parenthesized_infix() {
        let e = arith(
            BinaryOp::Mul,
            arith(BinaryOp::Add, Expr::symbol("s0"), Expr::Const(3)),
            Expr::Const(-2),
        );
        assert_eq!(e.to_string(), "((s0 + 3) * -2)");

        let c = Expr::Compare {
            op: CompareOp::Le,
            lhs: Arc::new(Expr::symbol("s1")),
            rhs: Arc::new(Expr::Const(8)),
        };
        assert_eq!(c.to_string(), "(s1 <= 8)");
    }

    #[test]
    fn eval_substitutes_symbols() {
        let hints = HashMap::from([("s0", -7i64), ("s1", 2)]);
        let lookup = |name: &str| hints.get(name).copied();
        let div = arith(BinaryOp::FloorDiv, Expr::symbol("s0"), Expr::symbol("s1"));
        let rem = arith(BinaryOp::Mod, Expr::symbol("s0"), Expr::symbol("s1"));
        assert_eq!(div.eval(&lookup), Ok(-4));
        assert_eq!(rem.eval(&lookup), Ok(1));

        let gt = Expr::Compare {
            op: CompareOp::Gt,
            lhs: Arc::new(Expr::symbol("s1")),
            rhs: Arc::new(Expr::symbol("s0")),
        };
        assert_eq!(gt.eval(&lookup), Ok(1));
    }

    #[test]
    fn eval_errors() {
        let lookup = |_: &str| -> Option<i64> { None };
        let unbound = arith(BinaryOp::Add, Expr::symbol("u0"), Expr::Const(1));
        assert_eq!(unbound.eval(&lookup), Err(EvalError::Unbound(Arc::from("u0"))));

        let by_zero = arith(BinaryOp::Mod, Expr::Const(4), Expr::Const(0));
        assert_eq!(by_zero.eval(&lookup), Err(EvalError::DivisionByZero));
    }

    fn chain(depth: usize) -> Expr {
        let mut expr = Expr::symbol("s0");
        for _ in 0..depth {
            expr = arith(BinaryOp::Add, expr, Expr::Const(1));
        }
        expr
    }

    #[test]
    fn deep_chains_are_handled_without_recursion() {
        let deep = chain(200_000);
        let same = chain(200_000);
        assert_eq!(deep, same);
        assert_ne!(deep, chain(199_999));
        assert!(deep.has_symbols());

        let lookup = |name: &str| (name == "s0").then_some(1i64);
        assert_eq!(deep.eval(&lookup), Ok(200_001));

        let text = deep.to_string();
        assert!(text.trim_start_matches('(').starts_with("s0 + 1) + 1)"));
        assert!(text.ends_with(" + 1)"));
        assert_eq!(text.matches('(').count(), 200_000);
        drop((deep, same));
    }

    #[test]
    fn shared_children_survive_parent_drop() {
        let inner = Arc::new(chain(3));
        let outer = Expr::Arith {
            op: BinaryOp::Mul,
            lhs: inner.clone(),
            rhs: Arc::new(Expr::Const(2)),
        };
        drop(outer);
        assert_eq!(inner.to_string(), "(((s0 + 1) + 1) + 1)");
        assert_eq!(Arc::strong_count(&inner), 1);
    }

    #[test]
    fn symbol_detection() {
        assert!(!arith(BinaryOp::Sub, Expr::Const(4), Expr::Const(1)).has_symbols());
        assert!(arith(BinaryOp::Sub, Expr::Const(4), Expr::symbol("s0")).has_symbols());
    }
}
