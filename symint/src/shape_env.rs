//! A shape environment: symbols bound to example values, and the guards
//! recorded whenever a symbolic value is forced to a concrete one.
//!
//! `ShapeEnv` is shared between all the nodes it creates; `ExprNode` is the
//! node family it hands out.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use parking_lot::Mutex;

use crate::{
    BinaryOp, CompareOp, GuardSite, NodeHandle, SymInt, SymIntError, SymbolicNode, Word,
    expr::{EvalError, Expr},
};

/// An expression that was forced, and the value it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub expr: Arc<Expr>,
    pub value: i64,
}

#[derive(Default)]
struct ShapeEnvImpl {
    hints: HashMap<Arc<str>, i64>,
    guards: Vec<Guard>,
}

#[derive(Clone, Default)]
pub struct ShapeEnv(Arc<Mutex<ShapeEnvImpl>>);

impl ShapeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// A size named `name` whose example value is `hint`.
    ///
    /// Sizes 0 and 1 are specialized: they come back concrete.
    pub fn create_symint(&self, name: &str, hint: i64) -> SymInt {
        if hint == 0 || hint == 1 {
            return SymInt::new(hint);
        }
        let name: Arc<str> = Arc::from(name);
        self.0.lock().hints.insert(name.clone(), hint);
        SymInt::from_node(NodeHandle::new(ExprNode::new(
            Expr::Symbol(name),
            self.clone(),
        )))
    }

    /// A size with no example value; guarding anything that uses it fails.
    pub fn create_unbacked_symint(&self, name: &str) -> SymInt {
        SymInt::from_node(NodeHandle::new(ExprNode::new(
            Expr::symbol(name),
            self.clone(),
        )))
    }

    pub fn hint(&self, name: &str) -> Option<i64> {
        self.0.lock().hints.get(name).copied()
    }

    /// Evaluate `expr` against the hints.
    ///
    /// An expression over symbols is recorded as a guard; a closed one is
    /// just computed. Arithmetic wraps like concrete arithmetic, so only a
    /// hint outside the 63-bit range can produce [`SymIntError::Overflow`].
    pub fn evaluate(&self, expr: &Arc<Expr>, site: GuardSite) -> Result<i64, SymIntError> {
        let mut inner = self.0.lock();
        let hints = &inner.hints;
        let value = expr
            .eval(&|name: &str| hints.get(name).copied())
            .map_err(|err| {
                log::debug!("guard on `{expr}` at {site} failed: {err:?}");
                match err {
                    EvalError::DivisionByZero => SymIntError::DivisionByZero,
                    EvalError::Unbound(_) => SymIntError::Unresolved {
                        expr: expr.to_string(),
                        site,
                    },
                }
            })?;
        if !Word::fits(value) {
            return Err(SymIntError::Overflow { value });
        }

        if expr.has_symbols() {
            log::debug!("guard `{expr}` == {value} at {site}");
            inner.guards.push(Guard {
                expr: expr.clone(),
                value,
            });
        }
        Ok(value)
    }

    pub fn guards(&self) -> Vec<Guard> {
        self.0.lock().guards.clone()
    }

    /// Whether every recorded guard still holds when the symbols take the
    /// values in `bindings` instead of their hints.
    pub fn check_guards(&self, bindings: &HashMap<String, i64>) -> bool {
        let inner = self.0.lock();
        let lookup = |name: &str| bindings.get(name).copied();
        inner
            .guards
            .iter()
            .all(|guard| guard.expr.eval(&lookup) == Ok(guard.value))
    }
}

impl fmt::Debug for ShapeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.lock();
        f.debug_struct("ShapeEnv")
            .field("symbols", &inner.hints.len())
            .field("guards", &inner.guards.len())
            .finish()
    }
}

/// A node of the shape-environment family: an expression tied to its
/// environment.
#[derive(Debug)]
pub struct ExprNode {
    expr: Arc<Expr>,
    env: ShapeEnv,
    constant: Option<i64>,
}

impl ExprNode {
    fn new(expr: Expr, env: ShapeEnv) -> Self {
        let constant = match &expr {
            Expr::Const(value) => Some(*value),
            _ => None,
        };
        Self {
            expr: Arc::new(expr),
            env,
            constant,
        }
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    fn operand<'a>(&self, other: &'a NodeHandle) -> Result<&'a ExprNode, SymIntError> {
        other
            .as_any()
            .downcast_ref::<ExprNode>()
            .ok_or_else(|| SymIntError::FamilyMismatch {
                lhs: self.family(),
                rhs: other.family(),
            })
    }

    fn arith(&self, op: BinaryOp, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        let other = self.operand(other)?;
        let expr = Expr::Arith {
            op,
            lhs: self.expr.clone(),
            rhs: other.expr.clone(),
        };
        Ok(NodeHandle::new(ExprNode::new(expr, self.env.clone())))
    }

    fn compare(&self, op: CompareOp, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        let other = self.operand(other)?;
        let expr = Expr::Compare {
            op,
            lhs: self.expr.clone(),
            rhs: other.expr.clone(),
        };
        Ok(NodeHandle::new(ExprNode::new(expr, self.env.clone())))
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

impl SymbolicNode for ExprNode {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn family(&self) -> &'static str {
        "shape-env"
    }

    fn wrap(&self, value: i64) -> NodeHandle {
        NodeHandle::new(ExprNode::new(Expr::Const(value), self.env.clone()))
    }

    fn constant(&self) -> Option<i64> {
        self.constant
    }

    fn add(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.arith(BinaryOp::Add, other)
    }

    fn sub(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.arith(BinaryOp::Sub, other)
    }

    fn mul(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.arith(BinaryOp::Mul, other)
    }

    fn floordiv(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.arith(BinaryOp::FloorDiv, other)
    }

    fn modulo(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.arith(BinaryOp::Mod, other)
    }

    fn eq(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.compare(CompareOp::Eq, other)
    }

    fn lt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.compare(CompareOp::Lt, other)
    }

    fn le(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.compare(CompareOp::Le, other)
    }

    fn gt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.compare(CompareOp::Gt, other)
    }

    fn ge(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.compare(CompareOp::Ge, other)
    }

    fn bool_(&self) -> Result<bool, SymIntError> {
        Ok(self.env.evaluate(&self.expr, GuardSite::UNKNOWN)? != 0)
    }

    fn guard_int(&self, site: GuardSite) -> Result<i64, SymIntError> {
        self.env.evaluate(&self.expr, site)
    }
}
