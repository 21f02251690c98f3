//! Node families for tests. Every node reports to a shared [`Counters`] so
//! tests can see allocations, live nodes and guard traffic.

// The disabled build only exercises construction and drop.
#![cfg_attr(not(feature = "symbolic"), allow(dead_code))]

use std::{
    any::Any,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{GuardSite, NodeHandle, SymIntError, SymbolicNode, floor_div, floor_mod};

#[derive(Default)]
pub struct Counters {
    created: AtomicUsize,
    live: AtomicUsize,
    bool_calls: AtomicUsize,
    guard_calls: AtomicUsize,
    last_site: Mutex<Option<GuardSite>>,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn bool_calls(&self) -> usize {
        self.bool_calls.load(Ordering::SeqCst)
    }

    pub fn guard_calls(&self) -> usize {
        self.guard_calls.load(Ordering::SeqCst)
    }

    pub fn last_site(&self) -> Option<GuardSite> {
        *self.last_site.lock()
    }
}

pub struct Primary;
pub struct Alt;

/// A node with a printable label and, when resolvable, a value.
pub struct Node<F> {
    label: String,
    value: Option<i64>,
    constant: Option<i64>,
    counters: Arc<Counters>,
    _family: PhantomData<fn() -> F>,
}

pub type CountingNode = Node<Primary>;
pub type AltNode = Node<Alt>;

impl<F: 'static> Node<F> {
    fn new(
        label: String,
        value: Option<i64>,
        constant: Option<i64>,
        counters: &Arc<Counters>,
    ) -> Self {
        counters.created.fetch_add(1, Ordering::SeqCst);
        counters.live.fetch_add(1, Ordering::SeqCst);
        Self {
            label,
            value,
            constant,
            counters: counters.clone(),
            _family: PhantomData,
        }
    }

    /// An unresolved symbol: guarding it fails.
    pub fn symbol(name: &str, counters: &Arc<Counters>) -> Self {
        Self::new(name.to_owned(), None, None, counters)
    }

    /// A symbol that resolves to `value` when guarded.
    pub fn bound(name: &str, value: i64, counters: &Arc<Counters>) -> Self {
        Self::new(name.to_owned(), Some(value), None, counters)
    }

    fn derive(
        &self,
        op: &str,
        other: &NodeHandle,
        f: fn(i64, i64) -> Option<i64>,
    ) -> Result<NodeHandle, SymIntError> {
        let Some(other) = other.as_any().downcast_ref::<Node<F>>() else {
            return Err(SymIntError::FamilyMismatch {
                lhs: self.family(),
                rhs: other.family(),
            });
        };
        let label = format!("({} {op} {})", self.label, other.label);
        let combine = |a: Option<i64>, b: Option<i64>| f(a?, b?);
        let value = combine(self.value, other.value);
        let constant = combine(self.constant, other.constant);
        Ok(NodeHandle::new(Node::<F>::new(
            label,
            value,
            constant,
            &self.counters,
        )))
    }
}

impl<F> Drop for Node<F> {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<F> fmt::Debug for Node<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("label", &self.label)
            .field("value", &self.value)
            .finish()
    }
}

impl<F> fmt::Display for Node<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<F: 'static> SymbolicNode for Node<F> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn wrap(&self, value: i64) -> NodeHandle {
        NodeHandle::new(Node::<F>::new(
            value.to_string(),
            Some(value),
            Some(value),
            &self.counters,
        ))
    }

    fn constant(&self) -> Option<i64> {
        self.constant
    }

    fn add(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("+", other, |a, b| Some(a.wrapping_add(b)))
    }

    fn sub(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("-", other, |a, b| Some(a.wrapping_sub(b)))
    }

    fn mul(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("*", other, |a, b| Some(a.wrapping_mul(b)))
    }

    fn floordiv(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("//", other, |a, b| (b != 0).then(|| floor_div(a, b)))
    }

    fn modulo(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("%", other, |a, b| (b != 0).then(|| floor_mod(a, b)))
    }

    fn eq(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("==", other, |a, b| Some((a == b) as i64))
    }

    fn lt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("<", other, |a, b| Some((a < b) as i64))
    }

    fn le(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive("<=", other, |a, b| Some((a <= b) as i64))
    }

    fn gt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive(">", other, |a, b| Some((a > b) as i64))
    }

    fn ge(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError> {
        self.derive(">=", other, |a, b| Some((a >= b) as i64))
    }

    fn bool_(&self) -> Result<bool, SymIntError> {
        self.counters.bool_calls.fetch_add(1, Ordering::SeqCst);
        match self.value {
            Some(value) => Ok(value != 0),
            None => Err(SymIntError::Unresolved {
                expr: self.label.clone(),
                site: GuardSite::UNKNOWN,
            }),
        }
    }

    fn guard_int(&self, site: GuardSite) -> Result<i64, SymIntError> {
        self.counters.guard_calls.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_site.lock() = Some(site);
        self.value.ok_or_else(|| SymIntError::Unresolved {
            expr: self.label.clone(),
            site,
        })
    }
}
