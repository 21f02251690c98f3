use std::{any::Any, fmt, ops::Deref, sync::Arc};

use crate::{GuardSite, SymIntError};

/// The operation set a symbolic node family provides.
///
/// Binary operations receive the other operand as a handle of the same
/// family; implementations downcast through [`SymbolicNode::as_any`] and
/// report [`SymIntError::FamilyMismatch`] when that fails.
pub trait SymbolicNode: Any + Send + Sync + fmt::Debug + fmt::Display {
    fn as_any(&self) -> &dyn Any;

    /// Name of the node family, used in diagnostics.
    fn family(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Build a constant node of this family.
    fn wrap(&self, value: i64) -> NodeHandle;

    /// The constant this node stands for, if it is known without guarding.
    fn constant(&self) -> Option<i64> {
        None
    }

    fn add(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn sub(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn mul(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn floordiv(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn modulo(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;

    fn eq(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn lt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn le(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn gt(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;
    fn ge(&self, other: &NodeHandle) -> Result<NodeHandle, SymIntError>;

    /// Force a boolean-valued node to a concrete boolean.
    fn bool_(&self) -> Result<bool, SymIntError>;

    /// Force this node to a concrete integer, citing `site` on failure.
    fn guard_int(&self, site: GuardSite) -> Result<i64, SymIntError>;
}

// One allocation holds the fat trait object so the cell address is thin and
// fits in a tagged word.
struct NodeCell {
    node: Box<dyn SymbolicNode>,
}

// The low bit of a cell address carries the symbolic tag.
const _: () = assert!(std::mem::align_of::<NodeCell>() >= 2);

/// Owned, atomically reference-counted handle to a node.
///
/// Cloning shares the node. Committing a handle into a
/// [`SymInt`](crate::SymInt) consumes it, moving its count into the tagged
/// word.
#[derive(Clone)]
pub struct NodeHandle(Arc<NodeCell>);

impl NodeHandle {
    pub fn new<N: SymbolicNode>(node: N) -> Self {
        Self(Arc::new(NodeCell {
            node: Box::new(node),
        }))
    }

    #[inline]
    pub fn node(&self) -> &dyn SymbolicNode {
        &*self.0.node
    }

    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn ptr_eq(&self, other: &NodeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn same_family(&self, other: &NodeHandle) -> bool {
        self.node().as_any().type_id() == other.node().as_any().type_id()
    }
}

// Raw bridge used by the tagged word.
#[cfg_attr(not(feature = "symbolic"), allow(dead_code))]
impl NodeHandle {
    /// Give up this handle's count and return the cell address.
    #[inline]
    pub(crate) fn into_raw(self) -> *const () {
        Arc::into_raw(self.0).cast()
    }

    /// Take over one count from a raw cell address.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`NodeHandle::into_raw`] and its count must not
    /// have been reclaimed already.
    #[inline]
    pub(crate) unsafe fn from_raw(ptr: *const ()) -> Self {
        // SAFETY: by contract ptr is a live Arc<NodeCell> allocation
        Self(unsafe { Arc::from_raw(ptr.cast::<NodeCell>()) })
    }

    /// A new handle sharing the node behind `ptr`, leaving its count alone.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`NodeHandle::into_raw`] and still own a count.
    #[inline]
    pub(crate) unsafe fn clone_from_raw(ptr: *const ()) -> Self {
        // SAFETY: by contract the allocation is live while we bump it
        unsafe {
            Arc::increment_strong_count(ptr.cast::<NodeCell>());
            Self::from_raw(ptr)
        }
    }

    /// Add one count to the node behind `ptr`.
    ///
    /// # Safety
    ///
    /// Same as [`NodeHandle::clone_from_raw`].
    #[inline]
    pub(crate) unsafe fn increment_raw(ptr: *const ()) {
        // SAFETY: by contract the allocation is live
        unsafe { Arc::increment_strong_count(ptr.cast::<NodeCell>()) }
    }

    /// Release one count of the node behind `ptr`.
    ///
    /// # Safety
    ///
    /// Same as [`NodeHandle::from_raw`]; the count is gone afterwards.
    #[inline]
    pub(crate) unsafe fn decrement_raw(ptr: *const ()) {
        // SAFETY: by contract ptr owns the count we release
        unsafe { Arc::decrement_strong_count(ptr.cast::<NodeCell>()) }
    }
}

impl Deref for NodeHandle {
    type Target = dyn SymbolicNode;

    fn deref(&self) -> &Self::Target {
        self.node()
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHandle").field(&self.0.node).finish()
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.node(), f)
    }
}
