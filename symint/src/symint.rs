use std::{
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{NodeHandle, SymIntError, Word};

/// An integer that is either concrete or a reference to a symbolic node.
///
/// The concrete case is a plain 63-bit integer packed in one word: creating,
/// copying and combining concrete values never allocates. A symbolic value
/// owns one count of its node; cloning adds a count and dropping releases it.
///
/// Combining a concrete value with a symbolic one promotes the concrete
/// operand in place, so the word is atomic: a shape shared between threads
/// can be read, cloned and combined from all of them. Concurrent promotions
/// of one value settle on a single node.
pub struct SymInt {
    word: AtomicU64,
    _owns: PhantomData<NodeHandle>,
}

#[cfg(not(feature = "symbolic"))]
#[cold]
#[track_caller]
pub(crate) fn unavailable() -> ! {
    panic!("symbolic integers are not available in this build")
}

impl SymInt {
    pub const MIN: i64 = Word::INT_MIN;
    pub const MAX: i64 = Word::INT_MAX;

    /// A concrete value.
    ///
    /// # Panics
    ///
    /// If `value` does not fit in 63 bits.
    #[inline]
    #[track_caller]
    pub fn new(value: i64) -> Self {
        assert!(Word::fits(value), "{value} does not fit in a 63-bit integer");
        Self::from_word(Word::from_int(value))
    }

    pub fn try_new(value: i64) -> Result<Self, SymIntError> {
        if !Word::fits(value) {
            return Err(SymIntError::Overflow { value });
        }
        Ok(Self::from_word(Word::from_int(value)))
    }

    #[inline(always)]
    pub(crate) fn from_word(word: Word) -> Self {
        Self {
            word: AtomicU64::new(word.raw()),
            _owns: PhantomData,
        }
    }

    #[inline(always)]
    pub(crate) fn word(&self) -> Word {
        Word::from_raw(self.word.load(Ordering::Acquire))
    }

    #[cfg(feature = "symbolic")]
    #[inline(always)]
    pub fn is_symbolic(&self) -> bool {
        self.word().is_symbolic()
    }

    #[cfg(not(feature = "symbolic"))]
    #[inline(always)]
    pub const fn is_symbolic(&self) -> bool {
        false
    }

    /// The concrete payload, or `None` for a symbolic value.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        let word = self.word();
        if word.is_symbolic() {
            return None;
        }
        Some(word.as_int_unchecked())
    }

    /// The concrete payload; the caller checked [`SymInt::is_symbolic`].
    #[inline(always)]
    pub fn as_int_unchecked(&self) -> i64 {
        debug_assert!(!self.is_symbolic(), "as_int_unchecked on symbolic value");
        self.word().as_int_unchecked()
    }

    /// A value known without guarding: the payload, or the node's constant.
    pub fn constant(&self) -> Option<i64> {
        if self.is_symbolic() {
            return self.to_node().constant();
        }
        Some(self.as_int_unchecked())
    }

    // ── Node bridge ────────────────────────────────────────────────

    /// A new handle sharing this value's node.
    ///
    /// # Panics
    ///
    /// If the value is concrete.
    #[cfg(feature = "symbolic")]
    #[track_caller]
    pub fn to_node(&self) -> NodeHandle {
        let word = self.word();
        assert!(
            word.is_symbolic(),
            "to_node on concrete value {}",
            word.as_int_unchecked()
        );
        // SAFETY: a symbolic word owns a count on a live cell
        unsafe { NodeHandle::clone_from_raw(word.decode_symbolic()) }
    }

    #[cfg(not(feature = "symbolic"))]
    #[track_caller]
    pub fn to_node(&self) -> NodeHandle {
        unavailable()
    }

    /// Adopt `node`; its count moves into the returned value.
    #[cfg(feature = "symbolic")]
    pub fn from_node(node: NodeHandle) -> Self {
        Self::from_word(Word::encode_symbolic(node.into_raw()))
    }

    #[cfg(not(feature = "symbolic"))]
    #[track_caller]
    pub fn from_node(node: NodeHandle) -> Self {
        drop(node);
        unavailable()
    }

    /// Turn the concrete value `seen` into a reference to `node` in place,
    /// returning the node this value refers to afterwards.
    ///
    /// If another thread promoted the value first, `node` is released and
    /// the winner's node is returned.
    #[cfg(feature = "symbolic")]
    pub(crate) fn promote(&self, seen: Word, node: NodeHandle) -> NodeHandle {
        debug_assert!(!seen.is_symbolic(), "promoting a symbolic value");
        let raw = node.clone().into_raw();
        let next = Word::encode_symbolic(raw);
        match self
            .word
            .compare_exchange(seen.raw(), next.raw(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => node,
            Err(current) => {
                // SAFETY: raw came from into_raw above and was never published
                drop(unsafe { NodeHandle::from_raw(raw) });
                let current = Word::from_raw(current);
                debug_assert!(current.is_symbolic(), "concrete value changed under promotion");
                // SAFETY: a symbolic word owns a count on a live cell
                unsafe { NodeHandle::clone_from_raw(current.decode_symbolic()) }
            }
        }
    }
}

impl Clone for SymInt {
    #[inline]
    fn clone(&self) -> Self {
        let word = self.word();
        #[cfg(feature = "symbolic")]
        if word.is_symbolic() {
            // SAFETY: a symbolic word owns a count on a live cell
            unsafe { NodeHandle::increment_raw(word.decode_symbolic()) };
        }
        Self::from_word(word)
    }
}

impl Drop for SymInt {
    #[inline]
    fn drop(&mut self) {
        #[cfg(feature = "symbolic")]
        {
            let word = Word::from_raw(*self.word.get_mut());
            if word.is_symbolic() {
                // SAFETY: this word's count is released exactly once, here
                unsafe { NodeHandle::decrement_raw(word.decode_symbolic()) };
            }
        }
    }
}

impl Default for SymInt {
    fn default() -> Self {
        Self::from_word(Word::from_int(0))
    }
}

impl From<i64> for SymInt {
    #[track_caller]
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<NodeHandle> for SymInt {
    fn from(node: NodeHandle) -> Self {
        Self::from_node(node)
    }
}

impl fmt::Display for SymInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_symbolic() {
            return fmt::Display::fmt(&self.to_node(), f);
        }
        fmt::Display::fmt(&self.as_int_unchecked(), f)
    }
}

impl fmt::Debug for SymInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_symbolic() {
            return write!(f, "SymInt(sym {})", self.to_node());
        }
        write!(f, "SymInt({})", self.as_int_unchecked())
    }
}
