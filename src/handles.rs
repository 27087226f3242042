//! handles
//!
//! Token-to-object registry bridging native callback contexts to Rust
//! objects.
//!
//! Native callbacks receive a `void *param`; passing Rust pointers through
//! it directly would tie object lifetime to whatever the native side does
//! with the parameter. Instead the crate passes an integer token and keeps
//! the object here. Lookups fail cleanly after [`HandleList::untrack`] or a
//! wholesale [`HandleList::clear`] at shutdown, so a stale native context
//! can never reach freed managed state.
//!
//! Tokens are never reused within one lifecycle: the counter only moves
//! forward, keeping the mapping injective.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// What the registry stores: a type-erased, shareable object.
pub type Object = Arc<dyn Any + Send + Sync>;

/// An injective token → object registry.
pub struct HandleList {
    inner: Mutex<Inner>,
}

struct Inner {
    next: usize,
    handles: BTreeMap<usize, Object>,
}

impl HandleList {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                // Token 0 is reserved so a NULL param never aliases a live
                // handle.
                next: 1,
                handles: BTreeMap::new(),
            }),
        }
    }

    /// Store `object` and return the token that names it.
    pub fn track(&self, object: Object) -> usize {
        let mut inner = self.inner.lock().expect("handle registry poisoned");
        let token = inner.next;
        inner.next += 1;
        inner.handles.insert(token, object);
        token
    }

    /// Fetch the object behind `token`, if it is still tracked.
    pub fn lookup(&self, token: usize) -> Option<Object> {
        let inner = self.inner.lock().expect("handle registry poisoned");
        inner.handles.get(&token).cloned()
    }

    /// Drop the object behind `token`. Unknown tokens are a no-op.
    pub fn untrack(&self, token: usize) -> Option<Object> {
        let mut inner = self.inner.lock().expect("handle registry poisoned");
        inner.handles.remove(&token)
    }

    /// Invalidate every token at once. Used at shutdown.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("handle registry poisoned");
        inner.handles.clear();
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("handle registry poisoned");
        inner.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_distinct_and_injective() {
        let list = HandleList::new();
        let a = list.track(Arc::new(1u32));
        let b = list.track(Arc::new(2u32));
        assert_ne!(a, b);
        let got_a = list.lookup(a).unwrap();
        let got_b = list.lookup(b).unwrap();
        assert_eq!(*got_a.downcast_ref::<u32>().unwrap(), 1);
        assert_eq!(*got_b.downcast_ref::<u32>().unwrap(), 2);
    }

    #[test]
    fn untracked_tokens_stop_resolving() {
        let list = HandleList::new();
        let token = list.track(Arc::new("payload".to_string()));
        assert!(list.lookup(token).is_some());
        list.untrack(token);
        assert!(list.lookup(token).is_none());
    }

    #[test]
    fn tokens_are_not_reused_after_untrack() {
        let list = HandleList::new();
        let a = list.track(Arc::new(1u32));
        list.untrack(a);
        let b = list.track(Arc::new(2u32));
        assert_ne!(a, b);
    }

    #[test]
    fn clear_invalidates_everything() {
        let list = HandleList::new();
        let tokens: Vec<usize> = (0..5).map(|i| list.track(Arc::new(i))).collect();
        assert_eq!(list.len(), 5);
        list.clear();
        assert!(list.is_empty());
        for token in tokens {
            assert!(list.lookup(token).is_none());
        }
    }

    #[test]
    fn zero_is_never_a_live_token() {
        let list = HandleList::new();
        assert!(list.lookup(0).is_none());
        let token = list.track(Arc::new(()));
        assert_ne!(token, 0);
    }
}
