//! The value cell: a container holding at most one dynamically-typed payload.
//!
//! This mirrors `DSPatch::Signal` (`examples/original_source/include/dspatch/Signal.h`):
//! a cell remembers the type of the last payload it held even after it is
//! cleared, so that handing it a same-typed value again reuses the existing
//! allocation instead of deallocating and reallocating. `dbsp`'s `Stream`
//! (`circuit_builder.rs`) uses the analogous `UnsafeCell`-based "exactly one
//! writer, exclusive access enforced by the scheduler" idiom for its typed
//! per-tick value; here the payload is additionally type-erased, so the
//! same-type fast path needs a vtable-dispatched assignment rather than a
//! plain overwrite.

use std::any::{Any, TypeId};

/// Object-safe companion to `Any` that also knows how to clone and
/// assign itself through a trait object, so that [`Value`] can implement
/// the "copy into a non-final fan-out consumer" path without knowing the
/// concrete payload type at the call site.
///
/// Blanket-implemented for any `'static + Send + Clone` type, matching the
/// implicit `CopyConstructible` bound the original `Signal` template placed
/// on `ValueType`.
trait AnyClone: Any + Send {
    fn clone_boxed(&self) -> Box<dyn AnyClone>;
    fn assign_from(&mut self, other: &dyn AnyClone);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Clone> AnyClone for T {
    fn clone_boxed(&self) -> Box<dyn AnyClone> {
        Box::new(self.clone())
    }

    fn assign_from(&mut self, other: &dyn AnyClone) {
        if let Some(src) = other.as_any().downcast_ref::<T>() {
            self.clone_from(src);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A container holding at most one payload of a dynamically-typed,
/// `Send + Clone` value.
///
/// `has_value` tracks presence independently of whether storage is
/// allocated: `clear` drops only the "has a value" bit, leaving the boxed
/// payload (and its type tag) in place so the next same-typed `set` can
/// overwrite it without allocating. This is the single most important
/// performance contract in the engine (see module docs and spec §4.1).
#[derive(Default)]
pub struct Value {
    has_value: bool,
    type_id: Option<TypeId>,
    payload: Option<Box<dyn AnyClone>>,
}

impl Value {
    /// Create a new, empty cell with no type hint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cell currently holds a value.
    pub fn is_empty(&self) -> bool {
        !self.has_value
    }

    /// The type-id of the payload currently (or most recently) stored here,
    /// or `None` if nothing has ever been stored.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Mark the cell as empty. The underlying allocation and type tag are
    /// retained so a subsequent `set::<T>` of the same `T` can reuse them.
    pub fn clear(&mut self) {
        self.has_value = false;
    }

    /// Store `val`, overwriting in place if the cell already holds (or most
    /// recently held) a value of type `T`.
    pub fn set<T: Any + Send + Clone>(&mut self, val: T) {
        let tid = TypeId::of::<T>();
        if self.type_id == Some(tid) {
            if let Some(slot) = self
                .payload
                .as_mut()
                .and_then(|b| b.as_any_mut().downcast_mut::<T>())
            {
                *slot = val;
                self.has_value = true;
                return;
            }
        }
        self.type_id = Some(tid);
        self.payload = Some(Box::new(val));
        self.has_value = true;
    }

    /// Borrow the payload as `T`, or `None` if empty or of a different type.
    pub fn get<T: Any>(&self) -> Option<&T> {
        if !self.has_value {
            return None;
        }
        self.payload.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the payload as `T`, or `None` if empty or of a
    /// different type.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        if !self.has_value {
            return None;
        }
        self.payload.as_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Full swap of both cells' contents (type tag, allocation, and
    /// has-value bit). This is the "move" half of the copy/move/swap rule:
    /// after a move-handoff the producer's cell is left holding the
    /// consumer's old (now stale) allocation under the consumer's old type
    /// tag, ready to be overwritten next tick without reallocating.
    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(&mut self.has_value, &mut other.has_value);
        std::mem::swap(&mut self.type_id, &mut other.type_id);
        std::mem::swap(&mut self.payload, &mut other.payload);
    }

    /// Copy `other`'s payload into `self`, reusing `self`'s allocation when
    /// the type tags already match (the "copy" half of the copy/move/swap
    /// rule, used for every fan-out consumer except the last).
    ///
    /// No-op if `other` is empty.
    pub fn copy_from(&mut self, other: &Value) {
        let Some(src) = other.payload.as_deref() else {
            return;
        };
        if self.type_id == other.type_id {
            if let Some(dst) = self.payload.as_deref_mut() {
                dst.assign_from(src);
                self.has_value = true;
                return;
            }
        }
        self.type_id = other.type_id;
        self.payload = Some(src.clone_boxed());
        self.has_value = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let v = Value::new();
        assert!(v.is_empty());
        assert_eq!(v.get::<i32>(), None);
    }

    #[test]
    fn set_then_get() {
        let mut v = Value::new();
        v.set(42i32);
        assert!(!v.is_empty());
        assert_eq!(v.get::<i32>(), Some(&42));
    }

    #[test]
    fn clear_keeps_type_hint() {
        let mut v = Value::new();
        v.set(String::from("hello"));
        let tid = v.type_id();
        v.clear();
        assert!(v.is_empty());
        assert_eq!(v.type_id(), tid);
    }

    #[test]
    fn set_changes_type() {
        let mut v = Value::new();
        v.set(1i32);
        v.set(String::from("now a string"));
        assert_eq!(v.get::<i32>(), None);
        assert_eq!(v.get::<String>(), Some(&"now a string".to_owned()));
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = Value::new();
        let mut b = Value::new();
        a.set(1i32);
        b.set(2i32);
        a.swap(&mut b);
        assert_eq!(a.get::<i32>(), Some(&2));
        assert_eq!(b.get::<i32>(), Some(&1));
    }

    #[test]
    fn copy_from_clones_value() {
        let mut a = Value::new();
        let mut b = Value::new();
        a.set(vec![1, 2, 3]);
        b.copy_from(&a);
        assert_eq!(a.get::<Vec<i32>>(), Some(&vec![1, 2, 3]));
        assert_eq!(b.get::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn copy_from_empty_is_noop() {
        let a = Value::new();
        let mut b = Value::new();
        b.set(5i32);
        b.copy_from(&a);
        assert_eq!(b.get::<i32>(), Some(&5));
    }
}
