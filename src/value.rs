//! Type-erased element storage
//!
//! Queues hold values of a single concrete type that is only known at the
//! call site of `produce`. Elements are stored behind an `Arc<dyn Any>` so
//! every consumer can clone the same element out of the log without the
//! queue knowing the type, and a [`TypeTag`] records which type a queue is
//! committed to.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Stable identity of a queue's element type.
///
/// Compared by `TypeId` only, which is injective within a process: two
/// distinct types never compare equal and the same type always compares
/// equal to itself. The `type_name` is carried purely for diagnostics and
/// never takes part in the comparison.
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human-readable type name, for error messages and stats only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

/// A shared, type-erased element.
///
/// Cloning is an `Arc` bump, so replaying the same element to many
/// consumers never copies the payload.
#[derive(Clone)]
pub struct ErasedValue {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedValue {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Clone the payload back out as `T`. Returns `None` if the stored
    /// type differs, which the queue's tag check rules out in practice.
    pub fn extract<T: Clone + 'static>(&self) -> Option<T> {
        self.inner.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErasedValue")
    }
}
