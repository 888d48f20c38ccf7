//! Shared ownership for game, GPU and audio resources
//!
//! A `Handle<T>` is a single-threaded reference-counted owner. Cloning bumps
//! the count, dropping or reassigning releases it, and moving a handle leaves
//! the count untouched. The object is destroyed exactly once, when the last
//! handle goes away.
//!
//! Handles may point at trait objects (`Handle<dyn GraphicsBackend>`), so one
//! handle type covers every resource kind and destruction runs through the
//! concrete type's `Drop`.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Reference-counted owning pointer
pub struct Handle<T: ?Sized> {
    inner: Rc<T>,
}

impl<T> Handle<T> {
    /// Allocate `value` with a count of one
    pub fn make(value: T) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }

    /// Run a fallible constructor and wrap its result
    ///
    /// No handle is produced when the constructor fails.
    pub fn try_make<E>(ctor: impl FnOnce() -> Result<T, E>) -> Result<Self, E> {
        ctor().map(Self::make)
    }
}

impl<T: ?Sized> Handle<T> {
    /// Number of live handles sharing the object
    pub fn count(this: &Self) -> usize {
        Rc::strong_count(&this.inner)
    }

    /// True when both handles reference the same object
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T: ?Sized> From<Rc<T>> for Handle<T> {
    fn from(inner: Rc<T>) -> Self {
        Self { inner }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> AsRef<T> for Handle<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("count", &Rc::strong_count(&self.inner))
            .field("object", &&*self.inner)
            .finish()
    }
}
