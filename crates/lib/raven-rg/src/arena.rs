use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::rc::Rc;

use raven_container::BumpAllocator;

/// Unique pointer to a value living inside a registry arena.
///
/// The arena memory stays valid as long as any `ArenaRef` of it is alive,
/// the value is dropped in place but its memory is only reclaimed with the arena.
pub struct ArenaRef<T> {
    ptr: NonNull<T>,
    _arena: Rc<BumpAllocator>,
    _marker: PhantomData<T>,
}

impl<T> ArenaRef<T> {
    /// `ptr` must point to an initialized `T` inside `arena` which nobody else refers to.
    pub(crate) unsafe fn from_raw(ptr: NonNull<T>, arena: Rc<BumpAllocator>) -> Self {
        Self {
            ptr,
            _arena: arena,
            _marker: PhantomData,
        }
    }
}

impl<T> Deref for ArenaRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for ArenaRef<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for ArenaRef<T> {
    fn drop(&mut self) {
        unsafe { std::ptr::drop_in_place(self.ptr.as_ptr()); }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ArenaRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ArenaRef").field(&**self).finish()
    }
}
