use std::cell::{Cell, UnsafeCell};
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use crate::error::ContainerError;

const BLOCK_SIZE: usize = 16;

/// Backing storage unit, guarantees the base address of the arena is 16 bytes aligned.
#[repr(C, align(16))]
struct Block([MaybeUninit<u8>; BLOCK_SIZE]);

/// Fixed-capacity monotonic arena.
///
/// Memory is handed out by advancing a cursor, there is no per-object free.
/// The whole arena can only be reset at once.
pub struct BumpAllocator {
    buffer: Box<[UnsafeCell<Block>]>,
    capacity: usize,
    cursor: Cell<usize>,
}

impl BumpAllocator {
    pub fn new(capacity: usize) -> Self {
        let block_count = (capacity + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let buffer = (0..block_count)
            .map(|_| UnsafeCell::new(Block([MaybeUninit::uninit(); BLOCK_SIZE])))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buffer,
            capacity,
            cursor: Cell::new(0),
        }
    }

    /// Reserve uninitialized memory for a `T` aligned to at least `alignment` bytes.
    ///
    /// The effective alignment is `max(alignment, align_of::<T>())`, it must be a power of two.
    /// Returns `None` if the remaining space is insufficient.
    pub fn allocate_aligned<T>(&self, alignment: usize) -> Option<NonNull<T>> {
        let alignment = alignment.max(mem::align_of::<T>());
        assert!(alignment.is_power_of_two(), "Alignment must be a power of two, got {}!", alignment);

        let base = self.base_ptr();
        let base_addr = base as usize;

        let current_addr = base_addr.checked_add(self.cursor.get())?;
        let aligned_addr = current_addr.checked_add(alignment - 1)? & !(alignment - 1);

        let offset = aligned_addr - base_addr;
        let end = offset.checked_add(mem::size_of::<T>())?;

        if end > self.capacity() {
            return None;
        }
        self.cursor.set(end);

        // derive from the base pointer to keep the provenance of the buffer
        NonNull::new(unsafe { base.add(offset) } as *mut T)
    }

    /// Move `value` into the arena.
    pub fn allocate<T>(&self, value: T) -> Option<NonNull<T>> {
        let ptr = self.allocate_aligned::<T>(mem::align_of::<T>())?;

        unsafe { ptr.as_ptr().write(value); }
        Some(ptr)
    }

    /// Same as [`BumpAllocator::allocate`], but report why the allocation failed.
    pub fn try_allocate<T>(&self, value: T) -> Result<NonNull<T>, ContainerError> {
        let remaining = self.remaining();

        self.allocate(value)
            .ok_or(ContainerError::ArenaExhausted {
                requested: mem::size_of::<T>(),
                alignment: mem::align_of::<T>(),
                remaining,
            })
    }

    /// Reset the whole arena.
    ///
    /// Values living inside the arena are not dropped.
    pub fn reset(&mut self) {
        self.cursor.set(0);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    #[inline]
    fn base_ptr(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.buffer.as_ptr()) as *mut u8
    }
}
