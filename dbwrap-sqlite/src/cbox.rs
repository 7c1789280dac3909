use std::{
    mem,
    ops::{Deref, DerefMut},
    ptr,
};

/// Owns a pointer handed out by SQLite and releases it with `dealloc` when dropped.
#[derive(Debug)]
pub(crate) struct CBox<T> {
    ptr: *mut T,
    dealloc: fn(*mut T),
}

impl<T> CBox<T> {
    pub fn new(ptr: *mut T, dealloc: fn(*mut T)) -> Self {
        Self { ptr, dealloc }
    }

    pub fn null(dealloc: fn(*mut T)) -> Self {
        Self::new(ptr::null_mut(), dealloc)
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Gives up the ownership, the box is left null.
    pub fn take(&mut self) -> *mut T {
        mem::replace(&mut self.ptr, ptr::null_mut())
    }
}

impl<T> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            (self.dealloc)(self.take());
        }
    }
}

impl<T> Deref for CBox<T> {
    type Target = *mut T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}

unsafe impl<T> Send for CBox<T> {}
