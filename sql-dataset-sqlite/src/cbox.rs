use std::ops::{Deref, DerefMut};

/// Handle to a sqlite object, released through `release` unless it is still null when dropped.
pub(crate) struct CBox<T> {
    ptr: *mut T,
    release: fn(*mut T),
}

impl<T> CBox<T> {
    pub(crate) fn new(ptr: *mut T, release: fn(*mut T)) -> Self {
        Self { ptr, release }
    }
}

impl<T> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            (self.release)(self.ptr);
        }
    }
}

impl<T> Deref for CBox<T> {
    type Target = *mut T;

    fn deref(&self) -> &*mut T {
        &self.ptr
    }
}

impl<T> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut *mut T {
        &mut self.ptr
    }
}

// sqlite is built in serialized mode, handles may move between threads.
unsafe impl<T> Send for CBox<T> {}

#[cfg(test)]
mod tests {
    use super::CBox;
    use std::{
        ptr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn releases_only_set_handles() {
        static RELEASED: AtomicUsize = AtomicUsize::new(0);
        let release = |_: *mut u8| {
            RELEASED.fetch_add(1, Ordering::Relaxed);
        };
        drop(CBox::new(ptr::null_mut(), release));
        assert_eq!(RELEASED.load(Ordering::Relaxed), 0);

        let mut slot = 7u8;
        let mut handle = CBox::new(ptr::null_mut(), release);
        *handle = &mut slot as *mut u8;
        assert_eq!(unsafe { **handle }, 7);
        drop(handle);
        assert_eq!(RELEASED.load(Ordering::Relaxed), 1);
    }
}
