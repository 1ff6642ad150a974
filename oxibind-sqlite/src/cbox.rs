use libsqlite3_sys::{sqlite3, sqlite3_close, sqlite3_finalize, sqlite3_stmt};
use std::{
    ops::{Deref, DerefMut},
    ptr,
};

/// Raw sqlite handle that may still be unset.
pub(crate) trait NullCheck {
    fn is_null(&self) -> bool;
}

impl<T> NullCheck for *mut T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

/// Owns a pointer handed out by sqlite, released with `dealloc` unless null.
///
/// The allocating call writes through `&mut *cbox`, so a box usually starts null.
#[derive(Debug)]
pub(crate) struct CBox<T: NullCheck> {
    pub(crate) ptr: T,
    dealloc: fn(T),
}

impl<T: NullCheck> CBox<T> {
    pub fn new(ptr: T, dealloc: fn(T)) -> Self {
        Self { ptr, dealloc }
    }
}

impl CBox<*mut sqlite3> {
    /// Unopened database, closed on drop.
    pub fn database() -> Self {
        Self::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        })
    }

    /// Database owned elsewhere, never closed by this box.
    pub fn borrowed(db: *mut sqlite3) -> Self {
        Self::new(db, |_| {})
    }
}

impl CBox<*mut sqlite3_stmt> {
    /// Unprepared statement, finalized on drop.
    pub fn statement() -> Self {
        Self::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        })
    }
}

impl<T: NullCheck> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.is_null() {
            unsafe {
                (self.dealloc)(ptr::read(&self.ptr as *const T));
            }
        }
    }
}

impl<T: NullCheck> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T: NullCheck> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}

unsafe impl<T: NullCheck> Send for CBox<T> {}
unsafe impl<T: NullCheck> Sync for CBox<T> {}

#[cfg(test)]
mod tests {
    use crate::cbox::CBox;
    use libsqlite3_sys::{SQLITE_OK, sqlite3_open, sqlite3_prepare_v2};
    use std::{
        ptr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn released_once_unless_null() {
        static RELEASED: AtomicUsize = AtomicUsize::new(0);
        let mut value = 123;
        {
            let handle = CBox::new(ptr::null_mut::<i32>(), |_| {
                RELEASED.fetch_add(1, Ordering::Relaxed);
            });
            assert!(handle.is_null());
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        {
            let handle = CBox::new(&mut value as *mut i32, |_| {
                RELEASED.fetch_add(1, Ordering::Relaxed);
            });
            assert_eq!(unsafe { **handle }, 123);
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn sqlite_handles() {
        let mut db = CBox::database();
        let rc = unsafe { sqlite3_open(c":memory:".as_ptr(), &mut *db) };
        assert_eq!(rc, SQLITE_OK);
        let mut statement = CBox::statement();
        let rc = unsafe {
            sqlite3_prepare_v2(
                *db,
                c"SELECT 1".as_ptr(),
                -1,
                &mut *statement,
                ptr::null_mut(),
            )
        };
        assert_eq!(rc, SQLITE_OK);
        assert!(!statement.is_null());
        drop(CBox::borrowed(*db));
        drop(statement);
        drop(db);
    }
}
