//! Snapshot cell shared between the sensor context and the tick context

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use core::cell::Cell;
use critical_section::Mutex;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A value which is read and written as a whole inside a critical section.
///
/// Readers always see a value that was written in one go, never a mix of two
/// writes. Access is bounded to a copy in or out, so the critical section is
/// short enough to be taken from an interrupt.
pub struct Snapshot<T: Copy> {
    inner: Mutex<Cell<T>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: Copy> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value))
        }
    }

    /// Copy the current value out.
    pub fn read(&self) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    /// Replace the current value.
    pub fn write(&self, value: T) {
        critical_section::with(|cs| self.inner.borrow(cs).set(value))
    }

    /// Read, change and write back the value without another context being
    /// able to observe the intermediate state.
    pub fn modify<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R
    {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut value = cell.get();
            let ret = f(&mut value);
            cell.set(value);
            ret
        })
    }
}

impl<T: Copy + Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_read_write() {
        let s = Snapshot::new((1u32, 2u32));
        assert_eq!(s.read(), (1, 2));

        s.write((3, 4));
        assert_eq!(s.read(), (3, 4));

        let old = s.modify(|v| {
            let old = v.0;
            v.0 = 10;
            old
        });
        assert_eq!(old, 3);
        assert_eq!(s.read(), (10, 4));
    }

    #[test]
    fn test_no_torn_reads() {
        // The writer always stores a pair whose halves are equal
        let s = Arc::new(Snapshot::new((0u64, 0u64)));

        let writer = {
            let s = s.clone();
            thread::spawn(move || {
                for i in 0..20_000u64 {
                    s.modify(|v| {
                        v.0 = i;
                        v.1 = i;
                    });
                }
            })
        };

        for _ in 0..20_000 {
            let (a, b) = s.read();
            assert_eq!(a, b);
        }

        writer.join().unwrap();
    }
}
