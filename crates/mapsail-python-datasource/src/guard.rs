use std::marker::PhantomData;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use pyo3::Python;

struct LockState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// A process-wide recursive lock that serializes all access to the Python runtime.
///
/// The GIL alone is not enough since the interpreter may switch threads
/// in the middle of a Python call (e.g. on `time.sleep()` or blocking I/O),
/// which would let another thread observe the Python object half-way through an operation.
struct RuntimeLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl RuntimeLock {
    const fn new() -> Self {
        Self {
            state: Mutex::new(LockState {
                owner: None,
                depth: 0,
            }),
            released: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        // The state is only updated in short critical sections that never panic,
        // so it is consistent even if the mutex is poisoned.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enters the lock again if the current thread already owns it.
    fn try_reenter(&self) -> bool {
        let mut state = self.state();
        if state.owner == Some(thread::current().id()) {
            state.depth += 1;
            true
        } else {
            false
        }
    }

    fn lock(&self) {
        let current = thread::current().id();
        let mut state = self.state();
        while state.owner.is_some_and(|owner| owner != current) {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.owner = Some(current);
        state.depth += 1;
    }

    fn unlock(&self) {
        let mut state = self.state();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.owner = None;
            self.released.notify_one();
        }
    }
}

static RUNTIME_LOCK: RuntimeLock = RuntimeLock::new();

/// Exclusive access to the Python runtime for the lifetime of the guard.
///
/// The guard can be acquired again by the thread that holds it.
/// Code that reads attributes of Python objects, calls Python functions,
/// converts Python values, or drops Python references must hold the guard.
pub struct ExclusiveGuard<'py> {
    py: Python<'py>,
    /// The lock is owned by the current thread, so the guard must not be sent elsewhere.
    _not_send: PhantomData<*const ()>,
}

impl<'py> ExclusiveGuard<'py> {
    pub fn acquire(py: Python<'py>) -> Self {
        if !RUNTIME_LOCK.try_reenter() {
            // Another thread may need the GIL to make progress and release the lock.
            py.allow_threads(|| RUNTIME_LOCK.lock());
        }
        Self {
            py,
            _not_send: PhantomData,
        }
    }

    pub fn py(&self) -> Python<'py> {
        self.py
    }
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        RUNTIME_LOCK.unlock();
    }
}

/// Runs the function with the GIL and the [`ExclusiveGuard`] held.
/// Both are released when the function returns or unwinds.
pub fn with_runtime<F, R>(f: F) -> R
where
    F: for<'py> FnOnce(&ExclusiveGuard<'py>) -> R,
{
    Python::with_gil(|py| {
        let guard = ExclusiveGuard::acquire(py);
        f(&guard)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use pyo3::prelude::*;

    use super::*;

    #[test]
    fn test_guard_is_reentrant() {
        pyo3::prepare_freethreaded_python();

        let depth = with_runtime(|outer| {
            let inner = ExclusiveGuard::acquire(outer.py());
            let nested = with_runtime(|_| 2);
            drop(inner);
            nested
        });
        assert_eq!(depth, 2);
        // The lock is fully released, so another thread can acquire it.
        let handle = std::thread::spawn(|| with_runtime(|_| true));
        assert!(handle.join().unwrap_or(false));
    }

    #[test]
    fn test_guard_excludes_other_threads() {
        pyo3::prepare_freethreaded_python();

        let busy = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let handles = (0..4)
            .map(|_| {
                let busy = Arc::clone(&busy);
                let overlaps = Arc::clone(&overlaps);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        with_runtime(|guard| -> PyResult<()> {
                            if busy.swap(true, Ordering::SeqCst) {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            // `time.sleep()` releases the GIL.
                            guard
                                .py()
                                .import("time")?
                                .call_method1("sleep", (0.001,))?;
                            busy.store(false, Ordering::SeqCst);
                            Ok(())
                        })?;
                    }
                    Ok::<(), PyErr>(())
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert!(matches!(handle.join(), Ok(Ok(()))));
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
