//! Minimal asynchronous job backend.
//!
//! The scheduler mandates no particular computation backend, only the
//! trigger-now/await-later shape of the [`WorkUnit`] contract. This module
//! is the smallest backend with that shape: [`spawn_job`] fans a closure out
//! to the global rayon pool and hands back a [`JobHandle`] whose
//! [`complete`] blocks until the result arrives.
//!
//! Worker panics are not swallowed. [`complete`] resumes the panic on the
//! calling thread so a broken job fails the frame loudly.
//!
//! [`WorkUnit`]: crate::unit::WorkUnit
//! [`complete`]: JobHandle::complete

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel::{bounded, Receiver};

/// Handle to one in-flight asynchronous computation.
#[derive(Debug)]
pub struct JobHandle<T> {
    result: Receiver<thread::Result<T>>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job finishes and returns its value.
    ///
    /// # Panics
    ///
    /// Resumes the worker's own panic if the job panicked, and panics if
    /// the worker disconnected without producing a result.
    pub fn complete(self) -> T {
        match self.result.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => panic!("job worker disconnected without a result"),
        }
    }

    /// Whether the job has already finished.
    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.result.is_empty()
    }
}

/// Runs `f` on the global worker pool and returns a handle to its result.
pub fn spawn_job<T, F>(f: F) -> JobHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = bounded(1);
    rayon::spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        // The handle may already be gone; nobody is waiting, drop the result.
        let _ = sender.send(result);
    });
    JobHandle { result: receiver }
}
