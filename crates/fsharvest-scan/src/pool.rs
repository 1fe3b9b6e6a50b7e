//! Bounded worker pool with reusable slot identifiers.
//!
//! Every task launched through the pool must first borrow a [`Slot`]. The
//! slot is returned when the guard drops, so a task that fails (or panics)
//! can never leak its slot. Tasks run on a rayon thread pool with exactly
//! `capacity` threads; since no more than `capacity` slots exist, a launched
//! task always has a thread to run on.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use fsharvest_core::{ConfigError, HarvestError};

/// A bounded set of task slots backed by a fixed-size thread pool.
pub struct WorkerPool {
    capacity: usize,
    free: Mutex<VecDeque<usize>>,
    released: Condvar,
    threads: Option<rayon::ThreadPool>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl WorkerPool {
    /// Create a pool with `capacity` slots.
    ///
    /// A zero capacity is accepted here and reported as
    /// [`ConfigError::InvalidPoolCapacity`] by the first operation that
    /// tries to use the pool.
    pub fn new(capacity: usize) -> Result<Self, HarvestError> {
        let threads = if capacity == 0 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(capacity)
                .thread_name(|i| format!("harvest-{i}"))
                .build()
                .map_err(|e| HarvestError::ThreadPool {
                    message: e.to_string(),
                })?;
            Some(pool)
        };

        Ok(Self {
            capacity,
            free: Mutex::new((0..capacity).collect()),
            released: Condvar::new(),
            threads,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    /// Configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fail with a configuration error if the pool cannot run tasks.
    pub fn ensure_usable(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            Err(ConfigError::InvalidPoolCapacity)
        } else {
            Ok(())
        }
    }

    /// Block until a slot is free and reserve it.
    pub fn acquire(&self) -> Result<Slot<'_>, ConfigError> {
        self.ensure_usable()?;
        Ok(self.acquire_blocking())
    }

    /// Reserve a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<Slot<'_>> {
        let id = self.lock_free().pop_front()?;
        Some(self.reserve(id))
    }

    /// Number of slots currently borrowed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously borrowed slots seen so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Number of slots free right now.
    pub fn available(&self) -> usize {
        self.lock_free().len()
    }

    /// Run `op` with a task scope. Returns once `op` and every task it
    /// launched (transitively) has finished.
    ///
    /// `op` itself runs on the calling thread, outside the worker threads,
    /// so it may block on [`TaskScope::acquire`] without starving them.
    pub fn scope<'scope, F, R>(&'scope self, op: F) -> Result<R, HarvestError>
    where
        F: FnOnce(&TaskScope<'_, 'scope>) -> R,
    {
        self.ensure_usable()?;
        let threads = self.threads.as_ref().ok_or(ConfigError::InvalidPoolCapacity)?;
        Ok(threads.in_place_scope(|scope| op(&TaskScope { pool: self, scope })))
    }

    fn acquire_blocking(&self) -> Slot<'_> {
        let mut free = self.lock_free();
        loop {
            if let Some(id) = free.pop_front() {
                drop(free);
                return self.reserve(id);
            }
            free = self
                .released
                .wait(free)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn reserve(&self, id: usize) -> Slot<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Slot { pool: self, id }
    }

    fn release(&self, id: usize) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.lock_free().push_back(id);
        self.released.notify_one();
    }

    fn lock_free(&self) -> MutexGuard<'_, VecDeque<usize>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// A borrowed pool slot. Dropping it returns the identifier to the pool.
#[derive(Debug)]
pub struct Slot<'p> {
    pool: &'p WorkerPool,
    id: usize,
}

impl Slot<'_> {
    /// Identifier of this slot, in `0..capacity`.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}

/// Handle for launching slot-bound tasks inside [`WorkerPool::scope`].
pub struct TaskScope<'a, 'scope> {
    pool: &'scope WorkerPool,
    scope: &'a rayon::Scope<'scope>,
}

impl<'scope> TaskScope<'_, 'scope> {
    /// Block until a slot is free.
    ///
    /// Only call this from a thread that holds no slot, otherwise a full
    /// pool can deadlock; tasks should use [`try_acquire`](Self::try_acquire)
    /// and fall back to running inline.
    pub fn acquire(&self) -> Slot<'scope> {
        self.pool.acquire_blocking()
    }

    /// Reserve a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<Slot<'scope>> {
        self.pool.try_acquire()
    }

    /// Launch `task` on a worker thread. The slot is held until the task
    /// returns or unwinds.
    pub fn spawn<F>(&self, slot: Slot<'scope>, task: F)
    where
        F: FnOnce(&TaskScope<'_, 'scope>) + Send + 'scope,
    {
        let pool = self.pool;
        self.scope.spawn(move |scope| {
            let _slot = slot;
            task(&TaskScope { pool, scope });
        });
    }

    /// Run `task` on a worker if a slot is free, otherwise inline on the
    /// current thread. Returns `true` if the task was launched.
    pub fn spawn_or_inline<F>(&self, task: F) -> bool
    where
        F: FnOnce(&TaskScope<'_, 'scope>) + Send + 'scope,
    {
        match self.try_acquire() {
            Some(slot) => {
                self.spawn(slot, task);
                true
            }
            None => {
                task(self);
                false
            }
        }
    }
}
