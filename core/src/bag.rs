//! Disposal scopes.
//!
//! Every presentation owns a [`Bag`]: a collection of cleanup work (signal
//! subscriptions, spawned tasks, held values) that runs exactly once when the
//! presentation ends. Disposal is idempotent; anything added afterwards is
//! cleaned up immediately.

use std::any::Any;
use std::future::Future;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type DisposeFn = Box<dyn FnOnce() + Send>;

/// A single piece of cancellable work, typically a signal subscription.
///
/// Dropping a `Disposable` does *not* run it; cleanup fires on an explicit
/// [`dispose`](Disposable::dispose) or when the owning [`Bag`] is disposed.
pub struct Disposable {
    action: Mutex<Option<DisposeFn>>,
}

impl Disposable {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// A disposable that does nothing.
    pub fn empty() -> Self {
        Self {
            action: Mutex::new(None),
        }
    }

    /// Runs the cleanup action. Subsequent calls are no-ops.
    pub fn dispose(&self) {
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }
}

#[derive(Default)]
struct BagInner {
    disposed: AtomicBool,
    items: Mutex<Vec<DisposeFn>>,
    held: Mutex<Vec<Box<dyn Any + Send>>>,
}

/// A cancellation scope shared by everything belonging to one presentation.
///
/// Cloning a `Bag` clones a handle to the same scope. Disposing any clone
/// runs all registered cleanup exactly once, aborts spawned tasks and drops
/// held values.
#[derive(Clone, Default)]
pub struct Bag {
    inner: Arc<BagInner>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers cleanup to run on disposal. If the bag is already disposed
    /// the closure runs immediately.
    pub fn add(&self, action: impl FnOnce() + Send + 'static) {
        if self.inner.disposed.load(Ordering::SeqCst) {
            action();
            return;
        }
        self.inner.items.lock().push(Box::new(action));
    }

    /// Ties a [`Disposable`] to this scope.
    pub fn add_disposable(&self, disposable: Disposable) {
        self.add(move || disposable.dispose());
    }

    /// Keeps `value` alive until the bag is disposed.
    pub fn hold<T: Send + 'static>(&self, value: T) {
        if self.inner.disposed.load(Ordering::SeqCst) {
            drop(value);
            return;
        }
        self.inner.held.lock().push(Box::new(value));
    }

    /// Spawns a task whose lifetime is bounded by this scope. Disposal aborts
    /// the task.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        let abort = handle.abort_handle();
        self.add(move || abort.abort());
    }

    /// Runs all registered cleanup. Idempotent; reentrant calls from within
    /// cleanup closures are no-ops.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let items = mem::take(&mut *self.inner.items.lock());
        for item in items {
            item();
        }
        self.inner.held.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for BagInner {
    fn drop(&mut self) {
        if !*self.disposed.get_mut() {
            for item in mem::take(self.items.get_mut()) {
                item();
            }
        }
    }
}
