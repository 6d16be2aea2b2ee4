//! Synchronous signal substrate.
//!
//! Three primitives carry values between presentations and stores:
//!
//! - [`Callbacker`] - bare multicast of borrowed values, invoked on the
//!   caller's stack. Subscribers registered at send time all observe the
//!   value; ordering matches registration order.
//! - [`Signal`] / [`StateSignal`] - event streams, finite via
//!   [`Signal::finish`], or current-value holders whose `set` commits the
//!   value *before* notifying. Observers that read back always see the new
//!   value.
//! - [`FutureResult`] - a single-shot result delivered at most once.
//!
//! Delivery is synchronous by design; async consumers bridge into a task via
//! [`Signal::stream_into`], scoped to a [`Bag`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::bag::{Bag, Disposable};
use crate::error::JourneyError;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct CallbackerInner<T> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
}

/// Multicast callback list. The cheapest building block: no buffering, no
/// current value, values are delivered by reference on the sending stack.
pub struct Callbacker<T> {
    inner: Arc<CallbackerInner<T>>,
}

impl<T> Clone for Callbacker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Callbacker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Callbacker<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CallbackerInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers a subscriber. The returned [`Disposable`] removes it again.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));

        let weak: Weak<CallbackerInner<T>> = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.lock().retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Invokes every subscriber with `value`, in registration order.
    ///
    /// The subscriber list is snapshotted first, so a callback may subscribe
    /// or unsubscribe without deadlocking; such changes take effect on the
    /// next call.
    pub fn call_all(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

/// One emission on a [`Signal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignalEvent<T> {
    Value(T),
    /// The signal is finite and has ended; no further events follow.
    End,
}

/// An event stream. A signal may end at most once via [`finish`](Signal::finish),
/// after which further sends are dropped.
pub struct Signal<T> {
    callbacker: Callbacker<SignalEvent<T>>,
    ended: Arc<AtomicBool>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            callbacker: self.callbacker.clone(),
            ended: self.ended.clone(),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            callbacker: Callbacker::new(),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn send(&self, value: T) {
        if self.ended.load(Ordering::SeqCst) {
            return;
        }
        self.callbacker.call_all(&SignalEvent::Value(value));
    }

    /// Ends the signal. Idempotent; the `End` event is delivered once.
    pub fn finish(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        self.callbacker.call_all(&SignalEvent::End);
    }

    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&SignalEvent<T>) + Send + Sync + 'static,
    ) -> Disposable {
        self.callbacker.subscribe(callback)
    }

    /// Subscribes to values only, ignoring the end event.
    pub fn on_value(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        self.subscribe(move |event| {
            if let SignalEvent::Value(value) = event {
                callback(value);
            }
        })
    }
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// Bridges this signal into an async stream of events. The subscription
    /// lives in `bag`; disposal stops the feed and closes the channel.
    pub fn stream_into(&self, bag: &Bag) -> mpsc::UnboundedReceiver<SignalEvent<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        bag.add_disposable(subscription);
        rx
    }
}

struct StateSignalInner<T> {
    value: RwLock<T>,
    callbacker: Callbacker<T>,
}

/// A current-value holder. [`set`](StateSignal::set) commits the new value
/// before any observer runs, so reading back from inside a callback always
/// yields the value just set.
pub struct StateSignal<T> {
    inner: Arc<StateSignalInner<T>>,
}

impl<T> Clone for StateSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> StateSignal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(StateSignalInner {
                value: RwLock::new(initial),
                callbacker: Callbacker::new(),
            }),
        }
    }

    pub fn value(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Commits `value`, then notifies subscribers synchronously.
    pub fn set(&self, value: T) {
        {
            *self.inner.value.write() = value.clone();
        }
        self.inner.callbacker.call_all(&value);
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        self.inner.callbacker.subscribe(callback)
    }

    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> StateSignal<T> {
    /// Bridges value updates into an async stream, scoped to `bag`.
    pub fn stream_into(&self, bag: &Bag) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value| {
            let _ = tx.send(value.clone());
        });
        bag.add_disposable(subscription);
        rx
    }
}

/// Read-only view of a [`StateSignal`].
pub struct ReadSignal<T> {
    signal: StateSignal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: Clone + 'static> ReadSignal<T> {
    pub fn value(&self) -> T {
        self.signal.value()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        self.signal.subscribe(callback)
    }
}

impl<T: Clone + Send + 'static> ReadSignal<T> {
    pub fn stream_into(&self, bag: &Bag) -> mpsc::UnboundedReceiver<T> {
        self.signal.stream_into(bag)
    }
}

enum FutureState<T> {
    Pending(Vec<Box<dyn FnOnce(&Result<T, JourneyError>) + Send>>),
    Done(Result<T, JourneyError>),
}

/// A single-shot result: completes at most once, observers registered after
/// completion fire immediately with the stored result.
pub struct FutureResult<T> {
    state: Arc<Mutex<FutureState<T>>>,
}

impl<T> Clone for FutureResult<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for FutureResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FutureResult<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FutureState::Pending(Vec::new()))),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(&*self.state.lock(), FutureState::Done(_))
    }
}

impl<T: Clone> FutureResult<T> {
    /// Completes the future. The first call wins; later calls are dropped.
    pub fn complete(&self, result: Result<T, JourneyError>) {
        let callbacks = {
            let mut state = self.state.lock();
            match &mut *state {
                FutureState::Done(_) => return,
                FutureState::Pending(callbacks) => {
                    let callbacks = std::mem::take(callbacks);
                    *state = FutureState::Done(result.clone());
                    callbacks
                }
            }
        };
        for callback in callbacks {
            callback(&result);
        }
    }

    pub fn succeed(&self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(&self, error: JourneyError) {
        self.complete(Err(error));
    }

    /// Observes the result. Runs immediately if already complete.
    pub fn on_result(&self, callback: impl FnOnce(&Result<T, JourneyError>) + Send + 'static) {
        let done = {
            let mut state = self.state.lock();
            match &mut *state {
                FutureState::Pending(callbacks) => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                FutureState::Done(result) => result.clone(),
            }
        };
        callback(&done);
    }
}
