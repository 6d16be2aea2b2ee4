//! Asynchronous store effects.
//!
//! Reducers are pure; anything that talks to the outside world returns an
//! [`Effect`] instead. An effect is a stream of follow-up actions, each fed
//! back into the store's `send` as it arrives. The store tracks every running
//! effect under a generated id so it can be cancelled later.

use std::future::Future;

use futures_util::stream::{self, BoxStream, StreamExt};

/// A cancellable stream of follow-up actions.
pub struct Effect<A> {
    stream: BoxStream<'static, A>,
}

impl<A: Send + 'static> Effect<A> {
    /// Emits a single action immediately.
    pub fn just(action: A) -> Self {
        Self {
            stream: stream::once(async move { action }).boxed(),
        }
    }

    /// Emits the future's action once it resolves.
    pub fn once<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self {
            stream: stream::once(future).boxed(),
        }
    }

    /// Emits the future's action if it resolves to one.
    pub fn maybe<F>(future: F) -> Self
    where
        F: Future<Output = Option<A>> + Send + 'static,
    {
        Self {
            stream: stream::once(future)
                .filter_map(|action| async move { action })
                .boxed(),
        }
    }

    /// Emits every action the stream yields until it ends or the effect is
    /// cancelled.
    pub fn stream<S>(stream: S) -> Self
    where
        S: futures_util::Stream<Item = A> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
        }
    }

    pub(crate) fn into_stream(self) -> BoxStream<'static, A> {
        self.stream
    }
}
