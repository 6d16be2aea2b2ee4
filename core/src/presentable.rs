//! Producing matter for presentation.
//!
//! A [`Presentable`] is the screen-side factory: each materialization yields
//! a fresh matter/result pair, or a stack-control request instead of anything
//! to show. Control flow is data here; the host interprets the request, no
//! identity checks against sentinel instances are involved.

use std::sync::Arc;

/// What one materialization produced.
#[derive(Debug)]
pub enum Produced<M, R> {
    /// Something to show, plus the handle its owner uses to observe it.
    Matter(M, R),
    /// Dismiss the enclosing presentation instead of showing anything.
    RequestDismiss,
    /// Dispose the enclosing continuation scope.
    RequestPop,
    /// Leave the current stack untouched.
    RequestContinue,
}

/// A factory of presentable matter. Materializing twice yields two
/// independent instances.
pub trait Presentable: Send + Sync + 'static {
    type Matter;
    type Result;

    fn materialize(&self) -> Produced<Self::Matter, Self::Result>;
}

/// A presentable built from a closure.
pub struct AnyPresentable<M, R> {
    materialize: Arc<dyn Fn() -> Produced<M, R> + Send + Sync>,
}

impl<M, R> Clone for AnyPresentable<M, R> {
    fn clone(&self) -> Self {
        Self {
            materialize: self.materialize.clone(),
        }
    }
}

impl<M, R> AnyPresentable<M, R> {
    pub fn new(materialize: impl Fn() -> Produced<M, R> + Send + Sync + 'static) -> Self {
        Self {
            materialize: Arc::new(materialize),
        }
    }

    /// A presentable that always yields the same matter and result clones.
    pub fn constant(matter: M, result: R) -> Self
    where
        M: Clone + Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
    {
        Self::new(move || Produced::Matter(matter.clone(), result.clone()))
    }
}

impl<M: 'static, R: 'static> Presentable for AnyPresentable<M, R> {
    type Matter = M;
    type Result = R;

    fn materialize(&self) -> Produced<M, R> {
        (self.materialize)()
    }
}
