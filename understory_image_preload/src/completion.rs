// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared, settle-once completion signal.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct Inner {
    settled: bool,
    callbacks: Vec<Callback>,
    wakers: Vec<Waker>,
}

/// A signal that settles exactly once and can be observed from many places.
///
/// Clones share state: settling is visible through every clone. Observe it by
/// polling [`is_settled`](Self::is_settled), registering a callback with
/// [`on_settle`](Self::on_settle), or awaiting it as a `Future`.
///
/// A `Completion` carries no value and never fails; preloading failures are
/// reported through the preloader's loading state instead.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_image_preload::Completion;
///
/// let done = Completion::settled();
/// let ran = Rc::new(Cell::new(false));
/// let flag = ran.clone();
/// done.on_settle(move || flag.set(true));
/// assert!(ran.get());
/// ```
#[derive(Clone)]
pub struct Completion {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Completion")
            .field("settled", &inner.settled)
            .field("callbacks", &inner.callbacks.len())
            .field("wakers", &inner.wakers.len())
            .finish()
    }
}

impl Completion {
    /// A completion that has already settled.
    pub fn settled() -> Self {
        let completion = Self::pending();
        completion.inner.borrow_mut().settled = true;
        completion
    }

    pub(crate) fn pending() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }

    /// Returns `true` once the completion has settled.
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().settled
    }

    /// Runs `callback` once this completion settles.
    ///
    /// If it has already settled, `callback` runs immediately.
    pub fn on_settle(&self, callback: impl FnOnce() + 'static) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.settled {
                inner.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Settles the completion, running callbacks and waking tasks.
    ///
    /// Settling twice is a no-op.
    pub(crate) fn settle(&self) {
        let (callbacks, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.settled {
                return;
            }
            inner.settled = true;
            (
                core::mem::take(&mut inner.callbacks),
                core::mem::take(&mut inner.wakers),
            )
        };
        // The borrow is released so callbacks may observe or clone this completion.
        for callback in callbacks {
            callback();
        }
        for waker in wakers {
            waker.wake();
        }
    }

    /// A completion that settles once every part has settled.
    pub(crate) fn all(parts: impl IntoIterator<Item = Self>) -> Self {
        let pending: Vec<Self> = parts.into_iter().filter(|c| !c.is_settled()).collect();
        if pending.is_empty() {
            return Self::settled();
        }

        let group = Self::pending();
        let remaining = Rc::new(Cell::new(pending.len()));
        for part in pending {
            let group = group.clone();
            let remaining = remaining.clone();
            part.on_settle(move || {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    group.settle();
                }
            });
        }
        group
    }
}

impl Future for Completion {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.settled {
            return Poll::Ready(());
        }
        if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
