// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: host-agnostic timer queue primitives for UI runtimes.
//!
//! UI state machines frequently need "do this after N milliseconds" or
//! "do this every N milliseconds" without depending on any particular host
//! timer API (`setTimeout`, a winit event loop, an embedded executor, ...).
//!
//! [`TimerQueue`] keeps a set of pending timers keyed by deadlines expressed
//! in a caller-chosen monotonic time unit (typically milliseconds). The host
//! owns the clock: it periodically calls [`TimerQueue::pop_due`] with the
//! current time and handles each [`Fired`] timer in deadline order.
//!
//! - One-shot timers are removed when they fire.
//! - Repeating timers are rescheduled one period after their deadline. If the
//!   host fell behind by more than one period, the missed ticks are coalesced
//!   into a single firing and the next deadline lands after `now`.
//! - Timers with equal deadlines fire in the order they were scheduled.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_timing::TimerQueue;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Job {
//!     Blink,
//!     Hide,
//! }
//!
//! let mut timers = TimerQueue::new();
//! let blink = timers.schedule_repeating(500, 500, Job::Blink);
//! timers.schedule_once(1200, Job::Hide);
//!
//! let fired: Vec<_> = core::iter::from_fn(|| timers.pop_due(1200))
//!     .map(|f| f.payload)
//!     .collect();
//! // The host was late for the tick at 1000, so it was folded into this drain.
//! assert_eq!(fired, vec![Job::Blink, Job::Hide]);
//! assert_eq!(timers.deadline_of(blink), Some(1500));
//!
//! timers.cancel(blink);
//! assert!(timers.is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::collections::BinaryHeap;
use core::cmp::{Ordering, Reverse};

use hashbrown::HashMap;

/// Identifier of a scheduled timer.
///
/// Identifiers are never reused by the queue that issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw numeric value of this identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A timer that came due during [`TimerQueue::pop_due`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// The timer that fired.
    pub id: TimerId,
    /// The deadline the timer was scheduled for (not the time it was popped).
    pub deadline: u64,
    /// Whether the timer stays scheduled after this firing.
    pub repeating: bool,
    /// The payload supplied when scheduling.
    pub payload: T,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    deadline: u64,
    period: Option<u64>,
    payload: T,
}

/// Heap entry; stale entries (cancelled or rescheduled timers) are skipped lazily.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Entry {
    deadline: u64,
    seq: u64,
    id: TimerId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A queue of one-shot and repeating timers driven by a host-supplied clock.
///
/// See the [crate-level documentation](crate) for an overview.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Entry>>,
    slots: HashMap<TimerId, Slot<T>>,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            slots: HashMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    /// Schedules `payload` to fire once at `deadline`.
    pub fn schedule_once(&mut self, deadline: u64, payload: T) -> TimerId {
        self.insert(deadline, None, payload)
    }

    /// Schedules `payload` to fire at `first`, then every `period` after that.
    ///
    /// A `period` of zero is treated as one so that a repeating timer can never
    /// fire forever within a single [`pop_due`](Self::pop_due) drain. A timer
    /// whose next deadline would pass `u64::MAX` fires one last time and is
    /// then removed.
    pub fn schedule_repeating(&mut self, first: u64, period: u64, payload: T) -> TimerId {
        self.insert(first, Some(period.max(1)), payload)
    }

    fn insert(&mut self, deadline: u64, period: Option<u64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.slots.insert(
            id,
            Slot {
                deadline,
                period,
                payload,
            },
        );
        self.push_entry(deadline, id);
        id
    }

    fn push_entry(&mut self, deadline: u64, id: TimerId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { deadline, seq, id }));
    }

    /// Cancels a timer, returning its payload if it was still scheduled.
    ///
    /// Cancelling an unknown or already-fired one-shot timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.slots.remove(&id).map(|slot| slot.payload)
    }

    /// Returns `true` if `id` is still scheduled.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Returns the deadline `id` will next fire at, if it is scheduled.
    pub fn deadline_of(&self, id: TimerId) -> Option<u64> {
        self.slots.get(&id).map(|slot| slot.deadline)
    }

    /// Returns the earliest pending deadline.
    ///
    /// Hosts can use this to decide how long to sleep before the next
    /// [`pop_due`](Self::pop_due).
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_stale();
        self.heap.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Number of scheduled timers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no timers are scheduled.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cancels every timer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.slots.clear();
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(entry)) = self.heap.peek() {
            match self.slots.get(&entry.id) {
                Some(slot) if slot.deadline == entry.deadline => return,
                _ => {
                    self.heap.pop();
                }
            }
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pops the earliest timer whose deadline is at or before `now`.
    ///
    /// Call this in a loop until it returns `None` to handle every due timer.
    /// Handlers may schedule or cancel timers between calls; a timer scheduled
    /// with a deadline at or before `now` fires within the same drain.
    pub fn pop_due(&mut self, now: u64) -> Option<Fired<T>> {
        self.discard_stale();
        let Reverse(entry) = *self.heap.peek()?;
        if entry.deadline > now {
            return None;
        }
        self.heap.pop();

        let slot = self.slots.get_mut(&entry.id)?;
        match slot.period {
            Some(period) => {
                // Coalesce missed ticks: the next deadline is the first one after `now`.
                let missed = (now - entry.deadline) / period;
                let next = entry
                    .deadline
                    .saturating_add(period.saturating_mul(missed.saturating_add(1)));
                if next <= entry.deadline {
                    // No representable deadline is left on the clock.
                    let slot = self.slots.remove(&entry.id)?;
                    return Some(Fired {
                        id: entry.id,
                        deadline: entry.deadline,
                        repeating: false,
                        payload: slot.payload,
                    });
                }
                slot.deadline = next;
                let payload = slot.payload.clone();
                self.push_entry(next, entry.id);
                Some(Fired {
                    id: entry.id,
                    deadline: entry.deadline,
                    repeating: true,
                    payload,
                })
            }
            None => {
                let slot = self.slots.remove(&entry.id)?;
                Some(Fired {
                    id: entry.id,
                    deadline: entry.deadline,
                    repeating: false,
                    payload: slot.payload,
                })
            }
        }
    }
}
