// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The page-flip controller.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use understory_timing::{TimerId, TimerQueue};

use crate::{FlipConfig, HorizontalDrag, PointerInput};

/// Drag progress beyond which releasing a drag commits a page turn.
///
/// Dragging left past `-DRAG_COMMIT_THRESHOLD` turns forward, dragging right
/// past `+DRAG_COMMIT_THRESHOLD` turns back.
pub const DRAG_COMMIT_THRESHOLD: f64 = 0.3;

/// Notifications kept for [`BookFlip::drain_events`]; older ones are dropped first.
pub const MAX_QUEUED_EVENTS: usize = 64;

/// One leaf of the book.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Page<C> {
    /// Content shown on the front of the leaf.
    pub front: C,
    /// Content shown on the back of the leaf.
    pub back: C,
}

impl<C> Page<C> {
    /// Creates a leaf from its two sides.
    pub fn new(front: C, back: C) -> Self {
        Self { front, back }
    }
}

/// Notification emitted at state machine transitions.
///
/// Each variant carries the page index that results from the transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FlipEvent {
    /// A navigation committed and the flip-lock started.
    FlipStart(usize),
    /// The current page changed.
    PageChange(usize),
    /// The flip-lock elapsed.
    FlipEnd(usize),
}

/// Snapshot of the observable navigation state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlipState {
    /// Current page index, within `0..=page_count`.
    pub current_page: usize,
    /// Whether a flip-lock is active.
    pub is_flipping: bool,
    /// Whether a drag is in progress.
    pub is_dragging: bool,
    /// Normalized drag displacement in `[-1, 1]`.
    pub drag_progress: f64,
    /// `current_page < page_count`.
    pub can_go_next: bool,
    /// `current_page > 0`.
    pub can_go_prev: bool,
    /// Reading progress in percent.
    pub progress: f64,
    /// Revision counter at the time of the snapshot.
    pub revision: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FlipTimer {
    ReleaseLock,
    AutoPlay,
}

#[derive(Copy, Clone, Debug)]
struct ActiveFlip {
    started_at: u64,
    ends_at: u64,
}

/// Headless page-flip controller.
///
/// `BookFlip` owns the current page, the flip-lock, drag state, and the
/// auto-play schedule for a fixed collection of [`Page`]s. It never reads a
/// clock: every time-dependent call takes `now`, a timestamp in milliseconds
/// from the host's monotonic clock, and the host calls [`tick`](Self::tick)
/// from its frame or timer callback so that flip-locks release and auto-play
/// advances.
///
/// Every time-dependent call first fires the timers due at `now`, so a flip
/// whose duration has elapsed never blocks navigation even if the host has
/// not ticked yet.
///
/// Navigation that is not currently possible (out of range, or while a flip
/// is in progress) is silently ignored; the navigation methods return whether
/// anything happened.
///
/// ```
/// use understory_page_flip::{BookFlip, FlipEvent, FlipOptions, Page};
///
/// let pages = vec![Page::new("p1.png", "p2.png"), Page::new("p3.png", "p4.png")];
/// let config = FlipOptions { duration: Some(500), ..FlipOptions::default() }
///     .resolve()
///     .unwrap();
/// let mut book = BookFlip::new(pages, config);
///
/// assert!(book.next_page(0));
/// // Still flipping: ignored.
/// assert!(!book.next_page(100));
///
/// book.tick(500);
/// assert!(book.next_page(500));
/// assert_eq!(book.current_page(), 2);
/// assert!(!book.can_go_next());
///
/// let events: Vec<_> = book.drain_events().collect();
/// assert_eq!(events[..3], [
///     FlipEvent::FlipStart(1),
///     FlipEvent::PageChange(1),
///     FlipEvent::FlipEnd(1),
/// ]);
/// ```
#[derive(Debug)]
pub struct BookFlip<C> {
    pages: Vec<Page<C>>,
    config: FlipConfig,
    current_page: usize,
    flip: Option<ActiveFlip>,
    drag: HorizontalDrag,
    timers: TimerQueue<FlipTimer>,
    auto_play: Option<TimerId>,
    events: VecDeque<FlipEvent>,
    revision: u64,
}

impl<C> BookFlip<C> {
    /// Creates a controller on the first page.
    pub fn new(pages: Vec<Page<C>>, config: FlipConfig) -> Self {
        Self {
            pages,
            config,
            current_page: 0,
            flip: None,
            drag: HorizontalDrag::default(),
            timers: TimerQueue::new(),
            auto_play: None,
            events: VecDeque::new(),
            revision: 0,
        }
    }

    /// The page collection.
    pub fn pages(&self) -> &[Page<C>] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The resolved configuration.
    pub fn config(&self) -> &FlipConfig {
        &self.config
    }

    /// Current page index, within `0..=page_count`.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Whether a flip-lock is active.
    pub fn is_flipping(&self) -> bool {
        self.flip.is_some()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Normalized drag displacement in `[-1, 1]`; zero when not dragging.
    pub fn drag_progress(&self) -> f64 {
        self.drag.progress()
    }

    /// Whether [`next_page`](Self::next_page) has somewhere to go.
    pub fn can_go_next(&self) -> bool {
        self.current_page < self.pages.len()
    }

    /// Whether [`prev_page`](Self::prev_page) has somewhere to go.
    pub fn can_go_prev(&self) -> bool {
        self.current_page > 0
    }

    /// Reading progress in percent; zero for an empty book.
    pub fn progress(&self) -> f64 {
        if self.pages.is_empty() {
            0.0
        } else {
            self.current_page as f64 / self.pages.len() as f64 * 100.0
        }
    }

    /// Monotonic counter bumped on every observable state change.
    ///
    /// Calls that change nothing leave it untouched, so renderers can skip
    /// work when the revision they last drew is still current.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// A snapshot of the observable state.
    pub fn state(&self) -> FlipState {
        FlipState {
            current_page: self.current_page,
            is_flipping: self.is_flipping(),
            is_dragging: self.is_dragging(),
            drag_progress: self.drag_progress(),
            can_go_next: self.can_go_next(),
            can_go_prev: self.can_go_prev(),
            progress: self.progress(),
            revision: self.revision,
        }
    }

    /// Removes and returns the queued notifications, oldest first.
    ///
    /// Hosts that care about notifications should drain them every frame. At
    /// most [`MAX_QUEUED_EVENTS`] are kept; when the queue is full the oldest
    /// notification is discarded.
    pub fn drain_events(&mut self) -> impl Iterator<Item = FlipEvent> + '_ {
        self.events.drain(..)
    }

    /// Linear progress of the active flip in `[0, 1]`, or `None` when idle.
    pub fn transition_progress(&self, now: u64) -> Option<f64> {
        let flip = self.flip?;
        let span = flip.ends_at.saturating_sub(flip.started_at);
        if span == 0 {
            return Some(1.0);
        }
        let elapsed = now.saturating_sub(flip.started_at);
        Some((elapsed as f64 / span as f64).min(1.0))
    }

    /// [`transition_progress`](Self::transition_progress) passed through the
    /// configured easing curve.
    pub fn eased_progress(&self, now: u64) -> Option<f64> {
        self.transition_progress(now)
            .map(|t| self.config.easing.ease(t))
    }

    /// Host has mounted the viewer: starts auto-play when configured.
    pub fn mount(&mut self, now: u64) {
        if self.config.auto_play {
            self.start_auto_play(now);
        }
    }

    /// Host is unmounting the viewer: cancels auto-play.
    ///
    /// The controller must not drive navigation after its presentation layer
    /// is gone, so hosts call this before tearing the view down.
    pub fn dispose(&mut self) {
        self.stop_auto_play();
    }

    /// Fires every timer due at or before `now`.
    pub fn tick(&mut self, now: u64) {
        while let Some(fired) = self.timers.pop_due(now) {
            match fired.payload {
                FlipTimer::ReleaseLock => self.release_lock(fired.deadline),
                FlipTimer::AutoPlay => self.auto_play_step(fired.deadline),
            }
        }
    }

    /// Turns forward one page.
    pub fn next_page(&mut self, now: u64) -> bool {
        self.tick(now);
        self.try_next(now)
    }

    /// Turns back one page.
    pub fn prev_page(&mut self, now: u64) -> bool {
        self.tick(now);
        self.try_prev(now)
    }

    /// Jumps straight to `page`, which must be within `0..=page_count`.
    pub fn go_to_page(&mut self, page: usize, now: u64) -> bool {
        self.tick(now);
        self.try_go_to(page, now)
    }

    /// Begins a drag at the pointer's primary horizontal position.
    ///
    /// Ignored while flipping, and for touch events without touch points.
    pub fn handle_drag_start(&mut self, input: &PointerInput, now: u64) -> bool {
        self.tick(now);
        if self.is_flipping() {
            log::trace!("drag start ignored while flipping");
            return false;
        }
        let Some(x) = input.primary_x() else {
            return false;
        };
        self.drag.start(x);
        self.bump();
        true
    }

    /// Updates drag progress from the pointer's primary horizontal position.
    pub fn handle_drag_move(&mut self, input: &PointerInput) -> bool {
        if !self.drag.is_dragging() {
            return false;
        }
        let Some(x) = input.primary_x() else {
            return false;
        };
        let before = self.drag.progress();
        let page_width = self.config.page_width();
        if self.drag.update(x, page_width) != Some(before) {
            self.bump();
        }
        true
    }

    /// Ends the drag, turning the page if progress passed the commit threshold.
    ///
    /// Returns whether a page turn was committed.
    pub fn handle_drag_end(&mut self, now: u64) -> bool {
        if !self.drag.is_dragging() {
            return false;
        }
        self.tick(now);
        let progress = self.drag.end();
        self.bump();
        // The commit goes through the guarded primitives like any other navigation.
        if progress < -DRAG_COMMIT_THRESHOLD {
            self.try_next(now)
        } else if progress > DRAG_COMMIT_THRESHOLD {
            self.try_prev(now)
        } else {
            log::trace!("drag abandoned at {progress}");
            false
        }
    }

    /// Starts (or restarts) auto-play if the configuration enables it.
    ///
    /// Every `auto_play_interval` the book turns forward, wrapping to the first
    /// page after the last.
    pub fn start_auto_play(&mut self, now: u64) -> bool {
        self.tick(now);
        if !self.config.auto_play {
            log::trace!("auto-play not enabled");
            return false;
        }
        if let Some(previous) = self.auto_play.take() {
            self.timers.cancel(previous);
        }
        let interval = self.config.auto_play_interval;
        let id = self
            .timers
            .schedule_repeating(now.saturating_add(interval), interval, FlipTimer::AutoPlay);
        self.auto_play = Some(id);
        log::debug!("auto-play armed every {interval}ms");
        true
    }

    /// Cancels auto-play. Calling this when auto-play is not running is a no-op.
    pub fn stop_auto_play(&mut self) {
        if let Some(id) = self.auto_play.take() {
            self.timers.cancel(id);
            log::debug!("auto-play stopped");
        }
    }

    /// Whether an auto-play timer is armed.
    pub fn is_auto_playing(&self) -> bool {
        self.auto_play.is_some()
    }

    fn try_next(&mut self, now: u64) -> bool {
        if !self.can_go_next() || self.is_flipping() {
            return false;
        }
        self.begin_flip(self.current_page + 1, now);
        true
    }

    fn try_prev(&mut self, now: u64) -> bool {
        if !self.can_go_prev() || self.is_flipping() {
            return false;
        }
        self.begin_flip(self.current_page - 1, now);
        true
    }

    fn try_go_to(&mut self, page: usize, now: u64) -> bool {
        if page > self.pages.len() || self.is_flipping() {
            return false;
        }
        self.begin_flip(page, now);
        true
    }

    fn begin_flip(&mut self, page: usize, now: u64) {
        let ends_at = now.saturating_add(self.config.duration);
        self.flip = Some(ActiveFlip {
            started_at: now,
            ends_at,
        });
        self.current_page = page;
        self.timers.schedule_once(ends_at, FlipTimer::ReleaseLock);
        self.push_event(FlipEvent::FlipStart(page));
        self.push_event(FlipEvent::PageChange(page));
        self.bump();
        log::debug!("flip to page {page} until {ends_at}");
    }

    /// Ends the active flip if its lock has elapsed by `at`.
    ///
    /// A release timer that outlived its flip finds a later `ends_at` and does nothing.
    fn release_lock(&mut self, at: u64) {
        if self.flip.is_some_and(|flip| flip.ends_at <= at) {
            self.flip = None;
            self.push_event(FlipEvent::FlipEnd(self.current_page));
            self.bump();
            log::debug!("flip to page {} finished", self.current_page);
        }
    }

    fn auto_play_step(&mut self, at: u64) {
        // An auto-play tick may share its deadline with the lock release.
        self.release_lock(at);
        if self.can_go_next() {
            self.try_next(at);
        } else {
            self.try_go_to(0, at);
        }
    }

    fn push_event(&mut self, event: FlipEvent) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            self.events.pop_front();
            log::trace!("notification queue full, dropping oldest");
        }
        self.events.push_back(event);
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
