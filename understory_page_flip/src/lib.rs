// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_page_flip --heading-base-level=0

//! Understory Page Flip: a headless controller for page-turning book viewers.
//!
//! This crate models the interaction state of a "book flip" viewer: linear
//! paginated content turned one leaf at a time, either by discrete navigation
//! (buttons, keys, auto-play) or by dragging a page across.
//!
//! - [`BookFlip`]: the controller. Owns the current page, a flip-lock that
//!   refuses navigation while a transition runs, drag state, and an optional
//!   auto-play schedule. Emits [`FlipEvent`]s and exposes a [`FlipState`]
//!   snapshot plus a revision counter for renderers.
//! - [`FlipOptions`] / [`FlipConfig`]: partial options merged over defaults.
//! - [`PointerInput`] / [`HorizontalDrag`]: mouse and touch input normalized to
//!   a primary horizontal coordinate, and drag displacement normalized to page
//!   widths.
//! - [`Easing`]: CSS-style timing curves for the flip transition.
//!
//! The crate does **not** render anything, own a clock, or schedule host
//! timers. Hosts are responsible for:
//!
//! - Forwarding pointer events to the `handle_drag_*` methods.
//! - Passing a monotonic millisecond timestamp to time-dependent calls and
//!   calling [`BookFlip::tick`] from a frame or timer callback.
//! - Drawing pages from [`BookFlip::state`], [`BookFlip::config`], and
//!   [`BookFlip::eased_progress`].
//! - Calling [`BookFlip::dispose`] when the view goes away.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_page_flip::{BookFlip, FlipOptions, Page, PointerInput};
//!
//! let pages = vec![
//!     Page::new("cover.png", "inside.png"),
//!     Page::new("p1.png", "p2.png"),
//! ];
//! let config = FlipOptions { width: Some(800.0), ..FlipOptions::default() }
//!     .resolve()
//!     .unwrap();
//! let mut book = BookFlip::new(pages, config);
//! book.mount(0);
//!
//! // Drag 320px to the left: -320 / 400 = -0.8 of a page.
//! book.handle_drag_start(&PointerInput::mouse(Point::new(100.0, 300.0)), 16);
//! book.handle_drag_move(&PointerInput::mouse(Point::new(-220.0, 300.0)));
//! assert_eq!(book.drag_progress(), -0.8);
//!
//! // Past the commit threshold, so releasing turns the page.
//! assert!(book.handle_drag_end(32));
//! assert_eq!(book.current_page(), 1);
//! assert_eq!(book.drag_progress(), 0.0);
//!
//! // The flip-lock holds until the configured duration has elapsed.
//! assert!(book.is_flipping());
//! book.tick(32 + book.config().duration);
//! assert!(!book.is_flipping());
//!
//! book.dispose();
//! ```
//!
//! ## Features
//!
//! - `serde`: `Deserialize` for [`FlipOptions`] (camelCase keys, unknown keys
//!   ignored), [`AnimationStyle`], and [`Easing`] (from CSS text).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod book;
mod config;
mod easing;
mod pointer;

pub use book::{BookFlip, DRAG_COMMIT_THRESHOLD, FlipEvent, FlipState, MAX_QUEUED_EVENTS, Page};
pub use config::{AnimationStyle, ConfigError, FlipConfig, FlipOptions};
pub use easing::Easing;
pub use pointer::{HorizontalDrag, PointerInput};
