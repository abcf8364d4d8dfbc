// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_image_preload --heading-base-level=0

//! Understory Image Preload: warm an image cache ahead of display.
//!
//! Paginated viewers look best when the next few pages are already decoded by
//! the time they are shown. This crate provides:
//!
//! - [`ImagePreloader`]: a cache keyed by URL that deduplicates requests,
//!   shares in-flight fetches, and tracks a per-URL loading state. Failures
//!   degrade to "not loaded" and are only logged.
//! - [`Completion`]: a shared settle-once signal returned by every preload
//!   request. It can be polled, given callbacks, or awaited.
//! - [`ImageFetcher`]: the seam to whatever actually loads images. The
//!   preloader hands out [`FetchRequest`]s and collects [`FetchOutcome`]s when
//!   the host calls [`ImagePreloader::pump`].
//! - `DecodeFetcher` (feature `decode`): decodes local files on worker
//!   threads with the `image` crate.
//!
//! The preloader is single-threaded: all of its state changes inside
//! [`ImagePreloader::preload_image`], [`ImagePreloader::pump`] and
//! [`ImagePreloader::clear_cache`], which hosts call from their UI turn.
//!
//! ## Minimal example
//!
//! ```rust
//! # #[cfg(feature = "decode")]
//! # fn example() {
//! use std::time::{Duration, Instant};
//! use understory_image_preload::{DecodeFetcher, ImagePreloader};
//!
//! let mut preloader = ImagePreloader::new(DecodeFetcher::default());
//! let upcoming = preloader.preload_images(["pages/003.png", "pages/004.png"]);
//!
//! // In a real host, `pump` runs once per frame.
//! let deadline = Instant::now() + Duration::from_secs(5);
//! while !upcoming.is_settled() && Instant::now() < deadline {
//!     preloader.pump();
//!     std::thread::sleep(Duration::from_millis(5));
//! }
//!
//! if preloader.is_loaded("pages/003.png") {
//!     let page = preloader.image("pages/003.png").unwrap();
//!     assert_eq!(page.rgba.len(), (page.width * page.height * 4) as usize);
//! }
//! # }
//! ```
//!
//! ## Features
//!
//! - `std` (enabled by default): link the standard library.
//! - `decode` (enabled by default): `DecodeFetcher`, backed by `image` and
//!   `crossbeam-channel`. Implies `std`.
//!
//! Without `decode`, this crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod completion;
#[cfg(feature = "decode")]
mod decode;
mod fetch;
mod preloader;

pub use completion::Completion;
#[cfg(feature = "decode")]
pub use decode::{DecodeError, DecodeFetcher, DecodedImage};
pub use fetch::{FetchOutcome, FetchRequest, ImageFetcher, RequestId};
pub use preloader::ImagePreloader;
