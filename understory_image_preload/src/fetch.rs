// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the preloader and whatever actually loads images.

use alloc::string::String;
use core::fmt;

/// Identifies one fetch started by an [`ImagePreloader`](crate::ImagePreloader).
///
/// Fetchers must echo it back in the matching [`FetchOutcome`]; the preloader
/// uses it to discard results of fetches abandoned by
/// [`clear_cache`](crate::ImagePreloader::clear_cache).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    /// Returns the raw numeric value of this identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A request to load the image at `url`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Request identifier to echo back.
    pub id: RequestId,
    /// The image location, as given to the preloader.
    pub url: String,
}

impl FetchRequest {
    /// Builds the outcome for this request.
    pub fn into_outcome<I, E>(self, result: Result<I, E>) -> FetchOutcome<I, E> {
        FetchOutcome {
            id: self.id,
            url: self.url,
            result,
        }
    }
}

/// The settled result of a [`FetchRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome<I, E> {
    /// Identifier of the originating request.
    pub id: RequestId,
    /// The image location of the originating request.
    pub url: String,
    /// The loaded image handle, or why loading failed.
    pub result: Result<I, E>,
}

/// Loads images on behalf of an [`ImagePreloader`](crate::ImagePreloader).
///
/// Fetching is asynchronous from the preloader's point of view: [`start`]
/// must return promptly, and the outcome is picked up later through
/// [`poll_settled`] when the host calls
/// [`ImagePreloader::pump`](crate::ImagePreloader::pump). Implementations
/// might hand work to decoder threads, a browser `Image` element, or an HTTP
/// client; they must eventually settle every request they accept.
///
/// [`start`]: ImageFetcher::start
/// [`poll_settled`]: ImageFetcher::poll_settled
pub trait ImageFetcher {
    /// Handle to a loaded image, kept in the preloader's cache.
    type Image;
    /// Why a load failed; only ever logged.
    type Error: fmt::Display;

    /// Begins loading `request.url`.
    fn start(&mut self, request: FetchRequest);

    /// Returns the next settled fetch, if any, without blocking.
    fn poll_settled(&mut self) -> Option<FetchOutcome<Self::Image, Self::Error>>;
}
