// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Threaded local-file decoding fetcher.

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use std::vec::Vec;

use alloc::collections::VecDeque;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use image::ImageReader;

use crate::{FetchOutcome, FetchRequest, ImageFetcher};

/// An image decoded to straight RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba", &format_args!("[{} bytes]", self.rgba.len()))
            .finish()
    }
}

/// Why [`DecodeFetcher`] could not load an image.
#[derive(Debug)]
pub enum DecodeError {
    /// The file could not be opened or read.
    Io(io::Error),
    /// The file is not an image the decoder understands.
    Decode(image::ImageError),
    /// The decoder threads are gone, so the request was never attempted.
    Disconnected,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read image: {err}"),
            Self::Decode(err) => write!(f, "could not decode image: {err}"),
            Self::Disconnected => f.write_str("decoder threads are not running"),
        }
    }
}

impl core::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Disconnected => None,
        }
    }
}

type DecodeOutcome = FetchOutcome<DecodedImage, DecodeError>;

/// An [`ImageFetcher`] that decodes local files on worker threads.
///
/// URLs are filesystem paths, optionally prefixed with `file://`. Requests
/// are queued to a pool of decoder threads; results come back over a channel
/// and are handed to the preloader on [`pump`](crate::ImagePreloader::pump).
/// Dropping the fetcher closes the queue and joins the threads once they
/// finish their current file.
#[derive(Debug)]
pub struct DecodeFetcher {
    jobs: Option<Sender<FetchRequest>>,
    results: Receiver<DecodeOutcome>,
    rejected: VecDeque<DecodeOutcome>,
    workers: Vec<JoinHandle<()>>,
}

impl Default for DecodeFetcher {
    fn default() -> Self {
        Self::new(suggested_decoder_threads())
    }
}

impl DecodeFetcher {
    /// Spawns `threads` decoder threads (at least one).
    pub fn new(threads: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<FetchRequest>();
        let (result_tx, result_rx) = unbounded();
        let workers = (0..threads.max(1))
            .filter_map(|i| {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                thread::Builder::new()
                    .name(std::format!("image-decode-{i}"))
                    .spawn(move || decode_worker(&jobs, &results))
                    .inspect_err(|err| log::warn!("could not spawn image decoder thread: {err}"))
                    .ok()
            })
            .collect();

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            rejected: VecDeque::new(),
            workers,
        }
    }

    /// Number of running decoder threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Blocks for up to `timeout` until a result is available.
    ///
    /// Useful for tools and tests without a UI loop; interactive hosts should
    /// use [`ImagePreloader::pump`](crate::ImagePreloader::pump) instead.
    pub fn wait_settled(&mut self, timeout: Duration) -> Option<DecodeOutcome> {
        if let Some(outcome) = self.rejected.pop_front() {
            return Some(outcome);
        }
        match self.results.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl ImageFetcher for DecodeFetcher {
    type Image = DecodedImage;
    type Error = DecodeError;

    fn start(&mut self, request: FetchRequest) {
        let request = match &self.jobs {
            Some(jobs) if !self.workers.is_empty() => match jobs.send(request) {
                Ok(()) => return,
                Err(err) => err.into_inner(),
            },
            _ => request,
        };
        self.rejected
            .push_back(request.into_outcome(Err(DecodeError::Disconnected)));
    }

    fn poll_settled(&mut self) -> Option<DecodeOutcome> {
        self.rejected
            .pop_front()
            .or_else(|| self.results.try_recv().ok())
    }
}

impl Drop for DecodeFetcher {
    fn drop(&mut self) {
        // Closing the job queue ends each worker's receive loop.
        self.jobs = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("image decoder thread panicked");
            }
        }
    }
}

fn decode_worker(jobs: &Receiver<FetchRequest>, results: &Sender<DecodeOutcome>) {
    for request in jobs.iter() {
        let result = decode_file(&request.url);
        if results.send(request.into_outcome(result)).is_err() {
            return;
        }
    }
}

fn decode_file(url: &str) -> Result<DecodedImage, DecodeError> {
    let path = url.strip_prefix("file://").unwrap_or(url);
    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(DecodeError::Io)?
        .decode()
        .map_err(DecodeError::Decode)?;
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// About three quarters of the logical cores, so decoding never starves the UI thread.
fn suggested_decoder_threads() -> usize {
    let logical = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    ((logical * 3) / 4).clamp(1, 8)
}
