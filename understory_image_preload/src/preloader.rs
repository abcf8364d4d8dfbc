// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deduplicating image preload cache.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{Completion, FetchOutcome, FetchRequest, ImageFetcher, RequestId};

/// A fetch in flight and everyone waiting for it.
#[derive(Debug)]
struct InFlight {
    id: RequestId,
    waiters: Vec<Completion>,
}

/// Warms an image cache ahead of display, one fetch per URL.
///
/// Requests for a URL that is already cached settle immediately, and requests
/// for a URL that is already being fetched share that fetch. Failures never
/// propagate: the completion settles anyway, the URL's loading state stays
/// `false`, and a warning is logged.
///
/// The preloader never blocks. Fetch results are applied when the host calls
/// [`pump`](Self::pump) from its UI turn; completions settle there.
///
/// Callbacks registered on returned completions run inside `pump` and
/// [`clear_cache`](Self::clear_cache) and must not call back into the
/// preloader.
///
/// ```
/// use understory_image_preload::{FetchOutcome, FetchRequest, ImageFetcher, ImagePreloader};
///
/// /// Resolves every request on the next pump with the URL's length.
/// #[derive(Default)]
/// struct LenFetcher(Vec<FetchRequest>);
///
/// impl ImageFetcher for LenFetcher {
///     type Image = usize;
///     type Error = &'static str;
///
///     fn start(&mut self, request: FetchRequest) {
///         self.0.push(request);
///     }
///
///     fn poll_settled(&mut self) -> Option<FetchOutcome<usize, &'static str>> {
///         let request = self.0.pop()?;
///         let len = request.url.len();
///         Some(request.into_outcome(Ok(len)))
///     }
/// }
///
/// let mut preloader = ImagePreloader::new(LenFetcher::default());
/// let done = preloader.preload_images(["a.png", "", "cover.jpg"]);
/// assert!(!done.is_settled());
///
/// preloader.pump();
/// assert!(done.is_settled());
/// assert!(preloader.is_loaded("cover.jpg"));
/// assert_eq!(preloader.image("a.png"), Some(&5));
/// ```
#[derive(Debug)]
pub struct ImagePreloader<F: ImageFetcher> {
    fetcher: F,
    preloaded: HashMap<String, F::Image>,
    loading: HashMap<String, InFlight>,
    states: HashMap<String, bool>,
    next_request: u64,
    revision: u64,
}

impl<F: ImageFetcher> ImagePreloader<F> {
    /// Creates an empty preloader that loads through `fetcher`.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            preloaded: HashMap::new(),
            loading: HashMap::new(),
            states: HashMap::new(),
            next_request: 0,
            revision: 0,
        }
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Mutable access to the underlying fetcher.
    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Preloads `url`, returning a completion that settles when the load does.
    ///
    /// Empty and already cached URLs settle immediately; a URL already in
    /// flight shares the existing fetch.
    pub fn preload_image(&mut self, url: &str) -> Completion {
        if url.is_empty() || self.preloaded.contains_key(url) {
            return Completion::settled();
        }

        let completion = Completion::pending();
        if let Some(in_flight) = self.loading.get_mut(url) {
            in_flight.waiters.push(completion.clone());
            return completion;
        }

        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.loading.insert(
            url.to_string(),
            InFlight {
                id,
                waiters: alloc::vec![completion.clone()],
            },
        );
        self.states.insert(url.to_string(), false);
        self.bump();
        self.fetcher.start(FetchRequest {
            id,
            url: url.to_string(),
        });
        completion
    }

    /// Preloads every non-empty URL; the completion settles once all have.
    ///
    /// An input without any non-empty URL yields an already settled completion.
    pub fn preload_images<I>(&mut self, urls: I) -> Completion
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let parts: Vec<Completion> = urls
            .into_iter()
            .filter(|url| !url.as_ref().is_empty())
            .map(|url| self.preload_image(url.as_ref()))
            .collect();
        Completion::all(parts)
    }

    /// Applies every fetch result that has settled since the last call.
    ///
    /// Returns how many results were taken from the fetcher, including
    /// discarded ones.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Some(outcome) = self.fetcher.poll_settled() {
            self.apply(outcome);
            count += 1;
        }
        count
    }

    fn apply(&mut self, outcome: FetchOutcome<F::Image, F::Error>) {
        let FetchOutcome { id, url, result } = outcome;
        let current = self.loading.get(&url).is_some_and(|f| f.id == id);
        let Some(in_flight) = current.then(|| self.loading.remove(&url)).flatten() else {
            log::trace!("discarding result of abandoned preload {url}");
            return;
        };

        match result {
            Ok(image) => {
                self.states.insert(url.clone(), true);
                self.preloaded.insert(url, image);
            }
            Err(err) => {
                log::warn!("failed to preload image {url}: {err}");
                self.states.insert(url, false);
            }
        }
        self.bump();

        for waiter in in_flight.waiters {
            waiter.settle();
        }
    }

    /// Whether `url` is in the cache.
    pub fn is_loaded(&self, url: &str) -> bool {
        self.preloaded.contains_key(url)
    }

    /// Whether a fetch for `url` is in flight.
    pub fn is_loading(&self, url: &str) -> bool {
        self.loading.contains_key(url)
    }

    /// Last known loading state of `url`: `true` once loaded, `false` while
    /// loading, after a failure, or when never requested.
    pub fn loading_state(&self, url: &str) -> bool {
        self.states.get(url).copied().unwrap_or(false)
    }

    /// Every URL with a known loading state.
    pub fn loading_states(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.states.iter().map(|(url, state)| (url.as_str(), *state))
    }

    /// The cached image for `url`.
    pub fn image(&self, url: &str) -> Option<&F::Image> {
        self.preloaded.get(url)
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.preloaded.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.preloaded.is_empty()
    }

    /// Number of fetches in flight.
    pub fn in_flight(&self) -> usize {
        self.loading.len()
    }

    /// Counter bumped whenever the cache, in-flight set, or loading states change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Empties the cache, the in-flight set, and the loading states.
    ///
    /// Completions waiting on in-flight fetches settle now. Those fetches may
    /// still finish in the fetcher, but their results are discarded.
    pub fn clear_cache(&mut self) {
        let abandoned: Vec<InFlight> = self.loading.drain().map(|(_, f)| f).collect();
        let changed =
            !abandoned.is_empty() || !self.preloaded.is_empty() || !self.states.is_empty();
        self.preloaded.clear();
        self.states.clear();
        if changed {
            self.bump();
        }
        for in_flight in abandoned {
            for waiter in in_flight.waiters {
                waiter.settle();
            }
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl<F: ImageFetcher> Drop for ImagePreloader<F> {
    fn drop(&mut self) {
        self.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::vec;

    /// Fetcher whose requests settle only when a test says so.
    #[derive(Debug, Default)]
    struct ManualFetcher {
        started: Vec<FetchRequest>,
        settled: VecDeque<FetchOutcome<u32, &'static str>>,
    }

    impl ManualFetcher {
        fn finish(&mut self, url: &str, result: Result<u32, &'static str>) {
            let index = self
                .started
                .iter()
                .position(|r| r.url == url)
                .expect("request was started");
            let request = self.started.remove(index);
            self.settled.push_back(request.into_outcome(result));
        }
    }

    impl ImageFetcher for ManualFetcher {
        type Image = u32;
        type Error = &'static str;

        fn start(&mut self, request: FetchRequest) {
            self.started.push(request);
        }

        fn poll_settled(&mut self) -> Option<FetchOutcome<u32, &'static str>> {
            self.settled.pop_front()
        }
    }

    fn preloader() -> ImagePreloader<ManualFetcher> {
        ImagePreloader::new(ManualFetcher::default())
    }

    #[test]
    fn empty_url_settles_without_touching_state() {
        let mut preloader = preloader();
        let done = preloader.preload_image("");
        assert!(done.is_settled());
        assert!(preloader.is_empty());
        assert_eq!(preloader.loading_states().count(), 0);
        assert!(preloader.fetcher().started.is_empty());
        assert_eq!(preloader.revision(), 0);
    }

    #[test]
    fn successful_load_is_cached() {
        let mut preloader = preloader();
        let done = preloader.preload_image("a.png");
        assert!(!done.is_settled());
        assert!(preloader.is_loading("a.png"));
        assert!(!preloader.loading_state("a.png"));

        preloader.fetcher_mut().finish("a.png", Ok(7));
        assert_eq!(preloader.pump(), 1);

        assert!(done.is_settled());
        assert!(preloader.is_loaded("a.png"));
        assert!(preloader.loading_state("a.png"));
        assert!(!preloader.is_loading("a.png"));
        assert_eq!(preloader.image("a.png"), Some(&7));
    }

    #[test]
    fn cached_url_settles_immediately_without_refetching() {
        let mut preloader = preloader();
        preloader.preload_image("a.png");
        preloader.fetcher_mut().finish("a.png", Ok(1));
        preloader.pump();

        assert!(preloader.preload_image("a.png").is_settled());
        assert!(preloader.fetcher().started.is_empty());
    }

    #[test]
    fn concurrent_requests_share_one_fetch() {
        let mut preloader = preloader();
        let first = preloader.preload_image("a.png");
        let second = preloader.preload_image("a.png");
        assert_eq!(preloader.fetcher().started.len(), 1);
        assert_eq!(preloader.in_flight(), 1);

        preloader.fetcher_mut().finish("a.png", Ok(1));
        preloader.pump();
        assert!(first.is_settled());
        assert!(second.is_settled());
    }

    #[test]
    fn failure_settles_and_stays_unloaded() {
        let mut preloader = preloader();
        let done = preloader.preload_image("missing.png");
        preloader.fetcher_mut().finish("missing.png", Err("404"));
        preloader.pump();

        assert!(done.is_settled());
        assert!(!preloader.is_loaded("missing.png"));
        assert!(!preloader.loading_state("missing.png"));
        assert!(!preloader.is_loading("missing.png"));
        assert_eq!(
            preloader.loading_states().collect::<Vec<_>>(),
            vec![("missing.png", false)]
        );

        // A failed URL may be retried.
        preloader.preload_image("missing.png");
        assert_eq!(preloader.fetcher().started.len(), 1);
    }

    #[test]
    fn unknown_url_state_is_false() {
        let preloader = preloader();
        assert!(!preloader.loading_state("never.png"));
        assert!(!preloader.is_loaded("never.png"));
    }

    #[test]
    fn batch_settles_after_all_parts() {
        let mut preloader = preloader();
        let batch = preloader.preload_images(["a.png", "", "b.png", "a.png"]);
        assert_eq!(preloader.fetcher().started.len(), 2);

        preloader.fetcher_mut().finish("a.png", Ok(1));
        preloader.pump();
        assert!(!batch.is_settled());

        preloader.fetcher_mut().finish("b.png", Err("corrupt"));
        preloader.pump();
        assert!(batch.is_settled());
        assert!(preloader.is_loaded("a.png"));
        assert!(!preloader.is_loaded("b.png"));
    }

    #[test]
    fn empty_batch_is_settled() {
        let mut preloader = preloader();
        let none: [&str; 0] = [];
        assert!(preloader.preload_images(none).is_settled());
        assert!(preloader.preload_images(["", ""]).is_settled());
        assert_eq!(preloader.in_flight(), 0);
    }

    #[test]
    fn clear_cache_forgets_everything() {
        let mut preloader = preloader();
        for url in ["a.png", "b.png"] {
            preloader.preload_image(url);
            preloader.fetcher_mut().finish(url, Ok(0));
        }
        preloader.pump();
        assert_eq!(preloader.len(), 2);

        preloader.clear_cache();
        assert!(!preloader.is_loaded("a.png"));
        assert!(!preloader.is_loaded("b.png"));
        assert!(!preloader.loading_state("a.png"));
        assert_eq!(preloader.loading_states().count(), 0);
    }

    #[test]
    fn clear_cache_settles_waiters_and_drops_late_results() {
        let mut preloader = preloader();
        let abandoned = preloader.preload_image("a.png");
        preloader.clear_cache();
        assert!(abandoned.is_settled());
        assert_eq!(preloader.in_flight(), 0);

        // Requested again before the abandoned fetch reports back.
        let fresh = preloader.preload_image("a.png");
        assert_eq!(preloader.fetcher().started.len(), 2);

        preloader.fetcher_mut().finish("a.png", Ok(1));
        preloader.pump();
        assert!(!preloader.is_loaded("a.png"));
        assert!(!fresh.is_settled());

        preloader.fetcher_mut().finish("a.png", Ok(2));
        preloader.pump();
        assert!(fresh.is_settled());
        assert_eq!(preloader.image("a.png"), Some(&2));
    }

    #[test]
    fn clear_on_empty_cache_keeps_revision() {
        let mut preloader = preloader();
        preloader.clear_cache();
        assert_eq!(preloader.revision(), 0);
    }
}
