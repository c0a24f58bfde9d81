//! In-memory browser location

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use crate::session::BrowserLocation;

/// Address bar and history stand-in that records how the URL was changed
#[derive(Debug)]
pub struct MemoryLocation {
    url: Mutex<Url>,
    replacements: AtomicUsize,
    pushes: AtomicUsize,
}

impl MemoryLocation {
    /// # Panics
    ///
    /// Panics if `url` is not an absolute URL.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(Url::parse(url).expect("test location must be an absolute URL")),
            replacements: AtomicUsize::new(0),
            pushes: AtomicUsize::new(0),
        }
    }

    /// Navigate by pushing a new history entry
    ///
    /// # Panics
    ///
    /// Panics if `url` is not an absolute URL.
    pub fn push(&self, url: &str) {
        *self.url.lock().unwrap() = Url::parse(url).expect("test location must be an absolute URL");
        self.pushes.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of history replacements so far
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.replacements.load(Ordering::SeqCst)
    }

    /// Number of history pushes so far
    #[must_use]
    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

impl BrowserLocation for MemoryLocation {
    fn current_url(&self) -> Url {
        self.url.lock().unwrap().clone()
    }

    fn replace_url(&self, url: &Url) {
        *self.url.lock().unwrap() = url.clone();
        self.replacements.fetch_add(1, Ordering::SeqCst);
    }
}
