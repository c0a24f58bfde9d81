//! Mock objects and fake implementations for testing
//!
//! [`MockPopupHost`] stands in for the browser window. Each popup it opens
//! replays a [`PopupScript`]: timed messages posted to the opener and an
//! optional user close, driven by tokio timers so tests can run on a paused
//! clock. [`FailingSessionStorage`] is a storage backend whose reads or
//! writes always fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::popup::{MessageBus, PopupHost, PopupWindow, ScreenMetrics, WindowMessage};
use crate::session::{SessionStorage, SessionStoreError};

#[derive(Debug, Clone)]
enum ScriptStep {
    Post(Duration, WindowMessage),
    Close(Duration),
}

/// What a mock popup does once opened
///
/// Step delays are relative to the previous step, the first one to the open.
#[derive(Debug, Clone, Default)]
pub struct PopupScript {
    blocked: bool,
    steps: Vec<ScriptStep>,
}

impl PopupScript {
    /// A popup that never messages and never closes
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// The platform refuses to open the popup
    #[must_use]
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            steps: Vec::new(),
        }
    }

    /// Post `message` to the opener after `delay`
    #[must_use]
    pub fn post_after(mut self, delay: Duration, message: WindowMessage) -> Self {
        self.steps.push(ScriptStep::Post(delay, message));
        self
    }

    /// The user closes the popup after `delay`
    #[must_use]
    pub fn close_after(mut self, delay: Duration) -> Self {
        self.steps.push(ScriptStep::Close(delay));
        self
    }
}

#[derive(Debug, Default)]
struct WindowState {
    closed: AtomicBool,
    closed_programmatically: AtomicBool,
    close_calls: AtomicUsize,
}

/// Test-side view of a popup opened by [`MockPopupHost`]
#[derive(Debug, Clone, Default)]
pub struct MockWindowHandle {
    state: Arc<WindowState>,
}

impl MockWindowHandle {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Whether the broker closed the window (as opposed to the user)
    #[must_use]
    pub fn closed_programmatically(&self) -> bool {
        self.state.closed_programmatically.load(Ordering::SeqCst)
    }

    /// Number of times the broker called `close`
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    /// Simulate the user closing the window
    pub fn close_by_user(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

struct MockWindow {
    handle: MockWindowHandle,
}

impl PopupWindow for MockWindow {
    fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn close(&mut self) {
        let state = &self.handle.state;
        state.close_calls.fetch_add(1, Ordering::SeqCst);
        if !state.closed.swap(true, Ordering::SeqCst) {
            state.closed_programmatically.store(true, Ordering::SeqCst);
        }
    }
}

/// Arguments of one `open` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedPopup {
    pub url: String,
    pub window_name: String,
    pub features: String,
}

/// Scripted [`PopupHost`]
pub struct MockPopupHost {
    screen: ScreenMetrics,
    script: PopupScript,
    bus: MessageBus,
    opened: Mutex<Vec<OpenedPopup>>,
    windows: Mutex<Vec<MockWindowHandle>>,
}

impl MockPopupHost {
    #[must_use]
    pub fn new(script: PopupScript) -> Self {
        Self {
            screen: ScreenMetrics::default(),
            script,
            bus: MessageBus::new(),
            opened: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_screen(mut self, screen: ScreenMetrics) -> Self {
        self.screen = screen;
        self
    }

    /// Every `open` call so far, blocked ones included
    #[must_use]
    pub fn opened(&self) -> Vec<OpenedPopup> {
        self.opened.lock().unwrap().clone()
    }

    #[must_use]
    pub fn opened_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Handle to the most recently opened window
    #[must_use]
    pub fn last_window(&self) -> Option<MockWindowHandle> {
        self.windows.lock().unwrap().last().cloned()
    }

    fn play(&self, handle: MockWindowHandle) {
        if self.script.steps.is_empty() {
            return;
        }
        let steps = self.script.steps.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            for step in steps {
                match step {
                    ScriptStep::Post(delay, message) => {
                        tokio::time::sleep(delay).await;
                        bus.post(&message);
                    }
                    ScriptStep::Close(delay) => {
                        tokio::time::sleep(delay).await;
                        handle.close_by_user();
                    }
                }
            }
        });
    }
}

impl PopupHost for MockPopupHost {
    fn screen_metrics(&self) -> ScreenMetrics {
        self.screen
    }

    fn open(&self, url: &str, window_name: &str, features: &str) -> Option<Box<dyn PopupWindow>> {
        self.opened.lock().unwrap().push(OpenedPopup {
            url: url.to_string(),
            window_name: window_name.to_string(),
            features: features.to_string(),
        });
        if self.script.blocked {
            return None;
        }

        let handle = MockWindowHandle::default();
        self.windows.lock().unwrap().push(handle.clone());
        self.play(handle.clone());
        Some(Box::new(MockWindow { handle }))
    }

    fn messages(&self) -> &MessageBus {
        &self.bus
    }
}

/// Session storage that fails on demand and stores nothing
#[derive(Debug, Default)]
pub struct FailingSessionStorage {
    fail_reads: bool,
    fail_writes: bool,
    write_attempts: AtomicUsize,
}

impl FailingSessionStorage {
    /// Every read fails; writes succeed but are discarded
    #[must_use]
    pub fn reads_fail() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Every write fails; reads find nothing
    #[must_use]
    pub fn writes_fail() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Number of `set_item`/`remove_item` calls so far
    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn write(&self) -> Result<(), SessionStoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(std::io::Error::other("session storage is read-only").into());
        }
        Ok(())
    }
}

impl SessionStorage for FailingSessionStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, SessionStoreError> {
        if self.fail_reads {
            return Err(std::io::Error::other("session storage is unreadable").into());
        }
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), SessionStoreError> {
        self.write()
    }

    fn remove_item(&self, _key: &str) -> Result<(), SessionStoreError> {
        self.write()
    }
}
