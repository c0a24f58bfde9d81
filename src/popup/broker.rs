//! Popup OAuth broker
//!
//! Drives a third-party OAuth flow inside a child window and waits for the
//! callback page to post the result back. Three events race to settle a flow:
//! a qualifying message, the popup being observed closed, and the overall
//! timeout. They are polled from a single `select!`, so exactly one of them
//! settles the flow and the other two are dropped with it.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::host::{MessageListener, PopupHost, PopupWindow};
use super::types::{AuthResult, PopupGeometry, PopupOptions, WindowMessage};
use crate::utils::logging::LoggingHelper;

/// Shortest closed-poll period; a zero period would never yield
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Ways a popup flow can fail
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopupError {
    /// The platform refused to open the popup
    #[error("Popup blocked")]
    PopupBlocked,

    /// The popup was closed before a qualifying message arrived
    #[error("Popup closed before authentication completed")]
    UserCancelled,

    /// Neither a message nor a close happened within the timeout
    #[error("Authentication timed out after {0:?}")]
    TimedOut(Duration),

    /// Another flow is already pending on this broker
    #[error("Another popup authentication flow is already in progress")]
    FlowInProgress,
}

/// Resources owned by one in-flight popup attempt
///
/// Released exactly once, either explicitly when the flow settles or on drop if
/// the flow future is abandoned by its caller.
struct PendingAuthRequest {
    popup: Option<Box<dyn PopupWindow>>,
    listener: Option<MessageListener>,
}

impl PendingAuthRequest {
    fn release(&mut self) {
        // Deregister first so nothing is processed once the popup goes away
        if let Some(listener) = self.listener.take() {
            listener.remove();
        }
        if let Some(mut popup) = self.popup.take() {
            if !popup.is_closed() {
                popup.close();
            }
        }
    }
}

impl Drop for PendingAuthRequest {
    fn drop(&mut self) {
        self.release();
    }
}

/// Clears the broker's in-flight flag when the flow ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Opens OAuth popups and waits for their result
pub struct PopupAuthBroker {
    host: Arc<dyn PopupHost>,
    in_flight: AtomicBool,
}

impl PopupAuthBroker {
    #[must_use]
    pub fn new(host: Arc<dyn PopupHost>) -> Self {
        Self {
            host,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a flow is currently pending
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Open `authorization_url` in a centered popup and wait for the result
    ///
    /// Dropping the returned future closes the popup and deregisters the
    /// message listener.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A flow is already pending on this broker
    /// - The popup could not be opened
    /// - The user closed the popup before the result arrived
    /// - No result arrived within `options.timeout`
    pub async fn run_popup_flow(
        &self,
        authorization_url: &str,
        options: &PopupOptions,
    ) -> Result<AuthResult, PopupError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PopupError::FlowInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let geometry =
            PopupGeometry::centered(self.host.screen_metrics(), options.width, options.height);
        let Some(popup) =
            self.host
                .open(authorization_url, &options.window_name, &geometry.features())
        else {
            LoggingHelper::log_popup_blocked(&options.window_name);
            return Err(PopupError::PopupBlocked);
        };
        LoggingHelper::log_popup_opened(&options.window_name, &geometry);

        let mut pending = PendingAuthRequest {
            popup: Some(popup),
            listener: Some(self.host.messages().add_listener()),
        };

        let outcome = wait_for_settlement(&mut pending, options).await;
        pending.release();

        LoggingHelper::log_popup_settled(&options.window_name, outcome.as_ref().err());
        outcome
    }
}

/// Race message, closed-poll and timeout until one of them settles the flow
async fn wait_for_settlement(
    pending: &mut PendingAuthRequest,
    options: &PopupOptions,
) -> Result<AuthResult, PopupError> {
    let PendingAuthRequest { popup, listener } = pending;

    let deadline = tokio::time::sleep(options.timeout);
    tokio::pin!(deadline);

    let mut poll = tokio::time::interval(options.poll_interval.max(MIN_POLL_INTERVAL));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    poll.tick().await;

    let mut listening = true;
    loop {
        tokio::select! {
            biased;

            message = next_message(listener), if listening => match message {
                Some(message) => {
                    if let Some(result) = accept_message(message, options) {
                        return Ok(result);
                    }
                }
                None => listening = false,
            },
            _ = poll.tick() => {
                if popup.as_ref().is_none_or(|window| window.is_closed()) {
                    return Err(PopupError::UserCancelled);
                }
            }
            () = &mut deadline => return Err(PopupError::TimedOut(options.timeout)),
        }
    }
}

async fn next_message(listener: &mut Option<MessageListener>) -> Option<WindowMessage> {
    match listener {
        Some(listener) => listener.recv().await,
        None => None,
    }
}

/// Filter an incoming message down to a qualifying [`AuthResult`]
///
/// Messages from non-allowed origins or without the exact protocol tag belong
/// to somebody else (extensions, iframes, the page itself) and are ignored.
fn accept_message(message: WindowMessage, options: &PopupOptions) -> Option<AuthResult> {
    if !options.is_origin_allowed(&message.origin) {
        LoggingHelper::log_popup_message_ignored(&message.origin, "origin not allowed");
        return None;
    }

    let source = message.data.get("source").and_then(Value::as_str);
    if source != Some(options.message_source.as_str()) {
        LoggingHelper::log_popup_message_ignored(&message.origin, "source tag mismatch");
        return None;
    }

    match serde_json::from_value::<AuthResult>(message.data) {
        Ok(result) => Some(result),
        Err(e) => {
            LoggingHelper::log_popup_message_ignored(&message.origin, &e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::types::DEFAULT_MESSAGE_SOURCE;
    use crate::testing::mock::{MockPopupHost, PopupScript};
    use serde_json::json;

    fn tagged(data: Value) -> WindowMessage {
        WindowMessage::new(
            "https://api.smarthire.example",
            json!({ "source": DEFAULT_MESSAGE_SOURCE, "data": data }),
        )
    }

    #[test]
    fn test_accept_message_requires_exact_tag() {
        let options = PopupOptions::default();

        let untagged = WindowMessage::new("https://a.example", json!({ "data": {} }));
        assert!(accept_message(untagged, &options).is_none());

        let wrong_tag = WindowMessage::new(
            "https://a.example",
            json!({ "source": "react-devtools-bridge", "data": {} }),
        );
        assert!(accept_message(wrong_tag, &options).is_none());

        let not_an_object = WindowMessage::new("https://a.example", json!("smarthire-linkedin"));
        assert!(accept_message(not_an_object, &options).is_none());

        let result = accept_message(tagged(json!({ "access_token": "tok" })), &options)
            .expect("tagged message should be accepted");
        assert_eq!(result.access_token(), Some("tok"));
    }

    #[test]
    fn test_accept_message_honours_origin_allow_list() {
        let options = PopupOptions::default()
            .with_allowed_origins(vec!["https://api.smarthire.example".to_string()]);

        assert!(accept_message(tagged(json!({})), &options).is_some());

        let foreign = WindowMessage::new(
            "https://evil.example",
            json!({ "source": DEFAULT_MESSAGE_SOURCE, "data": { "access_token": "x" } }),
        );
        assert!(accept_message(foreign, &options).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_flow_is_rejected_while_first_is_pending() {
        let host = Arc::new(MockPopupHost::new(PopupScript::idle()));
        let broker = Arc::new(PopupAuthBroker::new(host.clone()));
        let options = PopupOptions::default().with_timeout(Duration::from_secs(5));

        let first = tokio::spawn({
            let broker = broker.clone();
            let options = options.clone();
            async move {
                broker
                    .run_popup_flow("https://provider.example/auth", &options)
                    .await
            }
        });
        while host.opened_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(broker.is_in_flight());

        let second = broker
            .run_popup_flow("https://provider.example/auth", &options)
            .await;
        assert_eq!(second, Err(PopupError::FlowInProgress));
        assert_eq!(host.opened_count(), 1);

        let first = first.await.expect("flow task panicked");
        assert_eq!(first, Err(PopupError::TimedOut(Duration::from_secs(5))));
        assert!(!broker.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_flow_releases_everything() {
        let host = Arc::new(MockPopupHost::new(PopupScript::idle()));
        let broker = PopupAuthBroker::new(host.clone());
        let options = PopupOptions::default();

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            broker.run_popup_flow("https://provider.example/auth", &options),
        )
        .await;
        assert!(abandoned.is_err());

        assert_eq!(host.messages().listener_count(), 0);
        assert!(host.last_window().is_some_and(|w| w.closed_programmatically()));
        assert!(!broker.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_popup_opened_with_centered_features() {
        let host = Arc::new(
            MockPopupHost::new(PopupScript::idle().post_after(
                Duration::from_millis(10),
                tagged(json!({ "access_token": "tok" })),
            ))
            .with_screen(crate::popup::types::ScreenMetrics {
                screen_x: 0,
                screen_y: 0,
                outer_width: 1000,
                outer_height: 900,
            }),
        );
        let broker = PopupAuthBroker::new(host.clone());
        let options = PopupOptions::default().with_window_name("linkedin_oauth");

        broker
            .run_popup_flow("https://provider.example/auth", &options)
            .await
            .expect("flow should resolve");

        let opened = host.opened().pop().expect("popup should have been opened");
        assert_eq!(opened.url, "https://provider.example/auth");
        assert_eq!(opened.window_name, "linkedin_oauth");
        assert!(opened.features.starts_with("width=600,height=700,left=200,top=100,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_still_detects_close() {
        let host = Arc::new(MockPopupHost::new(
            PopupScript::idle().close_after(Duration::from_millis(300)),
        ));
        let broker = PopupAuthBroker::new(host.clone());
        let options = PopupOptions::default().with_poll_interval(Duration::ZERO);

        let started = tokio::time::Instant::now();
        let result = broker
            .run_popup_flow("https://provider.example/auth", &options)
            .await;

        assert_eq!(result, Err(PopupError::UserCancelled));
        assert!(started.elapsed() <= Duration::from_millis(301));
        assert_eq!(host.messages().listener_count(), 0);
    }
}
