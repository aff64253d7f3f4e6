use tokio::sync::mpsc;

use super::AuthEvent;

type CancelFn = Box<dyn FnOnce() + Send>;

/// Cancellable stream of provider notifications.
///
/// The unsubscribe callback runs exactly once: on the first `cancel`, or on
/// drop if `cancel` was never called.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<AuthEvent>,
    cancel: Option<CancelFn>,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<AuthEvent>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { events, cancel: Some(Box::new(cancel)) }
    }

    /// Next notification, or `None` once the provider closed the stream or
    /// the subscription was cancelled.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        if self.cancel.is_none() {
            return None;
        }
        self.events.recv().await
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            self.events.close();
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}
