//! Notification adapters.

use async_trait::async_trait;

use crate::infrastructure::ports::{NotifierPort, NotifyError};

/// Notifier that logs instead of sending. Default for embedders that
/// wire no outbound email service.
pub struct NoopNotifier;

#[async_trait]
impl NotifierPort for NoopNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        tracing::debug!(to, subject, "notification suppressed (noop notifier)");
        Ok(())
    }
}
