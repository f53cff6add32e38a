//! Notification system for batch status updates.
//!
//! Push notifications about batch start, completion and failure are sent
//! through the ntfy.sh service when a topic is configured.
mod abstraction;
mod ntfy;

pub use abstraction::{NotificationSender, NotificationType, NullNotificationSender};
pub use ntfy::NtfyNotificationSender;

/// Sender for the configured topic, or a no-op sender when there is none.
///
/// An invalid topic URL is logged and treated like a missing one so that a
/// typo never aborts a batch.
pub fn sender_for_topic(topic: Option<&str>) -> Box<dyn NotificationSender> {
    match topic.map(NtfyNotificationSender::new) {
        Some(Ok(sender)) => Box::new(sender),
        Some(Err(e)) => {
            log::warn!("Notifications disabled: {}", e);
            Box::new(NullNotificationSender)
        }
        None => Box::new(NullNotificationSender),
    }
}
