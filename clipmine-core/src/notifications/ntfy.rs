// ============================================================================
// clipmine-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY IMPLEMENTATION: Notification Implementation Using ntfy.sh
//
// Sends batch notifications to an ntfy topic given as a full URL
// (`https://host/topic`). The URL is split and validated once when the
// sender is created.
//
// AI-ASSISTANT-INFO: ntfy.sh implementation for sending notifications

// ---- Internal crate imports ----
use super::{NotificationSender, NotificationType};
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

// ============================================================================
// NTFY NOTIFICATION SENDER
// ============================================================================

/// Sends notifications to an ntfy server using the blocking dispatcher.
///
/// # Examples
///
/// ```rust,no_run
/// use clipmine_core::notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
///
/// let sender = NtfyNotificationSender::new("https://ntfy.sh/your_topic").unwrap();
/// let notification = NotificationType::BatchError {
///     message: "ffmpeg not found".to_string(),
///     hostname: "my-computer".to_string(),
/// };
/// sender.send_notification(&notification).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    topic_url: String,
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Creates a sender for `topic_url`, e.g. `https://ntfy.sh/your_topic`.
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let (base_url, topic) = split_topic_url(topic_url)?;
        Ok(Self {
            topic_url: topic_url.to_string(),
            base_url,
            topic,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {}",
                    self.base_url, e
                ))
            })?;

        let priority = map_priority(notification.get_priority()).unwrap_or_else(|| {
            log::warn!(
                "Invalid ntfy priority value provided: {}",
                notification.get_priority()
            );
            NtfyPriority::Default
        });

        let mut tags = vec!["clipmine".to_string()];
        if let Some(tag) = notification.tag() {
            tags.push(tag.to_string());
        }

        let payload = Payload::new(&self.topic)
            .message(notification.get_message())
            .title(notification.get_title())
            .priority(priority)
            .tags(tags);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}: {}",
                self.topic_url, e
            ))
        })?;
        log::debug!("Sent notification to {}", self.topic_url);
        Ok(())
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Splits `https://host/topic` into the server URL and the topic name.
fn split_topic_url(topic_url: &str) -> CoreResult<(String, String)> {
    let after_scheme = topic_url.strip_prefix("https://").ok_or_else(|| {
        CoreError::NotificationError(format!(
            "Invalid ntfy topic URL '{}': must start with https://",
            topic_url
        ))
    })?;

    let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
    if host.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' must have a non-empty host",
            topic_url
        )));
    }
    let topic = topic.trim_end_matches('/');
    if topic.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' is missing topic path",
            topic_url
        )));
    }

    Ok((format!("https://{host}"), topic.to_string()))
}

/// Maps a numeric priority value (1-5) to the ntfy priority.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}
