// ============================================================================
// clipmine-core/src/notifications/abstraction.rs
// ============================================================================
//
// NOTIFICATION ABSTRACTION: Notification System Abstractions
//
// Notification types raised by the batch pipeline and the trait a backend
// implements to deliver them. The pipeline only talks to the trait, so a
// batch without a configured topic uses the no-op sender.
//
// KEY COMPONENTS:
// - NotificationType: Enum of different notification types
// - NotificationSender: Trait for sending notifications
// - NullNotificationSender: No-op implementation for when notifications aren't needed
//
// AI-ASSISTANT-INFO: Notification system abstractions

// ---- Internal crate imports ----
use crate::error::CoreResult;
use crate::utils::format_duration;

// ---- Standard library imports ----
use std::time::Duration;

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

/// Represents different types of notifications that can be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    /// A batch of source videos has started
    BatchStart {
        /// Number of source videos in the batch
        video_count: usize,
        /// Hostname of the machine running the batch
        hostname: String,
    },

    /// A batch has finished
    BatchComplete {
        /// Parts analyzed successfully
        succeeded: usize,
        /// Parts that failed
        failed: usize,
        /// Clips written across the batch
        clips: usize,
        /// Wall time of the batch
        duration: Duration,
        hostname: String,
    },

    /// The batch stopped because of an error
    BatchError {
        /// Error message
        message: String,
        hostname: String,
    },

    /// A custom notification message
    Custom {
        /// Title of the notification
        title: String,
        /// Message body
        message: String,
        /// Priority level (1-5, with 5 being highest)
        priority: u8,
    },
}

impl NotificationType {
    /// Gets the title for this notification type.
    pub fn get_title(&self) -> String {
        match self {
            NotificationType::BatchStart { .. } => "Clipmine Batch Started".to_string(),
            NotificationType::BatchComplete { .. } => "Clipmine Batch Complete".to_string(),
            NotificationType::BatchError { .. } => "Clipmine Batch Error".to_string(),
            NotificationType::Custom { title, .. } => title.clone(),
        }
    }

    /// Gets the message body for this notification type.
    pub fn get_message(&self) -> String {
        match self {
            NotificationType::BatchStart {
                video_count,
                hostname,
            } => {
                let noun = if *video_count == 1 { "video" } else { "videos" };
                format!("Started processing {} {} on {}", video_count, noun, hostname)
            }
            NotificationType::BatchComplete {
                succeeded,
                failed,
                clips,
                duration,
                hostname,
            } => format!(
                "Finished on {} in {}: {} part(s) succeeded, {} failed, {} clip(s) extracted",
                hostname,
                format_duration(duration.as_secs_f64()),
                succeeded,
                failed,
                clips
            ),
            NotificationType::BatchError { message, hostname } => {
                format!("Batch failed on {}: {}", hostname, message)
            }
            NotificationType::Custom { message, .. } => message.clone(),
        }
    }

    /// Gets the priority level for this notification type (1-5).
    pub fn get_priority(&self) -> u8 {
        match self {
            NotificationType::BatchStart { .. } => 3,
            NotificationType::BatchComplete { failed, .. } if *failed > 0 => 4,
            NotificationType::BatchComplete { .. } => 3,
            NotificationType::BatchError { .. } => 5,
            NotificationType::Custom { priority, .. } => *priority,
        }
    }

    /// Short tag identifying the notification kind.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            NotificationType::BatchStart { .. } => Some("start"),
            NotificationType::BatchComplete { .. } => Some("complete"),
            NotificationType::BatchError { .. } => Some("error"),
            NotificationType::Custom { .. } => None,
        }
    }
}

// ============================================================================
// NOTIFICATION SENDER
// ============================================================================

/// Trait for sending notifications.
///
/// Implementations can send notifications to different backends, such as
/// ntfy.sh or a recording sender in tests.
pub trait NotificationSender: Send + Sync {
    /// Sends a notification.
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()>;
}

impl<'a> dyn NotificationSender + 'a {
    /// Sends and logs failures instead of returning them.
    ///
    /// Notification delivery never decides the outcome of a batch.
    pub fn notify(&self, notification: &NotificationType) {
        if let Err(e) = self.send_notification(notification) {
            log::warn!("Failed to send notification: {}", e);
        }
    }
}

/// No-op implementation of NotificationSender.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSender;

impl NotificationSender for NullNotificationSender {
    fn send_notification(&self, _notification: &NotificationType) -> CoreResult<()> {
        Ok(())
    }
}
