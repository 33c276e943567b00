use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use super::{Notification, NotificationSink, NotifyError};

/// A simple sink that logs notifications through `tracing` or records them
/// in a shared buffer.
#[derive(Clone, Default)]
pub struct LogSink {
    buffer: Option<Arc<Mutex<Vec<Notification>>>>,
}

impl LogSink {
    pub fn new() -> Self {
        LogSink { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<Notification>>>) -> Self {
        LogSink {
            buffer: Some(buffer),
        }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        match &self.buffer {
            Some(buffer) => {
                let mut buffer = buffer.lock().map_err(|_| NotifyError::BufferPoisoned)?;
                buffer.push(notification.clone());
            }
            None => {
                let payload = serde_json::to_string(notification)
                    .map_err(|e| NotifyError::Encode(e.to_string()))?;
                info!(event = notification.event_name(), %payload, "notification");
            }
        }
        Ok(())
    }
}
