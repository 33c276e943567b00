use std::sync::Mutex;

use async_trait::async_trait;

use super::{Notification, NotificationSink, NotifyError};
use crate::EventEmitter;

/// A sink that emits notifications via an `EventEmitter` for in-process
/// subscribers. Listeners receive the JSON-encoded notification under its
/// event name (`createActor`, `createLink`).
pub struct LocalEmitterSink {
    emitter: Mutex<EventEmitter>,
}

impl LocalEmitterSink {
    pub fn new(emitter: EventEmitter) -> Self {
        LocalEmitterSink {
            emitter: Mutex::new(emitter),
        }
    }
}

#[async_trait]
impl NotificationSink for LocalEmitterSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| NotifyError::Encode(e.to_string()))?;
        let mut emitter = self.emitter.lock().map_err(|_| NotifyError::BufferPoisoned)?;
        emitter.emit(notification.event_name(), payload);
        Ok(())
    }
}
