//! In-memory part store and conversation backing the transcript.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use atlas_cells::{Conversation, Error, PartStore, Result};
use atlas_message::{Message, MessageId, MessagePart, NewMessage, PartId};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

/// Simulated network latency for remote parts.
const DOWNLOAD_LATENCY: Duration = Duration::from_millis(150);

#[derive(Debug, Default)]
struct Parts {
    local: HashMap<PartId, MessagePart>,
    remote: HashMap<PartId, Bytes>,
}

/// Shared part store. Clones see the same parts.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    parts: Arc<RwLock<Parts>>,
}

impl TranscriptStore {
    /// Registers every part of `message`.
    pub fn add_message(&self, message: &Message) {
        let mut parts = self.parts.write();
        for part in &message.parts {
            parts.local.insert(part.id.clone(), part.clone());
        }
    }

    /// Makes `data` available for download as `id`.
    pub fn add_remote(&self, id: PartId, data: Bytes) {
        self.parts.write().remote.insert(id, data);
    }
}

impl PartStore for TranscriptStore {
    fn part(&self, id: &PartId) -> Option<MessagePart> {
        self.parts.read().local.get(id).cloned()
    }

    fn download(&self, id: &PartId) -> impl Future<Output = Result<Bytes>> + Send {
        let remote = self.parts.read().remote.get(id).cloned();
        let id = id.clone();
        async move {
            tokio::time::sleep(DOWNLOAD_LATENCY).await;
            let data =
                remote.ok_or_else(|| Error::Download(format!("{id} is not available remotely")))?;
            debug!(part = %id, bytes = data.len(), "Part downloaded");
            Ok(data)
        }
    }
}

/// Conversation that appends sent drafts to the local transcript.
#[derive(Debug)]
pub struct LocalConversation {
    store: TranscriptStore,
    sent: Mutex<Vec<Message>>,
    next_id: AtomicUsize,
}

impl LocalConversation {
    /// Creates a conversation whose messages are registered with `store`.
    pub fn new(store: TranscriptStore) -> Self {
        Self {
            store,
            sent: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Takes the messages sent so far.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Conversation for LocalConversation {
    fn send(&self, draft: NewMessage) -> Result<()> {
        let id = MessageId::from_uuid(&format!(
            "local-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        if let Some(notification) = &draft.notification {
            info!(message_id = %id, %notification, "Message sent");
        }
        let message = draft.into_message(id);
        self.store.add_message(&message);
        self.sent.lock().push(message);
        Ok(())
    }
}
