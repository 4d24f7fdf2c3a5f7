//! Resolves `layer:` part URIs to bytes for the image pipeline.

use std::future::Future;
use std::time::Duration;

use atlas_message::{MessagePart, PartId};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const LAYER_SCHEME: &str = "layer";
const PARTS_SEGMENT: &str = "parts";

/// Messaging SDK access needed to resolve parts.
pub trait PartStore: Send + Sync {
    /// Looks up a part by identifier.
    fn part(&self, id: &PartId) -> Option<MessagePart>;

    /// Downloads the part's content.
    fn download(&self, id: &PartId) -> impl Future<Output = Result<Bytes>> + Send;
}

/// Where loaded bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedFrom {
    /// Content was already local.
    Memory,
    /// Content had to be downloaded.
    Network,
}

/// Bytes of a resolved part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPart {
    /// Part content.
    pub data: Bytes,
    /// Origin of the content.
    pub from: LoadedFrom,
}

/// Image pipeline request handler for message parts.
#[derive(Debug)]
pub struct MessagePartRequestHandler<S> {
    store: S,
    download_timeout: Duration,
}

impl<S: PartStore> MessagePartRequestHandler<S> {
    /// Creates a handler over `store`.
    #[must_use]
    pub const fn new(store: S, download_timeout: Duration) -> Self {
        Self {
            store,
            download_timeout,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns `true` for `layer:///messages/<uuid>/parts/<n>` URIs.
    #[must_use]
    pub fn can_handle(uri: &str) -> bool {
        let Ok(parsed) = url::Url::parse(uri) else {
            return false;
        };
        if parsed.scheme() != LAYER_SCHEME {
            return false;
        }
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(Iterator::collect)
            .unwrap_or_default();
        segments.len() == 4 && segments[2] == PARTS_SEGMENT
    }

    /// Loads the part behind `uri`, downloading it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is not a part URI, the part is unknown,
    /// or the download fails or times out.
    pub async fn load(&self, uri: &str) -> Result<LoadedPart> {
        if !Self::can_handle(uri) {
            return Err(Error::UnsupportedUri(uri.to_string()));
        }
        let id = PartId::new(uri);
        let part = self
            .store
            .part(&id)
            .ok_or_else(|| Error::PartNotFound(uri.to_string()))?;

        if let Some(data) = part.data {
            debug!(part = %id, bytes = data.len(), "Part loaded from memory");
            return Ok(LoadedPart {
                data,
                from: LoadedFrom::Memory,
            });
        }

        debug!(part = %id, size = part.size, "Downloading part");
        match tokio::time::timeout(self.download_timeout, self.store.download(&id)).await {
            Ok(Ok(data)) => Ok(LoadedPart {
                data,
                from: LoadedFrom::Network,
            }),
            Ok(Err(error)) => {
                warn!(part = %id, %error, "Part download failed");
                Err(error)
            }
            Err(_) => {
                warn!(part = %id, timeout = ?self.download_timeout, "Part download timed out");
                Err(Error::DownloadTimeout {
                    part: id.to_string(),
                    timeout: self.download_timeout,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atlas_message::MessageId;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        parts: HashMap<PartId, MessagePart>,
        remote: HashMap<PartId, Bytes>,
        downloads: AtomicUsize,
    }

    impl MemoryStore {
        fn with(mut self, part: MessagePart) -> Self {
            self.parts.insert(part.id.clone(), part);
            self
        }

        fn with_remote(mut self, id: &PartId, data: &'static str) -> Self {
            self.remote.insert(id.clone(), Bytes::from_static(data.as_bytes()));
            self
        }
    }

    impl PartStore for MemoryStore {
        fn part(&self, id: &PartId) -> Option<MessagePart> {
            self.parts.get(id).cloned()
        }

        fn download(&self, id: &PartId) -> impl Future<Output = Result<Bytes>> + Send {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let data = self.remote.get(id).cloned();
            let id = id.clone();
            async move {
                match data {
                    Some(data) => Ok(data),
                    None => {
                        std::future::pending::<()>().await;
                        Err(Error::Download(id.to_string()))
                    }
                }
            }
        }
    }

    #[test]
    fn test_can_handle() {
        type Handler = MessagePartRequestHandler<MemoryStore>;
        assert!(Handler::can_handle("layer:///messages/abc/parts/0"));
        assert!(!Handler::can_handle("layer:///messages/abc"));
        assert!(!Handler::can_handle("layer:///messages/abc/parts/0/extra"));
        assert!(!Handler::can_handle("layer:///messages/abc/other/0"));
        assert!(!Handler::can_handle("https:///messages/abc/parts/0"));
        assert!(!Handler::can_handle("not a uri"));
    }

    #[tokio::test]
    async fn test_ready_part_from_memory() {
        let id = MessageId::from_uuid("m").part(0);
        let store = MemoryStore::default().with(MessagePart::ready(id.clone(), "image/png", "png"));
        let handler = MessagePartRequestHandler::new(store, Duration::from_secs(60));

        let loaded = handler.load(id.as_str()).await.unwrap();
        assert_eq!(loaded.from, LoadedFrom::Memory);
        assert_eq!(loaded.data, Bytes::from_static(b"png"));
        assert_eq!(handler.store().downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pending_part_downloads() {
        let id = MessageId::from_uuid("m").part(0);
        let store = MemoryStore::default()
            .with(MessagePart::pending(id.clone(), "image/png", 3))
            .with_remote(&id, "png");
        let handler = MessagePartRequestHandler::new(store, Duration::from_secs(60));

        let loaded = handler.load(id.as_str()).await.unwrap();
        assert_eq!(loaded.from, LoadedFrom::Network);
        assert_eq!(loaded.data, Bytes::from_static(b"png"));
        assert_eq!(handler.store().downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_timeout() {
        let id = MessageId::from_uuid("m").part(0);
        let store = MemoryStore::default().with(MessagePart::pending(id.clone(), "image/png", 3));
        let handler = MessagePartRequestHandler::new(store, Duration::from_secs(60));

        let result = handler.load(id.as_str()).await;
        assert!(matches!(
            result,
            Err(Error::DownloadTimeout { timeout, .. }) if timeout == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_unknown_part_and_uri() {
        let handler = MessagePartRequestHandler::new(MemoryStore::default(), Duration::from_secs(1));
        assert!(matches!(
            handler.load("layer:///messages/x/parts/0").await,
            Err(Error::PartNotFound(_))
        ));
        assert!(matches!(
            handler.load("https://example.com/a.png").await,
            Err(Error::UnsupportedUri(_))
        ));
    }
}
