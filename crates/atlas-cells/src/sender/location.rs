//! Shares the device location.

use std::future::Future;
use std::time::Duration;

use atlas_message::{LocationPayload, NewMessage};
use tracing::{info, warn};

use super::Conversation;
use crate::error::{Error, Result};
use crate::lifecycle::ScopedHandle;

const FRESH_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// A latitude/longitude fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Source of location fixes.
pub trait LocationProvider: Send + Sync {
    /// Requests a single fresh high-accuracy fix.
    fn fresh_location(&self) -> impl Future<Output = Result<Coordinates>> + Send;
}

/// Sends `location/coordinate` messages.
///
/// The provider is held through a [`ScopedHandle`], so a location that
/// arrives after its screen closed is dropped with [`Error::Unavailable`].
#[derive(Debug)]
pub struct LocationSender<P> {
    provider: ScopedHandle<P>,
    sender_name: String,
    timeout: Duration,
}

impl<P: LocationProvider> LocationSender<P> {
    /// Creates a sender for `sender_name`.
    #[must_use]
    pub fn new(provider: ScopedHandle<P>, sender_name: impl Into<String>) -> Self {
        Self {
            provider,
            sender_name: sender_name.into(),
            timeout: FRESH_LOCATION_TIMEOUT,
        }
    }

    /// Overrides how long to wait for a fix.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the draft for `coordinates`, labeled with the sender's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinates cannot be serialized.
    pub fn draft(&self, coordinates: Coordinates) -> Result<NewMessage> {
        let payload = LocationPayload::new(coordinates.latitude, coordinates.longitude)
            .with_label(self.sender_name.as_str());
        Ok(payload
            .to_new_message()?
            .with_notification(format!("{} shared a location", self.sender_name)))
    }

    /// Requests one fresh fix and sends it to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] if the provider's scope closed before or
    /// during the request, [`Error::Location`] if no fix arrived in time, or
    /// the provider's or conversation's error.
    pub async fn send(&self, conversation: &dyn Conversation) -> Result<()> {
        let provider = self.provider.get()?;
        let coordinates = tokio::time::timeout(self.timeout, provider.fresh_location())
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "No location fix");
                Error::Location(format!("no fix within {:?}", self.timeout))
            })??;

        self.provider.ensure_available()?;
        let draft = self.draft(coordinates)?;
        info!("Sharing location");
        conversation.send(draft)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::lifecycle::Scope;
    use crate::sender::testing::RecordingConversation;
    use atlas_message::{LOCATION_COORDINATE, MessageId};
    use std::sync::Arc;
    use tokio::sync::Notify;

    struct FixedProvider(Coordinates);

    impl LocationProvider for FixedProvider {
        fn fresh_location(&self) -> impl Future<Output = Result<Coordinates>> + Send {
            let fix = self.0;
            async move { Ok(fix) }
        }
    }

    struct GatedProvider {
        gate: Arc<Notify>,
    }

    impl LocationProvider for GatedProvider {
        fn fresh_location(&self) -> impl Future<Output = Result<Coordinates>> + Send {
            let gate = Arc::clone(&self.gate);
            async move {
                gate.notified().await;
                Ok(Coordinates {
                    latitude: 0.0,
                    longitude: 0.0,
                })
            }
        }
    }

    struct SilentProvider;

    impl LocationProvider for SilentProvider {
        fn fresh_location(&self) -> impl Future<Output = Result<Coordinates>> + Send {
            std::future::pending()
        }
    }

    #[tokio::test]
    async fn test_sends_location_round_trip() {
        let scope = Scope::new("map screen");
        let sender = LocationSender::new(
            scope.handle(FixedProvider(Coordinates {
                latitude: 52.52,
                longitude: 13.405,
            })),
            "Ana",
        );
        let conversation = RecordingConversation::default();

        sender.send(&conversation).await.unwrap();

        let draft = conversation.sent.lock().remove(0);
        assert_eq!(draft.notification.as_deref(), Some("Ana shared a location"));
        assert_eq!(draft.parts[0].mime_type, LOCATION_COORDINATE);

        let message = draft.into_message(MessageId::from_uuid("echo"));
        let payload = LocationPayload::from_message(&message).unwrap();
        assert_eq!((payload.lat, payload.lon), (52.52, 13.405));
        assert_eq!(payload.label.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_closed_scope_is_unavailable() {
        let scope = Scope::new("map screen");
        let sender = LocationSender::new(
            scope.handle(FixedProvider(Coordinates {
                latitude: 1.0,
                longitude: 2.0,
            })),
            "Ana",
        );
        drop(scope);

        let conversation = RecordingConversation::default();
        assert!(matches!(
            sender.send(&conversation).await,
            Err(Error::Unavailable("map screen"))
        ));
        assert!(conversation.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_scope_closed_while_waiting() {
        let scope = Scope::new("map screen");
        let gate = Arc::new(Notify::new());
        let sender = LocationSender::new(
            scope.handle(GatedProvider {
                gate: Arc::clone(&gate),
            }),
            "Ana",
        );
        let conversation = RecordingConversation::default();

        let send = sender.send(&conversation);
        let close = async {
            scope.close();
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(send, close);

        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert!(conversation.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fix_times_out() {
        let scope = Scope::new("map screen");
        let sender = LocationSender::new(scope.handle(SilentProvider), "Ana")
            .with_timeout(Duration::from_secs(3));
        let conversation = RecordingConversation::default();

        assert!(matches!(
            sender.send(&conversation).await,
            Err(Error::Location(_))
        ));
    }
}
