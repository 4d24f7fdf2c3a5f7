//! Ordered registry of cell factories.
//!
//! Dispatch walks the factories in registration order and picks the first
//! whose `is_bindable` accepts the message. Register specific factories
//! before general ones: the registry does not break ties.

use std::sync::Arc;

use atlas_message::Message;
use tracing::{debug, warn};

use crate::cell::{
    BasicImageCellFactory, CachedCellFactory, CellFactory, CellHolder, CellHolderSpecs, CellTheme,
    LocationCellFactory, MimeCellFactory, TextCellFactory, ThreePartImageCellFactory, ViewType,
};
use crate::config::CellsConfig;
use crate::error::{Error, Result};
use crate::loader::{ImageLoader, ScrollState};

/// Dispatches messages to cached cell factories.
#[derive(Debug, Default)]
pub struct CellRegistry {
    factories: Vec<CachedCellFactory>,
    theme: CellTheme,
}

impl CellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(theme: CellTheme) -> Self {
        Self {
            factories: Vec::new(),
            theme,
        }
    }

    /// Creates a registry with the built-in factories, most specific first:
    /// text, three-part image, location, basic image, generic MIME.
    #[must_use]
    pub fn with_defaults(config: &CellsConfig, loader: &Arc<dyn ImageLoader>) -> Self {
        let mut registry = Self::new(config.theme);
        registry
            .register(TextCellFactory::new(), config.text_cache_bytes)
            .register(
                ThreePartImageCellFactory::new(Arc::clone(loader), config),
                config.three_part_cache_bytes,
            )
            .register(
                LocationCellFactory::new(Arc::clone(loader), config),
                config.location_cache_bytes,
            )
            .register(
                BasicImageCellFactory::new(Arc::clone(loader), config),
                config.basic_image_cache_bytes,
            )
            .register(MimeCellFactory::new(), config.mime_cache_bytes);
        registry
    }

    /// Appends `factory` with a cache of `cache_budget` bytes.
    pub fn register(
        &mut self,
        factory: impl CellFactory + 'static,
        cache_budget: usize,
    ) -> &mut Self {
        debug!(factory = factory.name(), cache_budget, "Registered cell factory");
        self.factories
            .push(CachedCellFactory::new(factory, cache_budget));
        self
    }

    /// Returns the registered factories in dispatch order.
    #[must_use]
    pub fn factories(&self) -> &[CachedCellFactory] {
        &self.factories
    }

    /// Returns the bubble colors.
    #[must_use]
    pub const fn theme(&self) -> &CellTheme {
        &self.theme
    }

    /// Returns the index of the first factory accepting `message`.
    #[must_use]
    pub fn dispatch(&self, message: &Message) -> Option<usize> {
        self.factories
            .iter()
            .position(|factory| factory.is_bindable(message))
    }

    /// Returns the first factory accepting `message`.
    #[must_use]
    pub fn factory_for(&self, message: &Message) -> Option<&CachedCellFactory> {
        self.dispatch(message).map(|index| &self.factories[index])
    }

    /// Returns the view type for `message`, or `None` if no factory accepts it.
    #[must_use]
    pub fn view_type(&self, message: &Message, is_me: bool) -> Option<ViewType> {
        let factory = self.dispatch(message);
        if factory.is_none() {
            warn!(message_id = %message.id, "No cell factory accepts message");
        }
        factory.map(|factory| ViewType { factory, is_me })
    }

    /// Creates a holder for `view_type`.
    #[must_use]
    pub fn create_holder(&self, view_type: ViewType) -> Option<CellHolder> {
        let factory = self.factories.get(view_type.factory)?;
        let mut holder = factory.create_holder(view_type.is_me, &self.theme);
        holder.set_view_type(view_type);
        Some(holder)
    }

    /// Binds `message` into `holder`.
    ///
    /// # Errors
    ///
    /// Returns an error if no factory accepts `message`, or if `holder` was
    /// created by a different factory or for the other side of the conversation.
    pub fn bind(
        &self,
        holder: &mut CellHolder,
        message: &Message,
        specs: &CellHolderSpecs,
    ) -> Result<()> {
        let index = self
            .dispatch(message)
            .ok_or_else(|| Error::NoFactory(message.id.to_string()))?;
        if holder.view_type().is_some_and(|view_type| {
            view_type.factory != index || view_type.is_me != specs.is_me
        }) {
            return Err(Error::ViewTypeMismatch(message.id.to_string()));
        }
        self.factories[index].bind(holder, message, specs);
        Ok(())
    }

    /// Returns the conversation-list summary of `message`.
    #[must_use]
    pub fn preview_text(&self, message: &Message) -> Option<String> {
        self.factory_for(message)
            .map(|factory| factory.preview_text(message))
    }

    /// Forwards a scroll state change to every factory.
    pub fn on_scroll_state_changed(&self, state: ScrollState) {
        for factory in &self.factories {
            factory.on_scroll_state_changed(state);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cell::{CellContent, ImageStage};
    use crate::loader::{ImageRequest, LoadCallback};
    use atlas_message::{
        IMAGE_SIZE_INFO, ImageInfo, LOCATION_COORDINATE, MessageId, MessagePart, Orientation,
        TEXT_PLAIN,
    };
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<ImageRequest>>,
        events: Mutex<Vec<String>>,
    }

    impl ImageLoader for Recorder {
        fn load(&self, request: ImageRequest, _on_complete: LoadCallback) {
            self.requests.lock().push(request);
        }

        fn pause_tag(&self, tag: &str) {
            self.events.lock().push(format!("pause {tag}"));
        }

        fn resume_tag(&self, tag: &str) {
            self.events.lock().push(format!("resume {tag}"));
        }
    }

    fn registry() -> (CellRegistry, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let loader: Arc<dyn ImageLoader> = recorder.clone();
        (
            CellRegistry::with_defaults(&CellsConfig::default(), &loader),
            recorder,
        )
    }

    fn message(uuid: &str, parts: &[(&str, &str)]) -> Message {
        let id = MessageId::from_uuid(uuid);
        let parts = parts
            .iter()
            .enumerate()
            .map(|(index, (mime, data))| {
                MessagePart::ready(id.part(index), *mime, (*data).to_string())
            })
            .collect();
        Message::new(id, parts)
    }

    fn three_part(uuid: &str) -> Message {
        let info = String::from_utf8(ImageInfo::new(Orientation::Normal, 10, 10).to_json().unwrap())
            .unwrap();
        message(
            uuid,
            &[
                ("image/png", "full"),
                ("image/png+preview", "preview"),
                (IMAGE_SIZE_INFO, info.as_str()),
            ],
        )
    }

    #[test]
    fn test_dispatch_first_match() {
        let (registry, _) = registry();
        let name = |message: &Message| registry.factory_for(message).unwrap().name();

        assert_eq!(name(&message("t", &[(TEXT_PLAIN, "hi")])), "text");
        assert_eq!(name(&three_part("tp")), "three-part-image");
        assert_eq!(
            name(&message("l", &[(LOCATION_COORDINATE, r#"{"lat":1,"lon":2}"#)])),
            "location"
        );
        assert_eq!(name(&message("b", &[("image/gif", "gif")])), "basic-image");
        assert_eq!(name(&message("m", &[("audio/ogg", "ogg")])), "mime");
    }

    #[test]
    fn test_empty_registry_has_no_view_type() {
        let registry = CellRegistry::default();
        let message = message("t", &[(TEXT_PLAIN, "hi")]);
        assert!(registry.view_type(&message, true).is_none());
        assert!(registry.preview_text(&message).is_none());
        assert!(matches!(
            registry.bind(
                &mut CellHolder::image(true),
                &message,
                &CellHolderSpecs::new(true, 0, 1, 1)
            ),
            Err(Error::NoFactory(_))
        ));
    }

    #[test]
    fn test_view_type_and_bind() {
        let (registry, _) = registry();
        let message = message("t", &[(TEXT_PLAIN, "hello")]);
        let view_type = registry.view_type(&message, true).unwrap();
        assert_eq!(view_type, ViewType { factory: 0, is_me: true });

        let mut holder = registry.create_holder(view_type).unwrap();
        assert_eq!(holder.view_type(), Some(view_type));
        registry
            .bind(&mut holder, &message, &CellHolderSpecs::new(true, 0, 480, 800))
            .unwrap();
        assert_eq!(holder.text_view().unwrap().text.as_deref(), Some("hello"));
        assert_eq!(holder.text_view().unwrap().style, registry.theme().me);
    }

    #[test]
    fn test_bind_rejects_foreign_holder() {
        let (registry, _) = registry();
        let text = message("t", &[(TEXT_PLAIN, "hello")]);
        let image = three_part("i");
        let mut holder = registry
            .create_holder(registry.view_type(&text, false).unwrap())
            .unwrap();
        assert!(matches!(
            registry.bind(&mut holder, &image, &CellHolderSpecs::new(false, 0, 480, 800)),
            Err(Error::ViewTypeMismatch(_))
        ));
    }

    #[test]
    fn test_bind_rejects_holder_styled_for_other_side() {
        let (registry, _) = registry();
        let text = message("t", &[(TEXT_PLAIN, "hello")]);
        let mut holder = registry
            .create_holder(registry.view_type(&text, true).unwrap())
            .unwrap();

        assert!(matches!(
            registry.bind(&mut holder, &text, &CellHolderSpecs::new(false, 0, 480, 800)),
            Err(Error::ViewTypeMismatch(_))
        ));
        assert!(holder.message().is_none());
        assert!(holder.text_view().unwrap().text.is_none());
    }

    #[test]
    fn test_malformed_location_binds_placeholder() {
        let (registry, recorder) = registry();
        let message = message("l", &[(LOCATION_COORDINATE, r#"{"lon": 2.0}"#)]);
        let mut holder = registry
            .create_holder(registry.view_type(&message, false).unwrap())
            .unwrap();

        registry
            .bind(&mut holder, &message, &CellHolderSpecs::new(false, 0, 480, 800))
            .unwrap();

        let state = holder.image_view().unwrap().snapshot();
        assert!(state.placeholder);
        assert_eq!(state.stage, ImageStage::NoImage);
        assert!(holder.action().is_none());
        assert!(recorder.requests.lock().is_empty());
    }

    #[test]
    fn test_cached_content_reused() {
        let (registry, _) = registry();
        let message = three_part("tp");
        let factory = registry.factory_for(&message).unwrap();

        let first = factory.get_or_compute(&message).unwrap();
        let second = factory.get_or_compute(&message).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            *first,
            CellContent::ThreePartImage(ImageInfo::new(Orientation::Normal, 10, 10))
        );
    }

    #[test]
    fn test_preview_text() {
        let (registry, _) = registry();
        assert_eq!(
            registry.preview_text(&message("t", &[(TEXT_PLAIN, "hey")])).unwrap(),
            "hey"
        );
        assert_eq!(registry.preview_text(&three_part("i")).unwrap(), "Attachment: Image");
        assert_eq!(
            registry
                .preview_text(&message("m", &[("audio/ogg", "ogg")]))
                .unwrap(),
            "[3-byte audio/ogg]"
        );
    }

    #[test]
    fn test_scroll_fans_out() {
        let (registry, recorder) = registry();
        registry.on_scroll_state_changed(ScrollState::Dragging);
        let events = recorder.events.lock();
        assert!(events.contains(&"pause three-part-image.full".to_string()));
        assert!(events.contains(&"pause location".to_string()));
        assert!(events.contains(&"pause basic-image".to_string()));
    }
}
