//! Shared-location cells rendered as a static map.

use std::sync::Arc;

use atlas_message::{LOCATION_COORDINATE, LocationPayload, Message, Size, scale_down_inside};
use tracing::warn;

use super::{
    CellAction, CellContent, CellFactory, CellHolder, CellHolderSpecs, CellTheme, load_image,
    mismatched_content,
};
use crate::config::CellsConfig;
use crate::error::Result;
use crate::loader::{ImageLoader, ImageRequest, ImageSource, ScrollState};

const TAG: &str = "location";
const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;
const STATIC_MAP_BASE: &str =
    "https://maps.googleapis.com/maps/api/staticmap?zoom=16&maptype=roadmap&scale=2";
const DEFAULT_MARKER_LABEL: &str = "Shared Marker";

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn golden_height(width: u32) -> u32 {
    (f64::from(width) / GOLDEN_RATIO).round() as u32
}

/// Builds the static map image URL for `location` at `size`.
///
/// # Errors
///
/// Returns an error if the coordinates do not produce a valid URL.
pub fn static_map_url(location: &LocationPayload, size: Size) -> Result<String> {
    let (lat, lon) = (location.lat, location.lon);
    let raw = format!(
        "{STATIC_MAP_BASE}&center={lat},{lon}&size={size}&markers=color:red%7C{lat},{lon}"
    );
    Ok(url::Url::parse(&raw)?.into())
}

/// Builds the `geo:` URI opened when the map is tapped.
#[must_use]
pub fn geo_uri(location: &LocationPayload) -> String {
    let label = location.label.as_deref().unwrap_or(DEFAULT_MARKER_LABEL);
    format!(
        "geo:0,0?q={},{}({})&z=16",
        location.lat,
        location.lon,
        urlencoding::encode(label)
    )
}

/// Renders `location/coordinate` messages.
pub struct LocationCellFactory {
    loader: Arc<dyn ImageLoader>,
    corner_radius: f32,
    static_map_max_dimension: u32,
}

impl LocationCellFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>, config: &CellsConfig) -> Self {
        Self {
            loader,
            corner_radius: config.corner_radius,
            static_map_max_dimension: config.static_map_max_dimension,
        }
    }

    /// Size of the requested map image.
    #[must_use]
    pub fn map_size(&self, max_width: u32) -> Size {
        let width = max_width.min(self.static_map_max_dimension);
        Size::new(width, golden_height(width))
    }

    /// Size of the cell.
    #[must_use]
    pub fn cell_size(specs: &CellHolderSpecs) -> Size {
        scale_down_inside(
            Size::new(specs.max_width, golden_height(specs.max_width)),
            specs.max_size(),
        )
    }
}

impl CellFactory for LocationCellFactory {
    fn name(&self) -> &'static str {
        TAG
    }

    fn is_bindable(&self, message: &Message) -> bool {
        message.first_part_is(LOCATION_COORDINATE)
    }

    fn create_holder(&self, is_me: bool, _theme: &CellTheme) -> CellHolder {
        CellHolder::image(is_me)
    }

    fn parse(&self, message: &Message) -> Option<CellContent> {
        match LocationPayload::from_message(message) {
            Ok(location) => Some(CellContent::Location(location)),
            Err(error) => {
                warn!(message_id = %message.id, %error, "Malformed location payload");
                None
            }
        }
    }

    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        specs: &CellHolderSpecs,
    ) {
        let (CellContent::Location(location), Some(view)) = (content, holder.image_view().cloned())
        else {
            mismatched_content(self.name(), holder, message);
            return;
        };

        let url = match static_map_url(location, self.map_size(specs.max_width)) {
            Ok(url) => url,
            Err(error) => {
                warn!(message_id = %message.id, %error, "Could not build map URL");
                holder.show_placeholder();
                return;
            }
        };

        let cell = Self::cell_size(specs);
        let ticket = view.begin_bind(&message.id);
        view.update(&ticket, |state| state.layout = Some(cell));
        holder.set_action(CellAction::OpenMap {
            geo_uri: geo_uri(location),
        });

        let request = ImageRequest::new(ImageSource::Url(url), TAG)
            .placeholder(true)
            .resize(cell)
            .center_crop()
            .rounded(self.corner_radius);
        load_image(self.loader.as_ref(), &view, ticket, request);
    }

    fn preview_text(&self, _message: &Message) -> String {
        "Attachment: Location".to_string()
    }

    fn on_scroll_state_changed(&self, state: ScrollState) {
        state.apply(self.loader.as_ref(), TAG);
    }
}
