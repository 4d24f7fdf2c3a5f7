//! Cell layer configuration.

use std::path::Path;
use std::time::Duration;

use atlas_message::PreviewConfig;
use serde::{Deserialize, Serialize};

use crate::cell::CellTheme;
use crate::error::Result;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Configuration shared by the registry, factories and senders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellsConfig {
    /// Text factory cache budget in bytes.
    pub text_cache_bytes: usize,
    /// Location factory cache budget in bytes.
    pub location_cache_bytes: usize,
    /// Three-part image factory cache budget in bytes.
    pub three_part_cache_bytes: usize,
    /// Basic image factory cache budget in bytes.
    pub basic_image_cache_bytes: usize,
    /// Generic MIME factory cache budget in bytes.
    pub mime_cache_bytes: usize,
    /// Radius of the rounded-corner image transform.
    pub corner_radius: f32,
    /// Largest side the static map provider will render.
    pub static_map_max_dimension: u32,
    /// Upper bound on a single part download.
    #[serde(with = "duration_secs")]
    pub download_timeout: Duration,
    /// Maximum characters of message text copied into a push notification.
    pub notification_max_length: usize,
    /// Preview settings for outgoing three-part images.
    pub preview: PreviewConfig,
    /// Bubble colors.
    pub theme: CellTheme,
}

impl Default for CellsConfig {
    fn default() -> Self {
        Self {
            text_cache_bytes: 2 * MIB,
            location_cache_bytes: 32 * KIB,
            three_part_cache_bytes: 32 * KIB,
            basic_image_cache_bytes: KIB,
            mime_cache_bytes: 32 * KIB,
            corner_radius: 8.0,
            static_map_max_dimension: 640,
            download_timeout: Duration::from_secs(60),
            notification_max_length: 200,
            preview: PreviewConfig::default(),
            theme: CellTheme::default(),
        }
    }
}

impl CellsConfig {
    /// Creates a configuration builder starting from the defaults.
    #[must_use]
    pub fn builder() -> CellsConfigBuilder {
        CellsConfigBuilder::default()
    }

    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads the configuration from `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "No cells config, using defaults");
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Writes the configuration to `path` as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        tracing::info!("Cells config saved to {:?}", path);
        Ok(())
    }
}

/// Builder for [`CellsConfig`].
#[derive(Debug, Clone, Default)]
pub struct CellsConfigBuilder {
    config: CellsConfig,
}

impl CellsConfigBuilder {
    /// Sets the text cache budget.
    #[must_use]
    pub const fn text_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.text_cache_bytes = bytes;
        self
    }

    /// Sets the location cache budget.
    #[must_use]
    pub const fn location_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.location_cache_bytes = bytes;
        self
    }

    /// Sets the three-part image cache budget.
    #[must_use]
    pub const fn three_part_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.three_part_cache_bytes = bytes;
        self
    }

    /// Sets the basic image cache budget.
    #[must_use]
    pub const fn basic_image_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.basic_image_cache_bytes = bytes;
        self
    }

    /// Sets the generic MIME cache budget.
    #[must_use]
    pub const fn mime_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.mime_cache_bytes = bytes;
        self
    }

    /// Sets the rounded-corner radius.
    #[must_use]
    pub const fn corner_radius(mut self, radius: f32) -> Self {
        self.config.corner_radius = radius;
        self
    }

    /// Sets the static map size limit.
    #[must_use]
    pub const fn static_map_max_dimension(mut self, pixels: u32) -> Self {
        self.config.static_map_max_dimension = pixels;
        self
    }

    /// Sets the part download timeout.
    #[must_use]
    pub const fn download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    /// Sets the push notification text limit.
    #[must_use]
    pub const fn notification_max_length(mut self, chars: usize) -> Self {
        self.config.notification_max_length = chars;
        self
    }

    /// Sets the outgoing preview settings.
    #[must_use]
    pub const fn preview(mut self, preview: PreviewConfig) -> Self {
        self.config.preview = preview;
        self
    }

    /// Sets the bubble colors.
    #[must_use]
    pub const fn theme(mut self, theme: CellTheme) -> Self {
        self.config.theme = theme;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> CellsConfig {
        self.config
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
