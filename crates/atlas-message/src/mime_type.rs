//! MIME type handling for message parts.
//!
//! Part MIME types carry an optional structured-syntax suffix that Atlas uses
//! to tag related parts, e.g. `image/jpeg+preview` or `application/json+imageSize`.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Plain text message parts.
pub const TEXT_PLAIN: &str = "text/plain";

/// Location message parts (`{"lat":..,"lon":..}` JSON).
pub const LOCATION_COORDINATE: &str = "location/coordinate";

/// Three-part image metadata parts (`{"orientation":..,"width":..,"height":..}` JSON).
pub const IMAGE_SIZE_INFO: &str = "application/json+imageSize";

/// Suffix marking the preview part of a three-part image.
pub const PREVIEW_SUFFIX: &str = "preview";

/// Parsed MIME type with optional suffix and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    /// Main type (e.g., "text", "image", "location").
    pub main_type: String,
    /// Subtype without suffix (e.g., "plain", "jpeg", "coordinate").
    pub sub_type: String,
    /// Structured-syntax suffix (e.g., "preview", "imageSize").
    pub suffix: Option<String>,
    /// Parameters (e.g., charset=utf-8).
    pub parameters: BTreeMap<String, String>,
}

impl MimeType {
    /// Creates a new MIME type without suffix or parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            suffix: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns `type/subtype[+suffix]` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        let main = &self.main_type;
        let sub = &self.sub_type;
        match &self.suffix {
            Some(suffix) => format!("{main}/{sub}+{suffix}"),
            None => format!("{main}/{sub}"),
        }
    }

    /// Checks if this is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("image")
    }

    /// Checks if this is a text type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks the suffix.
    #[must_use]
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.suffix.as_deref() == Some(suffix)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Parses a MIME type string.
    ///
    /// Format: `type/subtype[+suffix]; param1=value1`
    ///
    /// Type and subtype are matched case-insensitively elsewhere, so the main
    /// type is lowercased. Subtype and suffix keep their case because Atlas
    /// suffixes such as `imageSize` are case-sensitive on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, rest) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidMimeType(format!("Missing subtype in {s:?}")))?;

        let main_type = main_type.trim().to_lowercase();
        if main_type.is_empty() {
            return Err(Error::InvalidMimeType(format!("Missing main type in {s:?}")));
        }

        let (sub_type, suffix) = match rest.split_once('+') {
            Some((sub, suffix)) => (sub.trim(), Some(suffix.trim().to_string())),
            None => (rest.trim(), None),
        };
        if sub_type.is_empty() {
            return Err(Error::InvalidMimeType(format!("Missing subtype in {s:?}")));
        }

        let mut mime_type = Self::new(main_type, sub_type);
        mime_type.suffix = suffix.filter(|suffix| !suffix.is_empty());

        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                mime_type.parameters.insert(key, value);
            }
        }

        Ok(mime_type)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.essence())?;
        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }
        Ok(())
    }
}
