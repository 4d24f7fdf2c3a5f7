//! `location/coordinate` payloads.
//!
//! Wire format: a single part holding `{"lat": <f64>, "lon": <f64>, "label": <string>}`,
//! where `label` is optional.

use crate::error::{Error, Result};
use crate::message::{Message, NewMessage, NewPart};
use crate::mime_type::LOCATION_COORDINATE;
use serde::{Deserialize, Serialize};

/// A shared location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Optional marker label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LocationPayload {
    /// Creates an unlabeled location.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            label: None,
        }
    }

    /// Sets the marker label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parses a JSON payload. Both `lat` and `lon` are required.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a coordinate is missing.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes to the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (non-finite coordinates).
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Reads the payload from the first part of `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the first part is missing, not ready, or malformed.
    pub fn from_message(message: &Message) -> Result<Self> {
        let part = message
            .part(0)
            .ok_or_else(|| Error::PartLayout(format!("{} has no parts", message.id)))?;
        Self::from_json(part.bytes()?)
    }

    /// Builds an outgoing single-part location message.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_new_message(&self) -> Result<NewMessage> {
        Ok(NewMessage::new(vec![NewPart::new(
            LOCATION_COORDINATE,
            self.to_json()?,
        )]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::message::MessageId;

    #[test]
    fn test_to_json_without_label() {
        let json = LocationPayload::new(37.5, -122.25).to_json().unwrap();
        assert_eq!(json, br#"{"lat":37.5,"lon":-122.25}"#);
    }

    #[test]
    fn test_to_json_with_label() {
        let json = LocationPayload::new(1.0, 2.0)
            .with_label("Home")
            .to_json()
            .unwrap();
        assert_eq!(json, br#"{"lat":1.0,"lon":2.0,"label":"Home"}"#);
    }

    #[test]
    fn test_from_json_missing_lat() {
        let result = LocationPayload::from_json(br#"{"lon": 2.0}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(LocationPayload::from_json(b"not json").is_err());
    }

    #[test]
    fn test_message_round_trip() {
        let payload = LocationPayload::new(48.8584, 2.2945).with_label("Tour Eiffel");
        let message = payload
            .to_new_message()
            .unwrap()
            .into_message(MessageId::from_uuid("loc"));
        assert_eq!(message.first_mime_type(), Some(LOCATION_COORDINATE));

        let parsed = LocationPayload::from_message(&message).unwrap();
        assert_eq!(parsed.lat, 48.8584);
        assert_eq!(parsed.lon, 2.2945);
        assert_eq!(parsed.label.as_deref(), Some("Tour Eiffel"));
    }
}
