//! JSON transcript files.
//!
//! A transcript names the local participant and lists messages in display
//! order. Each part carries its content inline as `text` or `json`, or by
//! reference as a `file` relative to the transcript. Parts marked
//! `"ready": false` start out remote and are served through the store's
//! download path.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use atlas_message::{Message, MessageId, MessagePart};
use bytes::Bytes;
use serde::Deserialize;

use crate::store::TranscriptStore;

/// A conversation loaded from disk.
#[derive(Debug, Deserialize)]
pub struct Transcript {
    /// Name of the local user.
    pub participant: String,
    /// Messages in display order.
    pub messages: Vec<TranscriptMessage>,
}

/// One message of a transcript.
#[derive(Debug, Deserialize)]
pub struct TranscriptMessage {
    /// Message UUID.
    pub id: String,
    /// Sender name.
    pub sender: String,
    /// Message parts.
    pub parts: Vec<TranscriptPart>,
}

/// One part of a transcript message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptPart {
    /// MIME type of the part.
    pub mime_type: String,
    /// Inline UTF-8 content.
    #[serde(default)]
    pub text: Option<String>,
    /// Inline JSON content, stored compactly.
    #[serde(default)]
    pub json: Option<serde_json::Value>,
    /// Content file, relative to the transcript.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Whether the content is already local.
    #[serde(default = "default_ready")]
    pub ready: bool,
}

const fn default_ready() -> bool {
    true
}

/// A message ready for binding.
#[derive(Debug, Clone)]
pub struct Row {
    /// The message.
    pub message: Message,
    /// Sent by the local user.
    pub is_me: bool,
}

impl Transcript {
    /// Reads a transcript file.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read transcript {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse transcript {}", path.display()))
    }

    /// Resolves every part and registers the messages with `store`.
    pub async fn import(&self, base: &Path, store: &TranscriptStore) -> anyhow::Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.messages.len());
        for entry in &self.messages {
            let id = MessageId::from_uuid(&entry.id);
            let mut parts = Vec::with_capacity(entry.parts.len());
            for (index, part) in entry.parts.iter().enumerate() {
                let content = part
                    .content(base)
                    .await
                    .with_context(|| format!("message {} part {index}", entry.id))?;
                let part_id = id.part(index);
                if part.ready {
                    parts.push(MessagePart::ready(part_id, part.mime_type.as_str(), content));
                } else {
                    let size = content.len() as u64;
                    store.add_remote(part_id.clone(), content);
                    parts.push(MessagePart::pending(part_id, part.mime_type.as_str(), size));
                }
            }

            let message = Message::new(id, parts);
            store.add_message(&message);
            rows.push(Row {
                message,
                is_me: entry.sender == self.participant,
            });
        }
        tracing::info!(messages = rows.len(), "Transcript imported");
        Ok(rows)
    }
}

impl TranscriptPart {
    async fn content(&self, base: &Path) -> anyhow::Result<Bytes> {
        if let Some(text) = &self.text {
            return Ok(Bytes::from(text.clone()));
        }
        if let Some(json) = &self.json {
            return Ok(Bytes::from(serde_json::to_vec(json)?));
        }
        if let Some(file) = &self.file {
            let path = base.join(file);
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Ok(Bytes::from(data));
        }
        bail!("{} part has no text, json or file", self.mime_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atlas_cells::PartStore;

    const TRANSCRIPT: &str = r#"{
        "participant": "Ana",
        "messages": [
            {"id": "m1", "sender": "Ana", "parts": [{"mimeType": "text/plain", "text": "hi"}]},
            {"id": "m2", "sender": "Bo", "parts": [
                {"mimeType": "location/coordinate", "json": {"lat": 1.5, "lon": 2.5}}
            ]},
            {"id": "m3", "sender": "Bo", "parts": [
                {"mimeType": "image/png", "file": "cat.png", "ready": false}
            ]}
        ]
    }"#;

    #[tokio::test]
    async fn test_import_resolves_parts() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("cat.png"), b"not really a png")
            .await
            .unwrap();
        let transcript: Transcript = serde_json::from_str(TRANSCRIPT).unwrap();
        let store = TranscriptStore::default();

        let rows = transcript.import(dir.path(), &store).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_me);
        assert!(!rows[1].is_me);
        assert_eq!(rows[0].message.parts[0].text().unwrap(), "hi");
        assert_eq!(
            rows[1].message.parts[0].data.as_deref(),
            Some(br#"{"lat":1.5,"lon":2.5}"#.as_slice())
        );

        let pending = &rows[2].message.parts[0];
        assert!(!pending.is_content_ready());
        assert_eq!(pending.size, 16);
        assert_eq!(
            store.download(&pending.id).await.unwrap().as_ref(),
            b"not really a png"
        );
    }

    #[tokio::test]
    async fn test_part_without_content_fails() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"participant": "Ana", "messages": [
                {"id": "m1", "sender": "Ana", "parts": [{"mimeType": "text/plain"}]}
            ]}"#,
        )
        .unwrap();
        let store = TranscriptStore::default();
        assert!(transcript.import(Path::new("."), &store).await.is_err());
    }
}
