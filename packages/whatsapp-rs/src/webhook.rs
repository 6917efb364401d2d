//! Inbound webhook payloads.
//!
//! Meta posts a deeply nested envelope; only the first message of the first
//! change is used, which is all the Cloud API ever batches for a single
//! business number in practice.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: Option<String>,
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub wa_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub image: Option<MediaContent>,
    #[serde(default)]
    pub video: Option<MediaContent>,
    #[serde(default)]
    pub audio: Option<MediaContent>,
    #[serde(default)]
    pub voice: Option<MediaContent>,
    #[serde(default)]
    pub document: Option<MediaContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaContent {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }
}

/// Media reference carried by an inbound message. Bytes are fetched later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMedia {
    pub kind: MediaKind,
    pub id: String,
    pub mime_type: Option<String>,
    pub sha256: Option<String>,
    pub filename: Option<String>,
}

/// Flattened inbound message handed to the intake pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: String,
    pub from: String,
    pub name: Option<String>,
    pub timestamp: Option<String>,
    /// Message body, or the media caption. Empty for bare media.
    pub text: String,
    pub media: Option<IncomingMedia>,
}

impl WebhookPayload {
    /// Extract the first user message. Status callbacks and unsupported
    /// message types yield `None`.
    pub fn first_message(&self) -> Option<IncomingMessage> {
        let value = &self.entry.first()?.changes.first()?.value;
        let raw = value.messages.first()?;
        let name = value
            .contacts
            .first()
            .and_then(|c| c.profile.as_ref())
            .and_then(|p| p.name.clone());

        let (text, media) = match raw.kind.as_str() {
            "text" => (raw.text.as_ref()?.body.clone(), None),
            "image" => media_parts(MediaKind::Image, raw.image.as_ref()?),
            "video" => media_parts(MediaKind::Video, raw.video.as_ref()?),
            "audio" => media_parts(MediaKind::Audio, raw.audio.as_ref()?),
            "voice" => media_parts(MediaKind::Audio, raw.voice.as_ref()?),
            "document" => media_parts(MediaKind::Document, raw.document.as_ref()?),
            _ => return None,
        };

        Some(IncomingMessage {
            message_id: raw.id.clone(),
            from: raw.from.clone(),
            name,
            timestamp: raw.timestamp.clone(),
            text,
            media,
        })
    }
}

fn media_parts(kind: MediaKind, content: &MediaContent) -> (String, Option<IncomingMedia>) {
    let text = content.caption.clone().unwrap_or_default();
    let media = IncomingMedia {
        kind,
        id: content.id.clone(),
        mime_type: content.mime_type.clone(),
        sha256: content.sha256.clone(),
        filename: content.filename.clone(),
    };
    (text, Some(media))
}

/// Parse a raw webhook body. Malformed JSON and non-message payloads both
/// yield `None`.
pub fn parse_incoming(payload: &serde_json::Value) -> Option<IncomingMessage> {
    serde_json::from_value::<WebhookPayload>(payload.clone())
        .ok()?
        .first_message()
}

/// Subscription handshake: echo the challenge only for a matching token.
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: &str,
) -> Option<&'a str> {
    match (mode, token) {
        (Some("subscribe"), Some(token)) if token == expected_token => challenge,
        _ => None,
    }
}
