use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extracted text shorter than this is treated as noise, not content.
pub const MIN_CONTENT_LEN: usize = 10;

// ---------------------------------------------------------------------------
// AgentMessage — one agent's contribution for a round
// ---------------------------------------------------------------------------

/// The backend has shipped several incompatible payload shapes for an agent
/// argument. Each shape is classified once, here, at the API boundary; the
/// renderer never re-detects shapes downstream.
///
/// Untagged variant order matters: `text` is the current shape and is tried
/// before the legacy `argument` shape. `Unknown` is a catch-all so that
/// decoding a round can never fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentMessage {
    /// Already human-readable text.
    PlainText(String),
    /// `text` holds either well-formed JSON (`{"content":{"parts":[{"text":..}]}}`)
    /// or a Python-repr-style single-quoted dict fragment.
    TextField { text: String },
    /// Legacy shape: `argument` is a JSON string whose `text` field is itself
    /// a JSON string (double-encoded) with the same nested parts inside.
    ArgumentField { argument: String },
    /// Direct `content.parts` sequence.
    PartsList { content: MessageContent },
    /// Anything else. Extracts to nothing.
    Unknown(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl AgentMessage {
    /// Classify a raw JSON value. Never fails — unrecognized shapes become
    /// `Unknown`, which later extracts to the empty string.
    pub fn from_value(value: &Value) -> AgentMessage {
        serde_json::from_value(value.clone())
            .unwrap_or_else(|_| AgentMessage::Unknown(value.clone()))
    }
}

// ---------------------------------------------------------------------------
// DebateRound / DebateHistory
// ---------------------------------------------------------------------------

/// One synchronized batch of agent contributions, keyed by agent name.
/// Key order is participation order (serde_json's `preserve_order` keeps it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebateRound(pub serde_json::Map<String, Value>);

impl DebateRound {
    /// Iterate `(agent name, classified message)` in participation order.
    pub fn agents(&self) -> impl Iterator<Item = (&str, AgentMessage)> + '_ {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), AgentMessage::from_value(value)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Pull the human-readable narrative out of a message. First successful
/// attempt wins; structured parsing is always preferred over regex recovery.
/// Never panics and never errors — any failure degrades to `""`, which is
/// the explicit "nothing extractable" sentinel.
pub fn extract_agent_text(message: &AgentMessage) -> String {
    let candidate = match message {
        AgentMessage::PlainText(s) => s.clone(),
        AgentMessage::TextField { text } => decode_text_field(text),
        AgentMessage::ArgumentField { argument } => decode_argument_field(argument),
        AgentMessage::PartsList { content } => join_parts(content),
        AgentMessage::Unknown(_) => String::new(),
    };

    if candidate.chars().count() < MIN_CONTENT_LEN {
        return String::new();
    }
    candidate
}

/// `content.parts[0].text` out of an already-parsed value.
fn first_part_text(value: &Value) -> Option<&str> {
    value
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

fn decode_text_field(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(inner) = first_part_text(&value) {
            return inner.to_string();
        }
    }
    decode_legacy_text_blob(text)
}

fn decode_argument_field(argument: &str) -> String {
    if let Ok(outer) = serde_json::from_str::<Value>(argument) {
        if let Some(embedded) = outer.get("text").and_then(Value::as_str) {
            // The text field is itself a JSON document (double-encoded).
            if let Ok(inner) = serde_json::from_str::<Value>(embedded) {
                if let Some(text) = first_part_text(&inner) {
                    return text.to_string();
                }
            }
        }
    }
    // Structured parsing failed somewhere along the chain — capture a
    // double-quoted "text": "..." fragment, tolerating escaped characters.
    static DOUBLE_QUOTED_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#""text"\s*:\s*"((?:[^"\\]|\\.)+)""#).expect("double-quoted text pattern is valid")
    });
    DOUBLE_QUOTED_TEXT_RE
        .captures(argument)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Loose recovery for the Python-repr-style dict fragments the backend leaks
/// when an upstream object is stringified instead of serialized: a
/// single-quoted `'text': '...'` pair, with a variant tolerating escaped
/// quotes inside the value.
pub fn decode_legacy_text_blob(blob: &str) -> String {
    static SINGLE_QUOTED_ESCAPED_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"'text'\s*:\s*'((?:[^'\\]|\\.)+)'").expect("escaped single-quote pattern is valid")
    });
    static SINGLE_QUOTED_PLAIN_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"'text'\s*:\s*'([^']+)'").expect("plain single-quote pattern is valid")
    });

    if let Some(captures) = SINGLE_QUOTED_ESCAPED_RE.captures(blob) {
        return captures[1].to_string();
    }
    if let Some(captures) = SINGLE_QUOTED_PLAIN_RE.captures(blob) {
        return captures[1].to_string();
    }
    String::new()
}

fn join_parts(content: &MessageContent) -> String {
    content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
}
