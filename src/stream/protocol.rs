//! Wire messages for the gesture socket.

use serde::{Deserialize, Serialize};

/// Client → server messages. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Base64 image, optionally as a data URL.
    Frame { data: String },
}

impl ClientMessage {
    /// `None` for unknown types, missing or non-string `data`, and non-JSON.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingTag {
    Ping,
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Ping {
        #[serde(rename = "type")]
        kind: PingTag,
        /// Unix time in seconds.
        ts: f64,
    },
    Detection {
        word: String,
        confidence: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw: Option<String>,
    },
}

impl ServerMessage {
    pub fn ping_now() -> Self {
        let now = chrono::Utc::now();
        Self::Ping {
            kind: PingTag::Ping,
            ts: now.timestamp_micros() as f64 / 1_000_000.0,
        }
    }

    pub fn detection(word: impl Into<String>, confidence: f32, raw: Option<String>) -> Self {
        Self::Detection {
            word: word.into(),
            confidence,
            raw,
        }
    }
}
