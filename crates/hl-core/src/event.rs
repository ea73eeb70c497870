use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Log,
    Warn,
    Error,
    Artwork,
    Message,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Artwork => "artwork",
            Self::Message => "message",
        }
    }
}

/// One observable effect of a run. `sequence` is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEvent {
    pub kind: OutputKind,
    pub payload: String,
    pub sequence: u64,
    pub timestamp_ms: u64,
}
