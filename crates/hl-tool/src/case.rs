use hl_core::{OutputEvent, OutputKind};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "hl-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_dialect")]
    pub dialect: String,
    /// Blind-box seed. Cases that draw from the box should pin it.
    #[serde(default = "default_seed")]
    pub seed: u32,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

fn default_dialect() -> String {
    "chinese".to_string()
}

fn default_seed() -> u32 {
    1
}

/// An event as a testcase spells it. A missing payload matches any payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedEvent {
    pub kind: OutputKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl ExpectedEvent {
    pub fn matches(&self, observed: &ExpectedEvent) -> bool {
        self.kind == observed.kind
            && self
                .payload
                .as_ref()
                .map_or(true, |payload| Some(payload) == observed.payload.as_ref())
    }
}

impl From<&OutputEvent> for ExpectedEvent {
    fn from(event: &OutputEvent) -> Self {
        Self {
            kind: event.kind,
            payload: Some(event.payload.clone()),
        }
    }
}
