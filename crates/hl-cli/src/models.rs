use hl_core::PostProcessorKind;
use serde::Serialize;

/// One line of `herlang dialects` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DialectListing {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) post_processor: PostProcessorKind,
    pub(crate) rules: usize,
}
