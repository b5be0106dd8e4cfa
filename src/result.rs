use serde::{Deserialize, Serialize};

/// One unit of work for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// `value` is already an absolute URL (from the URL corpus) rather than
    /// a word to join with the base target.
    pub pre_resolved: bool,
    pub value: String,
}

impl Candidate {
    pub fn word(value: impl Into<String>) -> Self {
        Self { pre_resolved: false, value: value.into() }
    }

    pub fn url(value: impl Into<String>) -> Self {
        Self { pre_resolved: true, value: value.into() }
    }
}

/// Outcome of probing a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeResult {
    pub entity: String,
    /// HTTP status; always 0 for DNS results.
    pub status: u16,
    pub size: Option<u64>,
    #[serde(skip)]
    pub content: Option<String>,
    pub is_entity_url: bool,
    pub redirect_url: Option<String>,
    /// Addresses or CNAME requested for DNS results.
    pub extra: Option<String>,
}

impl ProbeResult {
    /// A result with only the entity set, as produced by DNS lookups.
    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            status: 0,
            size: None,
            content: None,
            is_entity_url: false,
            redirect_url: None,
            extra: None,
        }
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Rendered form of a result.
///
/// An empty `display` means the result was filtered out; it is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub display: String,
    pub archive: String,
    pub status: u16,
}

impl Rendered {
    pub fn is_reported(&self) -> bool {
        !self.display.is_empty()
    }
}
