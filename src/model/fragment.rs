use serde::{Deserialize, Serialize};

/// Semantic tag carried by a capsule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapsuleTag {
    Bed,
    Drug,
    Test,
}

impl CapsuleTag {
    pub fn parse_tag(s: &str) -> Option<CapsuleTag> {
        match s.to_ascii_lowercase().as_str() {
            "bed" => Some(CapsuleTag::Bed),
            "drug" => Some(CapsuleTag::Drug),
            "test" => Some(CapsuleTag::Test),
            _ => None,
        }
    }
}

impl std::fmt::Display for CapsuleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapsuleTag::Bed => write!(f, "bed"),
            CapsuleTag::Drug => write!(f, "drug"),
            CapsuleTag::Test => write!(f, "test"),
        }
    }
}

/// One piece of structured capture input.
///
/// Serialized as `{"type":"text","value":..}` or
/// `{"type":"capsule","tag":"bed","value":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fragment {
    Text { value: String },
    Capsule { tag: CapsuleTag, value: String },
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text {
            value: value.into(),
        }
    }

    pub fn capsule(tag: CapsuleTag, value: impl Into<String>) -> Self {
        Fragment::Capsule {
            tag,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Fragment::Text { value } | Fragment::Capsule { value, .. } => value,
        }
    }

    /// Text as it appears in the task: capsules are bracketed
    pub fn rendered(&self) -> String {
        match self {
            Fragment::Text { value } => value.trim().to_string(),
            Fragment::Capsule { value, .. } => format!("[{}]", value.trim()),
        }
    }
}
