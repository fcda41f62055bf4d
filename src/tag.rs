//! The closed set of priority tags.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorical label assigned to a message.
///
/// Declaration order is the scoring table order and breaks ties between
/// equally scored tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    Urgent,
    Meeting,
    Financial,
    Important,
    Promotional,
    Newsletter,
    Security,
    /// Fallback when no pattern scores above threshold.
    General,
}

impl Tag {
    /// Every tag, in declaration order.
    pub const ALL: [Tag; 8] = [
        Tag::Urgent,
        Tag::Meeting,
        Tag::Financial,
        Tag::Important,
        Tag::Promotional,
        Tag::Newsletter,
        Tag::Security,
        Tag::General,
    ];

    /// Upper-case wire name, e.g. `"URGENT"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::Meeting => "MEETING",
            Self::Financial => "FINANCIAL",
            Self::Important => "IMPORTANT",
            Self::Promotional => "PROMOTIONAL",
            Self::Newsletter => "NEWSLETTER",
            Self::Security => "SECURITY",
            Self::General => "GENERAL",
        }
    }

    /// Base contribution of the tag to the ranking score.
    pub fn rank_weight(self) -> f64 {
        match self {
            Self::Urgent => 10.0,
            Self::Security => 9.0,
            Self::Meeting => 8.0,
            Self::Financial => 7.0,
            Self::Important => 6.0,
            Self::General => 3.0,
            Self::Promotional => 2.0,
            Self::Newsletter => 1.0,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a string names no known tag.
#[derive(Debug, Clone, Error)]
#[error("unknown tag \"{0}\" (expected one of URGENT, MEETING, FINANCIAL, IMPORTANT, PROMOTIONAL, NEWSLETTER, SECURITY, GENERAL)")]
pub struct UnknownTag(pub String);

impl std::str::FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}
