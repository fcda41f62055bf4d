//! Message records exchanged with the engine.
//!
//! Messages are owned by the caller. The engine reads them and returns tag
//! results and rankings; `Message::apply_tag` attaches a result when the caller
//! wants the tag carried on the record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tag;
use crate::tagging::TagResult;

// ── Metrics ────────────────────────────────────────────────────────────────

/// Coarse urgency produced by an external metrics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    #[default]
    Low,
}

impl Urgency {
    pub fn bonus(self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 1.5,
            Self::Low => 0.0,
        }
    }
}

/// Sender intent produced by an external metrics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Request,
    Question,
    Complaint,
    Urgent,
    Meeting,
    #[default]
    General,
}

impl Intent {
    pub fn bonus(self) -> f64 {
        match self {
            Self::Request => 2.0,
            Self::Question => 1.5,
            Self::Complaint => 2.5,
            Self::Urgent => 3.0,
            Self::Meeting => 2.0,
            Self::General => 0.0,
        }
    }
}

/// Collaborator-provided enrichment used by the ranker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetrics {
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub has_deadline: bool,
}

// ── Message ────────────────────────────────────────────────────────────────

/// A message to tag and rank. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_confidence: Option<f64>,
    /// Set by the transport when the message carries image attachments.
    #[serde(default)]
    pub has_image_attachments: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MessageMetrics>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            ..Default::default()
        }
    }

    pub fn with_metrics(mut self, metrics: MessageMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_sentiment(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }

    /// Copy the tag and confidence of a tagging result onto this message.
    pub fn apply_tag(&mut self, result: &TagResult) {
        self.tag = Some(result.tag);
        self.tag_confidence = Some(result.confidence);
    }

    /// Tag used for ranking; untagged messages rank as `GENERAL`.
    pub fn effective_tag(&self) -> Tag {
        self.tag.unwrap_or(Tag::General)
    }
}

/// Domain part of an address (`"a@b.com"` → `"b.com"`); the whole input when no `@`.
pub fn sender_domain(address: &str) -> &str {
    let addr = address
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>');
    match addr.rsplit_once('@') {
        Some((_, domain)) => domain,
        None => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_extraction() {
        assert_eq!(sender_domain("alice@example.com"), "example.com");
        assert_eq!(sender_domain("<bob@corp.io>"), "corp.io");
        assert_eq!(sender_domain("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn deserialize_sparse_message() {
        let msg: Message = serde_json::from_str(r#"{"subject": "hi"}"#).unwrap();
        assert_eq!(msg.subject, "hi");
        assert!(msg.id.is_empty());
        assert!(msg.metrics.is_none());
        assert_eq!(msg.effective_tag(), Tag::General);
    }

    #[test]
    fn deserialize_metrics() {
        let msg: Message = serde_json::from_str(
            r#"{"id":"m1","metrics":{"urgency":"high","intent":"complaint","has_deadline":true}}"#,
        )
        .unwrap();
        let metrics = msg.metrics.unwrap();
        assert_eq!(metrics.urgency, Urgency::High);
        assert_eq!(metrics.intent, Intent::Complaint);
        assert!(metrics.has_deadline);
    }

    #[test]
    fn bonuses() {
        assert_eq!(Urgency::High.bonus(), 3.0);
        assert_eq!(Urgency::Medium.bonus(), 1.5);
        assert_eq!(Intent::Complaint.bonus(), 2.5);
        assert_eq!(Intent::General.bonus(), 0.0);
    }
}
