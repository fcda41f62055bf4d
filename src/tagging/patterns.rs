//! Static pattern tables for tagging and state featurization.
//!
//! All matching is done against lower-cased text. Keyword and sender patterns
//! are plain substrings; subject patterns are regular expressions.

use std::sync::LazyLock;

use regex::Regex;

use crate::tag::Tag;

/// Pattern set for one scored tag.
#[derive(Debug)]
pub struct TagPattern {
    pub tag: Tag,
    /// Multiplier applied to the combined match fractions.
    pub weight: f64,
    pub keywords: &'static [&'static str],
    pub subject_patterns: &'static [&'static str],
    pub sender_patterns: &'static [&'static str],
}

/// Scored tags in table order. `GENERAL` has no patterns and is the fallback.
pub static TAG_PATTERNS: [TagPattern; 7] = [
    TagPattern {
        tag: Tag::Urgent,
        weight: 5.0,
        keywords: &[
            "urgent",
            "asap",
            "immediately",
            "emergency",
            "critical",
            "deadline today",
            "overdue",
        ],
        subject_patterns: &[r"urgent:?", r"asap:?", r"emergency:?", r"critical:?"],
        sender_patterns: &["boss", "manager", "ceo", "director", "emergency"],
    },
    TagPattern {
        tag: Tag::Meeting,
        weight: 4.0,
        keywords: &[
            "meeting",
            "appointment",
            "schedule",
            "calendar",
            "conference call",
            "zoom",
            "teams",
        ],
        subject_patterns: &[r"meeting", r"appointment", r"schedule", r"call", r"conference"],
        sender_patterns: &["calendar", "scheduler", "meeting"],
    },
    TagPattern {
        tag: Tag::Financial,
        weight: 4.5,
        keywords: &[
            "invoice",
            "payment",
            "bill",
            "receipt",
            "transaction",
            "refund",
            "purchase",
            "order",
        ],
        subject_patterns: &[r"invoice", r"payment", r"bill", r"receipt", r"order #\d+"],
        sender_patterns: &["billing", "payments", "finance", "accounting", "paypal", "stripe"],
    },
    TagPattern {
        tag: Tag::Important,
        weight: 4.0,
        keywords: &[
            "important",
            "priority",
            "attention required",
            "action needed",
            "follow up",
        ],
        subject_patterns: &[r"important:?", r"priority:?", r"action required"],
        sender_patterns: &["hr", "admin", "support"],
    },
    TagPattern {
        tag: Tag::Promotional,
        weight: 1.0,
        keywords: &[
            "sale",
            "offer",
            "discount",
            "deal",
            "promotion",
            "coupon",
            "limited time",
        ],
        subject_patterns: &[r"\d+% off", r"sale", r"deal", r"offer", r"discount"],
        sender_patterns: &["marketing", "promo", "deals", "offers", "newsletter"],
    },
    TagPattern {
        tag: Tag::Newsletter,
        weight: 2.0,
        keywords: &["newsletter", "weekly update", "monthly digest", "blog", "news"],
        subject_patterns: &[r"newsletter", r"weekly", r"monthly", r"digest"],
        sender_patterns: &["newsletter", "news", "blog", "updates"],
    },
    TagPattern {
        tag: Tag::Security,
        weight: 4.5,
        keywords: &[
            "security",
            "password",
            "login",
            "suspicious",
            "verify",
            "authentication",
        ],
        subject_patterns: &[r"security", r"password", r"verify", r"suspicious"],
        sender_patterns: &["security", "noreply", "alerts"],
    },
];

/// Compiled subject regexes, parallel to [`TAG_PATTERNS`].
pub static SUBJECT_REGEXES: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    TAG_PATTERNS
        .iter()
        .map(|p| {
            p.subject_patterns
                .iter()
                .map(|src| Regex::new(src).unwrap())
                .collect()
        })
        .collect()
});

/// Pattern table entry for a tag, if the tag is scored.
pub fn pattern_for(tag: Tag) -> Option<&'static TagPattern> {
    TAG_PATTERNS.iter().find(|p| p.tag == tag)
}

// ── Time urgency ───────────────────────────────────────────────────────────

/// Each present word adds 2.0.
pub const HIGH_URGENCY_WORDS: &[&str] = &["today", "now", "asap", "immediately", "urgent"];

/// Each present word adds 1.0.
pub const MEDIUM_URGENCY_WORDS: &[&str] = &["tomorrow", "this week", "soon", "deadline"];

pub const HIGH_URGENCY_BONUS: f64 = 2.0;
pub const MEDIUM_URGENCY_BONUS: f64 = 1.0;
pub const TIME_PATTERN_BONUS: f64 = 1.5;
pub const MAX_TIME_URGENCY: f64 = 5.0;

/// Each matching expression adds 1.5.
pub static TIME_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"by \d+:\d+").unwrap(),
        Regex::new(r"in \d+ (hour|minute|day)s?").unwrap(),
        Regex::new(r"before \d+").unwrap(),
        Regex::new(r"end of (day|week|month)").unwrap(),
    ]
});

// ── Reduced-state flags ────────────────────────────────────────────────────

pub const DEADLINE_WORDS: &[&str] = &[
    "tomorrow",
    "today",
    "asap",
    "urgent",
    "deadline",
    "immediately",
    "priority",
    "important",
];

pub const WORK_WORDS: &[&str] = &[
    "meeting", "project", "deadline", "work", "client", "schedule", "task", "report",
];

pub const PROMO_WORDS: &[&str] = &["offer", "discount", "sale", "promo", "deal", "special"];

pub const EMOJI_MARKERS: &[char] = &['😊', '😃', '📬', '⏰', '📅', '🔥', '💼', '📞'];
