// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # inbox-priority
//!
//! An adaptive message priority engine: rule-based tagging, learning from user
//! corrections, and priority ranking adjusted by a learned value table.
//!
//! ## Architecture
//!
//! - **Tagging** (`tagging`): keyword, subject and sender pattern scoring with
//!   time-urgency detection and sender-preference biasing
//! - **Learning** (`learning`): sender preferences, per-message confidence,
//!   reward ledger and the value store over reduced message states
//! - **Ranking** (`ranking`): rule-based priority plus learned adjustment
//! - **Storage** (`store`): JSON tables with atomic writes and a single-writer lock
//!
//! ## Library usage
//!
//! ```no_run
//! use inbox_priority::config::EngineConfig;
//! use inbox_priority::engine::PriorityEngine;
//! use inbox_priority::message::Message;
//! use inbox_priority::tag::Tag;
//!
//! let mut engine = PriorityEngine::new(EngineConfig::default()).unwrap();
//! let msg = Message::new("m1", "URGENT: server down", "fix asap", "ops@corp.com");
//! let result = engine.tag_message(&msg);
//! assert_eq!(result.tag, Tag::Urgent);
//!
//! engine.correct("m1", Tag::Urgent, Tag::Security, "ops@corp.com", 1.0);
//! let ranked = engine.rank(std::slice::from_ref(&msg));
//! println!("{:.2}", ranked[0].final_score);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod learning;
pub mod message;
pub mod paths;
pub mod ranking;
pub mod stats;
pub mod store;
pub mod tag;
pub mod tagging;
