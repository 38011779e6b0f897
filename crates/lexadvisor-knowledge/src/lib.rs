//! # LexAdvisor Knowledge
//!
//! Semantic retrieval over a small legal-article corpus.
//!
//! ## How it works
//! ```text
//! User: "How many days of annual leave do I get?"
//!   ↓ Encoder
//! query vector
//!   ↓ BruteForceRetriever (cosine over every stored article)
//! best article with score > threshold, or nothing
//!   ↓ GroundingAssembler (+ knowledge annex)
//! prompt with law content, practical risks and the question
//!   ↓ Generator (one call, low temperature)
//! grounded answer + annex metadata
//! ```
//!
//! Articles and annexes live in two SQLite tables with independent lifecycles.

pub mod grounding;
pub mod matcher;
pub mod pipeline;
pub mod seed;
pub mod store;

pub use grounding::GroundingAssembler;
pub use matcher::{ArticleRetriever, BruteForceRetriever};
pub use pipeline::LegalAdvisor;
pub use store::{SqliteAnnexStore, SqliteArticleStore};
