//! # LexAdvisor Core
//!
//! Shared building blocks for the legal-article question-answering service:
//! configuration, the error taxonomy, domain types and the collaborator
//! traits (`Encoder`, `Generator`, `ArticleStore`, `AnnexStore`).

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::LexConfig;
pub use error::{LexError, Result};
pub use traits::{AnnexStore, ArticleStore, Encoder, Generator};
