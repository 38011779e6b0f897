//! Collaborator interfaces consumed by the retrieval pipeline.
//!
//! Each external dependency sits behind a narrow trait so tests can swap in
//! deterministic doubles and a provider change never touches the pipeline.

pub mod encoder;
pub mod generator;
pub mod store;

pub use encoder::Encoder;
pub use generator::Generator;
pub use store::{AnnexStore, ArticleStore, StoredArticle};
