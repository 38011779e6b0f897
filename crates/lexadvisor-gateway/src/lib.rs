//! # LexAdvisor Gateway
//!
//! HTTP API over the `LegalAdvisor` pipeline: grounded search for end users and
//! article maintenance for administrators.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
