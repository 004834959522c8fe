//! Application layer
//!
//! Orchestrates session handling, query submission and parsing into a single
//! best-effort fetch operation.

pub mod extraction_service;

pub use extraction_service::LsnClient;
