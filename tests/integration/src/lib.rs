//! End-to-end tests for the collector pipeline
//!
//! This test suite validates:
//! - Decode, validation, enrichment and forwarding against a live HTTP endpoint
//! - The envelope wire contract as received downstream
//! - Forward failures (unreachable, slow, non-2xx endpoints) staying local to one message
//! - Bus handler lifecycle: re-subscription on every connect, then ingestion resumes

pub mod test_utils;

#[cfg(test)]
mod pipeline_tests;

#[cfg(test)]
mod failure_tests;
